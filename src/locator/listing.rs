use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use log::debug;
use walkdir::WalkDir;

/// Directory-enumeration seam used by the locator.
///
/// Keeps descriptor and texture discovery testable without touching disk.
pub trait DirectoryListing {
    fn is_file(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;
    /// Direct children of `dir` (files and directories). Empty if unreadable.
    fn children(&self, dir: &Path) -> Vec<PathBuf>;
    /// Every file below `dir`, recursively.
    fn files_recursive(&self, dir: &Path) -> Vec<PathBuf>;
}

/// Real filesystem listing.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsListing;

impl DirectoryListing for FsListing {
    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn children(&self, dir: &Path) -> Vec<PathBuf> {
        // "" is how Path::parent spells the current directory
        let dir = if dir.as_os_str().is_empty() {
            Path::new(".")
        } else {
            dir
        };
        match std::fs::read_dir(dir) {
            Ok(entries) => {
                let mut children: Vec<PathBuf> = entries.flatten().map(|e| e.path()).collect();
                children.sort();
                children
            }
            Err(e) => {
                debug!("Cannot list {}: {}", dir.display(), e);
                Vec::new()
            }
        }
    }

    fn files_recursive(&self, dir: &Path) -> Vec<PathBuf> {
        WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .collect()
    }
}

/// In-memory tree built from a list of file paths. Directories are implied
/// by the files beneath them, plus any added explicitly.
#[derive(Debug, Default, Clone)]
pub struct InMemoryListing {
    files: BTreeSet<PathBuf>,
    dirs: BTreeSet<PathBuf>,
}

impl InMemoryListing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_files<I, P>(files: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut listing = Self::new();
        for file in files {
            listing.add_file(file);
        }
        listing
    }

    pub fn add_file(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        if let Some(parent) = path.parent() {
            self.add_dir(parent.to_path_buf());
        }
        self.files.insert(path);
    }

    pub fn add_dir(&mut self, path: impl Into<PathBuf>) {
        let mut current = Some(path.into());
        while let Some(dir) = current {
            if dir.as_os_str().is_empty() || !self.dirs.insert(dir.clone()) {
                break;
            }
            current = dir.parent().map(Path::to_path_buf);
        }
    }
}

impl DirectoryListing for InMemoryListing {
    fn is_file(&self, path: &Path) -> bool {
        self.files.contains(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.dirs.contains(path)
    }

    fn children(&self, dir: &Path) -> Vec<PathBuf> {
        self.dirs
            .iter()
            .chain(self.files.iter())
            .filter(|p| p.parent() == Some(dir))
            .cloned()
            .collect()
    }

    fn files_recursive(&self, dir: &Path) -> Vec<PathBuf> {
        self.files
            .iter()
            .filter(|p| p.starts_with(dir) && p.as_path() != dir)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_listing_implies_parent_dirs() {
        let listing = InMemoryListing::with_files(["/root/a/b/c.bin"]);
        assert!(listing.is_dir(Path::new("/root/a/b")));
        assert!(listing.is_dir(Path::new("/root")));
        assert!(listing.is_file(Path::new("/root/a/b/c.bin")));
        assert!(!listing.is_file(Path::new("/root/a/b")));
    }

    #[test]
    fn memory_listing_children_are_direct() {
        let listing = InMemoryListing::with_files(["/m/x.fbx", "/m/tex/y.bin", "/m/tex/deep/z.bin"]);
        let mut children = listing.children(Path::new("/m"));
        children.sort();
        assert_eq!(
            children,
            vec![PathBuf::from("/m/tex"), PathBuf::from("/m/x.fbx")]
        );
        assert_eq!(listing.files_recursive(Path::new("/m/tex")).len(), 2);
    }

    #[test]
    fn fs_listing_walks_tempdir() {
        let tmp = tempfile::TempDir::new().unwrap();
        let nested = tmp.path().join("Textures").join("sub");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("a.bin"), b"x").unwrap();
        std::fs::write(tmp.path().join("b.fbx"), b"x").unwrap();

        let listing = FsListing;
        assert_eq!(listing.children(tmp.path()).len(), 2);
        assert_eq!(listing.files_recursive(tmp.path()).len(), 2);
        assert!(listing.is_dir(&tmp.path().join("Textures")));
    }
}
