//! Finds the descriptor blob and the texture files that belong to a model,
//! using only naming conventions.

mod listing;

pub use listing::{DirectoryListing, FsListing, InMemoryListing};

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::config::RolePatterns;
use crate::descriptor::DESCRIPTOR_EXTENSION;

/// Directory names (case-insensitive) that may hold textures and descriptors.
const TEXTURE_DIR_NAMES: [&str; 3] = ["textures", "texture", "tex"];

/// Semantic texture slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextureRole {
    Bump,
    Detail,
    Specular,
    Albedo,
}

impl TextureRole {
    pub const ALL: [TextureRole; 4] = [
        TextureRole::Bump,
        TextureRole::Detail,
        TextureRole::Specular,
        TextureRole::Albedo,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TextureRole::Bump => "bump",
            TextureRole::Detail => "detail",
            TextureRole::Specular => "specular",
            TextureRole::Albedo => "albedo",
        }
    }

    /// Roles with a dedicated synthesis stage; the rest are passed through.
    pub fn is_synthesized(self) -> bool {
        matches!(self, TextureRole::Bump | TextureRole::Detail)
    }
}

impl fmt::Display for TextureRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role → resolved file, `None` when nothing matched. Roles are independent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextureSet(BTreeMap<TextureRole, Option<PathBuf>>);

impl Default for TextureSet {
    fn default() -> Self {
        Self(TextureRole::ALL.iter().map(|&role| (role, None)).collect())
    }
}

impl TextureSet {
    pub fn get(&self, role: TextureRole) -> Option<&Path> {
        self.0.get(&role).and_then(|p| p.as_deref())
    }

    pub fn set(&mut self, role: TextureRole, path: Option<PathBuf>) {
        self.0.insert(role, path);
    }

    /// Resolved roles only, in role order.
    pub fn resolved(&self) -> impl Iterator<Item = (TextureRole, &Path)> {
        self.0
            .iter()
            .filter_map(|(role, path)| path.as_deref().map(|p| (*role, p)))
    }

    pub fn is_empty(&self) -> bool {
        self.resolved().next().is_none()
    }
}

/// A located descriptor file and the textures resolved next to it.
#[derive(Debug, Clone, PartialEq)]
pub struct LocatedDescriptor {
    pub path: PathBuf,
    pub textures: TextureSet,
}

/// Naming-heuristic search for a model's descriptor and textures.
pub struct TextureLocator<'a, L: DirectoryListing> {
    listing: &'a L,
    input_root: Option<&'a Path>,
    patterns: &'a RolePatterns,
}

impl<'a, L: DirectoryListing> TextureLocator<'a, L> {
    pub fn new(listing: &'a L, input_root: Option<&'a Path>, patterns: &'a RolePatterns) -> Self {
        Self {
            listing,
            input_root,
            patterns,
        }
    }

    /// Find the descriptor and resolve its texture roles.
    pub fn locate(&self, model_path: &Path) -> Option<LocatedDescriptor> {
        let path = self.find_descriptor(model_path)?;
        let textures = self.resolve_roles(&path);
        Some(LocatedDescriptor { path, textures })
    }

    /// Search order: `<stem>.bin` beside the model, `<stem>_model.bin` beside
    /// the model, then a scored search through nearby texture directories.
    pub fn find_descriptor(&self, model_path: &Path) -> Option<PathBuf> {
        let stem = file_stem(model_path)?;
        let parent = model_path.parent().unwrap_or_else(|| Path::new(""));

        let siblings = [
            parent.join(format!("{}.{}", stem, DESCRIPTOR_EXTENSION)),
            parent.join(format!("{}_model.{}", stem, DESCRIPTOR_EXTENSION)),
        ];
        if let Some(found) = siblings.into_iter().find(|p| self.listing.is_file(p)) {
            debug!("Descriptor for {} found beside model: {}", stem, found.display());
            return Some(found);
        }

        let dirs = self.discover_texture_directories(model_path);
        let found = self.search_descriptor(&dirs, &stem.to_lowercase());
        if let Some(found) = &found {
            info!("Descriptor for {} found by search: {}", stem, found.display());
        }
        found
    }

    /// Texture directories among the children of every ancestor of the
    /// model, plus direct children of the input root.
    pub fn discover_texture_directories(&self, model_path: &Path) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = Vec::new();
        let roots = model_path.ancestors().skip(1).chain(self.input_root);

        for root in roots {
            for child in self.listing.children(root) {
                if is_texture_dir_name(&child)
                    && self.listing.is_dir(&child)
                    && !dirs.contains(&child)
                {
                    dirs.push(child);
                }
            }
        }

        dirs
    }

    /// Best-scoring descriptor file across `dirs`. An exact stem match wins
    /// immediately; ties keep the first candidate seen.
    fn search_descriptor(&self, dirs: &[PathBuf], model_stem: &str) -> Option<PathBuf> {
        let mut best: Option<(PathBuf, usize)> = None;

        for dir in dirs {
            for candidate in self.listing.files_recursive(dir) {
                if !has_descriptor_extension(&candidate) {
                    continue;
                }
                let Some(stem) = file_stem(&candidate) else {
                    continue;
                };
                let stem = stem.to_lowercase();
                if stem == model_stem {
                    return Some(candidate);
                }

                let score = partial_match_score(model_stem, &stem);
                if best.as_ref().map_or(true, |(_, s)| score > *s) {
                    best = Some((candidate, score));
                }
            }
        }

        best.map(|(path, _)| path)
    }

    /// First existing file per role, following the configured pattern order.
    pub fn resolve_roles(&self, descriptor_path: &Path) -> TextureSet {
        let mut textures = TextureSet::default();
        let Some(base) = file_stem(descriptor_path) else {
            return textures;
        };
        let dir = descriptor_path.parent().unwrap_or_else(|| Path::new(""));

        for role in TextureRole::ALL {
            let found = self
                .patterns
                .for_role(role)
                .iter()
                .map(|suffix| dir.join(format!("{}{}", base, suffix)))
                .find(|candidate| self.listing.is_file(candidate));

            match &found {
                Some(path) => debug!("{} role for {}: {}", role, base, path.display()),
                None => debug!("{} role for {}: not found", role, base),
            }
            textures.set(role, found);
        }

        textures
    }
}

/// Sum of the lengths of the model-name tokens (split on `-`/`_`) that
/// occur inside the candidate stem.
pub fn partial_match_score(model_stem: &str, candidate_stem: &str) -> usize {
    model_stem
        .split(['-', '_'])
        .filter(|part| !part.is_empty() && candidate_stem.contains(part))
        .map(str::len)
        .sum()
}

fn file_stem(path: &Path) -> Option<&str> {
    path.file_stem().and_then(|s| s.to_str())
}

fn is_texture_dir_name(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| {
            TEXTURE_DIR_NAMES
                .iter()
                .any(|candidate| name.eq_ignore_ascii_case(candidate))
        })
}

fn has_descriptor_extension(path: &Path) -> bool {
    path.extension()
        .is_some_and(|e| e.eq_ignore_ascii_case(DESCRIPTOR_EXTENSION))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locate_with(listing: &InMemoryListing, root: Option<&Path>, model: &str) -> Option<PathBuf> {
        let patterns = RolePatterns::default();
        TextureLocator::new(listing, root, &patterns).find_descriptor(Path::new(model))
    }

    #[test]
    fn prefers_sibling_descriptor() {
        let listing = InMemoryListing::with_files([
            "/in/props/wall01.fbx",
            "/in/props/wall01.bin",
            "/in/props/wall01_model.bin",
            "/in/textures/wall01.bin",
        ]);
        assert_eq!(
            locate_with(&listing, Some(Path::new("/in")), "/in/props/wall01.fbx"),
            Some(PathBuf::from("/in/props/wall01.bin"))
        );
    }

    #[test]
    fn falls_back_to_model_suffix() {
        let listing = InMemoryListing::with_files([
            "/in/props/wall01.fbx",
            "/in/props/wall01_model.bin",
        ]);
        assert_eq!(
            locate_with(&listing, None, "/in/props/wall01.fbx"),
            Some(PathBuf::from("/in/props/wall01_model.bin"))
        );
    }

    #[test]
    fn searches_ancestor_texture_dirs() {
        let listing = InMemoryListing::with_files([
            "/in/a/b/crate_big.fbx",
            "/in/a/Textures/deep/crate.bin",
            "/in/a/Textures/deep/barrel.bin",
        ]);
        assert_eq!(
            locate_with(&listing, None, "/in/a/b/crate_big.fbx"),
            Some(PathBuf::from("/in/a/Textures/deep/crate.bin"))
        );
    }

    #[test]
    fn exact_stem_match_is_case_insensitive() {
        let listing = InMemoryListing::with_files([
            "/in/m/Wall01.fbx",
            "/in/tex/wall01_old.bin",
            "/in/tex/WALL01.BIN",
        ]);
        assert_eq!(
            locate_with(&listing, Some(Path::new("/in")), "/in/m/Wall01.fbx"),
            Some(PathBuf::from("/in/tex/WALL01.BIN"))
        );
    }

    #[test]
    fn input_root_children_are_searched() {
        let listing = InMemoryListing::with_files([
            "/other/models/rock_a.fbx",
            "/in/tex/rock_a_lod.bin",
        ]);
        assert_eq!(
            locate_with(&listing, Some(Path::new("/in")), "/other/models/rock_a.fbx"),
            Some(PathBuf::from("/in/tex/rock_a_lod.bin"))
        );
        assert_eq!(locate_with(&listing, None, "/other/models/rock_a.fbx"), None);
    }

    #[test]
    fn ignores_non_texture_dirs_and_extensions() {
        let listing = InMemoryListing::with_files([
            "/in/m/wall01.fbx",
            "/in/meshes/wall01.bin",
            "/in/textures/wall01.png",
        ]);
        assert_eq!(locate_with(&listing, Some(Path::new("/in")), "/in/m/wall01.fbx"), None);
    }

    #[test]
    fn highest_score_wins() {
        let listing = InMemoryListing::with_files([
            "/in/m/stone-wall_big.fbx",
            "/in/tex/wall.bin",
            "/in/tex/stone_wall.bin",
            "/in/tex/big.bin",
        ]);
        assert_eq!(
            locate_with(&listing, None, "/in/m/stone-wall_big.fbx"),
            Some(PathBuf::from("/in/tex/stone_wall.bin"))
        );
    }

    #[test]
    fn partial_score_sums_token_lengths() {
        assert_eq!(partial_match_score("stone-wall_big", "stone_wall"), 9);
        assert_eq!(partial_match_score("stone-wall_big", "bigstone"), 8);
        assert_eq!(partial_match_score("wall01", "floor"), 0);
        assert_eq!(partial_match_score("__a__", "a"), 1);
    }

    #[test]
    fn discovers_each_dir_once() {
        let listing = InMemoryListing::with_files([
            "/in/m/x.fbx",
            "/in/tex/a.bin",
            "/in/m/TEXTURE/b.bin",
        ]);
        let patterns = RolePatterns::default();
        let locator = TextureLocator::new(&listing, Some(Path::new("/in")), &patterns);
        let mut dirs = locator.discover_texture_directories(Path::new("/in/m/x.fbx"));
        dirs.sort();
        assert_eq!(
            dirs,
            vec![PathBuf::from("/in/m/TEXTURE"), PathBuf::from("/in/tex")]
        );
    }

    #[test]
    fn role_resolution_follows_pattern_order() {
        let listing = InMemoryListing::with_files([
            "/t/wall01.bin",
            "/t/wall01_bump.dds",
            "/t/wall01_bump.png",
            "/t/wall01_detail.png",
            "/t/wall01_spec.png",
        ]);
        let patterns = RolePatterns::default();
        let locator = TextureLocator::new(&listing, None, &patterns);
        let textures = locator.resolve_roles(Path::new("/t/wall01.bin"));

        assert_eq!(textures.get(TextureRole::Bump), Some(Path::new("/t/wall01_bump.dds")));
        assert_eq!(textures.get(TextureRole::Detail), Some(Path::new("/t/wall01_detail.png")));
        assert_eq!(textures.get(TextureRole::Specular), Some(Path::new("/t/wall01_spec.png")));
        assert_eq!(textures.get(TextureRole::Albedo), None);
    }

    #[test]
    fn texture_set_serializes_nulls() {
        let mut textures = TextureSet::default();
        textures.set(TextureRole::Bump, Some(PathBuf::from("a_bump.png")));
        let json = serde_json::to_value(&textures).unwrap();
        assert_eq!(json["bump"], "a_bump.png");
        assert!(json["albedo"].is_null());
        assert_eq!(textures.resolved().count(), 1);
    }
}
