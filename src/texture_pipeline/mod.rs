pub mod converter;
pub mod decode;
pub mod detail;
pub mod normal_map;
pub mod resizer;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::config::TextureConfig;
use crate::descriptor::MaterialParams;
use crate::error::{TextureError, TextureResult};
use crate::locator::{TextureRole, TextureSet};
use decode::TextureDecoder;

/// Artifact name of the bump-derived normal map.
pub const NORMAL: &str = "normal";
/// Artifact name of the baked detail texture.
pub const DETAIL_FINAL: &str = "detail_final";
/// Artifact name of the normal map derived from the baked detail.
pub const DETAIL_NORMAL: &str = "detail_normal";

/// Where a model's texture artifacts are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDirs {
    pub textures: PathBuf,
    pub details_raw: PathBuf,
    pub details_baked: PathBuf,
}

impl OutputDirs {
    /// Standard layout below a model's output directory.
    pub fn under(model_output: &Path) -> Self {
        let textures = model_output.join("textures");
        Self {
            details_raw: textures.join("details_raw"),
            details_baked: textures.join("details_baked"),
            textures,
        }
    }
}

/// Artifact name → produced file, `None` when the stage ran and failed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedTextureSet(BTreeMap<String, Option<PathBuf>>);

impl DerivedTextureSet {
    pub fn get(&self, name: &str) -> Option<&Path> {
        self.0.get(name).and_then(|p| p.as_deref())
    }

    /// True if the stage for `name` ran, whatever its outcome.
    pub fn attempted(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, path: Option<PathBuf>) {
        self.0.insert(name.into(), path);
    }

    pub fn produced(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.0
            .iter()
            .filter_map(|(name, path)| path.as_deref().map(|p| (name.as_str(), p)))
    }
}

/// Write an image as PNG, creating the parent directory. Whole-file
/// overwrite; a crash mid-write leaves a file later runs treat as unreadable.
pub fn save_png(img: &DynamicImage, path: &Path) -> TextureResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| TextureError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    img.save_with_format(path, ImageFormat::Png)
        .map_err(|source| TextureError::Encode {
            path: path.to_path_buf(),
            source,
        })
}

/// Runs every texture stage for one model.
pub struct TextureProcessor<'a> {
    config: &'a TextureConfig,
    decoder: &'a dyn TextureDecoder,
}

impl<'a> TextureProcessor<'a> {
    pub fn new(config: &'a TextureConfig, decoder: &'a dyn TextureDecoder) -> Self {
        Self { config, decoder }
    }

    /// Bump → normal, detail bake, then pass-through for every other role.
    /// Failures are logged and recorded as `None`; nothing aborts the model.
    pub fn process_all(
        &self,
        textures: &TextureSet,
        params: &MaterialParams,
        dirs: &OutputDirs,
    ) -> DerivedTextureSet {
        let mut derived = DerivedTextureSet::default();

        if let Some(bump) = textures.get(TextureRole::Bump) {
            let normal = normal_map::convert_bump_to_normal(
                self.decoder,
                bump,
                self.config.resolution,
                &self.config.bump_to_normal,
                &dirs.textures,
            );
            derived.insert(NORMAL, log_failure(normal, TextureRole::Bump));
        }

        if let Some(detail) = textures.get(TextureRole::Detail) {
            let artifacts = detail::process_detail_texture(
                self.decoder,
                detail,
                textures.get(TextureRole::Bump),
                params,
                dirs,
            );
            derived.insert(DETAIL_FINAL, artifacts.baked);
            derived.insert(DETAIL_NORMAL, artifacts.normal);
        }

        for (role, path) in textures.resolved().filter(|(role, _)| !role.is_synthesized()) {
            match converter::normalize_texture(self.decoder, path, self.config.resolution, &dirs.textures) {
                Ok(normalized) => derived.insert(role.as_str(), Some(normalized.path)),
                Err(e) => {
                    warn!("{} texture dropped: {}", role, e);
                    derived.insert(role.as_str(), None);
                }
            }
        }

        info!(
            "Texture stages done: {} artifacts produced",
            derived.produced().count()
        );
        derived
    }
}

fn log_failure(result: TextureResult<PathBuf>, role: TextureRole) -> Option<PathBuf> {
    match result {
        Ok(path) => Some(path),
        Err(e) => {
            warn!("{} stage failed: {}", role, e);
            None
        }
    }
}
