use std::path::{Path, PathBuf};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::locator::TextureRole;
use crate::texture_pipeline::resizer;

/// Top-level converter configuration, loaded once and shared by reference.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub textures: TextureConfig,
    pub paths: PathConfig,
    pub geometry: GeometryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TextureConfig {
    /// Square output resolution for synthesized and normalized textures.
    pub resolution: u32,
    pub bump_to_normal: NormalMapConfig,
    pub patterns: RolePatterns,
}

impl Default for TextureConfig {
    fn default() -> Self {
        Self {
            resolution: 2048,
            bump_to_normal: NormalMapConfig::default(),
            patterns: RolePatterns::default(),
        }
    }
}

/// Gradient settings for bump → normal conversion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalMapConfig {
    pub scale: f32,
    pub invert_x: bool,
    pub invert_y: bool,
}

impl Default for NormalMapConfig {
    fn default() -> Self {
        Self {
            scale: 1.0,
            invert_x: false,
            invert_y: false,
        }
    }
}

/// Filename suffixes tried per role, appended to the descriptor stem.
///
/// Order inside each list is a format preference: the first existing file
/// wins even if a later one would decode and the earlier one won't.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RolePatterns {
    pub bump: Vec<String>,
    pub detail: Vec<String>,
    pub specular: Vec<String>,
    pub albedo: Vec<String>,
}

impl Default for RolePatterns {
    fn default() -> Self {
        fn list(items: &[&str]) -> Vec<String> {
            items.iter().map(|s| s.to_string()).collect()
        }

        Self {
            bump: list(&["_bump.dds", "_bump.png", "_bump.tga"]),
            detail: list(&[
                "_det.dds",
                "_det.png",
                "_detail.dds",
                "_detail.png",
                "_detail.tga",
            ]),
            specular: list(&["_specular.dds", "_spec.dds", "_spec.png"]),
            albedo: list(&[".dds", ".tga", "_diffuse.dds", "_color.tga"]),
        }
    }
}

impl RolePatterns {
    pub fn for_role(&self, role: TextureRole) -> &[String] {
        match role {
            TextureRole::Bump => &self.bump,
            TextureRole::Detail => &self.detail,
            TextureRole::Specular => &self.specular,
            TextureRole::Albedo => &self.albedo,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub temp: PathBuf,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("input"),
            output: PathBuf::from("output"),
            temp: PathBuf::from("temp"),
        }
    }
}

/// Settings for the external mesh/LOD/collision stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryConfig {
    pub enabled: bool,
    pub blender: PathBuf,
    /// Wall-clock limit for one Blender run.
    pub timeout_secs: u64,
    pub global_scale: f32,
    /// Decimation ratio per LOD, LOD0 first.
    pub lod_levels: Vec<f32>,
    pub physics_decimation_ratio: f32,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            blender: PathBuf::from("blender"),
            timeout_secs: 300,
            global_scale: 1.0,
            lod_levels: vec![1.0, 0.5, 0.25],
            physics_decimation_ratio: 0.1,
        }
    }
}

impl PipelineConfig {
    /// Load and validate a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: PipelineConfig = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let textures = &self.textures;
        if textures.resolution == 0 {
            return Err(ConfigError::Invalid {
                field: "textures.resolution",
                message: "must be a positive integer".to_string(),
            });
        }
        if !resizer::is_power_of_two(textures.resolution) {
            warn!(
                "Texture resolution {} is not a power of two; the target engine may rescale it",
                textures.resolution
            );
        }

        let scale = textures.bump_to_normal.scale;
        if !(scale.is_finite() && scale > 0.0) {
            return Err(ConfigError::Invalid {
                field: "textures.bump_to_normal.scale",
                message: format!("must be a positive number, got {}", scale),
            });
        }

        let geometry = &self.geometry;
        if geometry.lod_levels.is_empty() {
            return Err(ConfigError::Invalid {
                field: "geometry.lod_levels",
                message: "at least one LOD level is required".to_string(),
            });
        }
        if let Some(bad) = geometry
            .lod_levels
            .iter()
            .chain(std::iter::once(&geometry.physics_decimation_ratio))
            .find(|r| !(**r > 0.0 && **r <= 1.0))
        {
            return Err(ConfigError::Invalid {
                field: "geometry",
                message: format!("decimation ratios must lie in (0, 1], got {}", bad),
            });
        }
        if !(geometry.global_scale.is_finite() && geometry.global_scale > 0.0) {
            return Err(ConfigError::Invalid {
                field: "geometry.global_scale",
                message: format!("must be a positive number, got {}", geometry.global_scale),
            });
        }

        Ok(())
    }
}
