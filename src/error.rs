use std::io;
use std::path::PathBuf;

/// Failure of a single texture stage.
///
/// `MissingInput` and `UnsupportedFormat` are reported separately but every
/// caller in the pipeline treats them the same way: the artifact becomes
/// `None` and the model keeps going.
#[derive(Debug, thiserror::Error)]
pub enum TextureError {
    /// Source file does not exist
    #[error("texture not found: {}", .0.display())]
    MissingInput(PathBuf),

    /// No decoder is available for this container (e.g. DDS)
    #[error("no decoder for {format} texture: {}", .path.display())]
    UnsupportedFormat { path: PathBuf, format: String },

    /// Pixel data could not be decoded
    #[error("failed to decode {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Output image could not be written
    #[error("failed to write {}: {source}", .path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// IO error while preparing an output location
    #[error("IO error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl TextureError {
    /// True for the "input simply isn't usable" family of failures.
    pub fn is_unreadable_input(&self) -> bool {
        matches!(
            self,
            TextureError::MissingInput(_)
                | TextureError::UnsupportedFormat { .. }
                | TextureError::Decode { .. }
        )
    }
}

/// Result type for texture stages
pub type TextureResult<T> = std::result::Result<T, TextureError>;

/// Rejected configuration value.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config value `{field}`: {message}")]
    Invalid { field: &'static str, message: String },
}
