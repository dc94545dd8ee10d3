use std::path::Path;

use image::{DynamicImage, ImageFormat, ImageReader};

use crate::error::{TextureError, TextureResult};

/// Pluggable pixel decode capability.
///
/// The synthesis stages only ever see a `DynamicImage`, so a DDS codec can be
/// added by wrapping or replacing [`ImageFileDecoder`] without touching them.
pub trait TextureDecoder {
    fn decode(&self, path: &Path) -> TextureResult<DynamicImage>;
}

/// Decodes the raster containers the `image` crate is built with.
///
/// DDS files are filename-matchable but always reported as
/// [`TextureError::UnsupportedFormat`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageFileDecoder;

impl TextureDecoder for ImageFileDecoder {
    fn decode(&self, path: &Path) -> TextureResult<DynamicImage> {
        if !path.is_file() {
            return Err(TextureError::MissingInput(path.to_path_buf()));
        }
        if is_dds(path) {
            return Err(unsupported_dds(path));
        }

        let io_err = |source| TextureError::Io {
            path: path.to_path_buf(),
            source,
        };
        let reader = ImageReader::open(path)
            .map_err(io_err)?
            .with_guessed_format()
            .map_err(io_err)?;
        if reader.format() == Some(ImageFormat::Dds) {
            return Err(unsupported_dds(path));
        }

        reader.decode().map_err(|source| TextureError::Decode {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn is_dds(path: &Path) -> bool {
    path.extension().is_some_and(|e| e.eq_ignore_ascii_case("dds"))
}

fn unsupported_dds(path: &Path) -> TextureError {
    TextureError::UnsupportedFormat {
        path: path.to_path_buf(),
        format: "DDS".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use tempfile::TempDir;

    #[test]
    fn missing_file() {
        let err = ImageFileDecoder.decode(Path::new("nowhere/x.png")).unwrap_err();
        assert!(matches!(err, TextureError::MissingInput(_)));
    }

    #[test]
    fn dds_is_unsupported_even_if_present() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("wall01_bump.DDS");
        std::fs::write(&path, b"DDS \x7c\x00\x00\x00").unwrap();

        let err = ImageFileDecoder.decode(&path).unwrap_err();
        assert!(matches!(err, TextureError::UnsupportedFormat { .. }));
    }

    #[test]
    fn garbage_png_is_decode_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("broken.png");
        std::fs::write(&path, b"not really a png").unwrap();

        let err = ImageFileDecoder.decode(&path).unwrap_err();
        assert!(err.is_unreadable_input());
    }

    #[test]
    fn decodes_png() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("ok.png");
        RgbImage::from_pixel(4, 2, Rgb([1, 2, 3])).save(&path).unwrap();

        let img = ImageFileDecoder.decode(&path).unwrap();
        assert_eq!((img.width(), img.height()), (4, 2));
        assert_eq!(img.to_rgb8().get_pixel(0, 0), &Rgb([1, 2, 3]));
    }
}
