use std::path::{Path, PathBuf};

use image::{ColorType, DynamicImage};
use log::info;

use super::decode::TextureDecoder;
use super::normal_map::stem_of;
use super::{resizer, save_png};
use crate::error::TextureResult;

/// Result of a pass-through texture normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTexture {
    pub path: PathBuf,
    /// Original dimensions before conversion.
    pub original_width: u32,
    pub original_height: u32,
    /// Final dimensions after conversion.
    pub final_width: u32,
    pub final_height: u32,
    pub color: ColorType,
    /// Whether the image was resized.
    pub was_resized: bool,
}

/// PNG has no float sample type; widen those to 16-bit, keep everything else.
fn to_png_compatible(img: DynamicImage) -> DynamicImage {
    match img.color() {
        ColorType::Rgb32F => DynamicImage::ImageRgb16(img.to_rgb16()),
        ColorType::Rgba32F => DynamicImage::ImageRgba16(img.to_rgba16()),
        _ => img,
    }
}

/// Re-encode any texture as `<stem>.png` in `out_dir`, fitted to
/// `resolution`.
///
/// Channel count, alpha and bit depth are kept. Identical input and
/// resolution always produce byte-identical output.
pub fn normalize_texture(
    decoder: &dyn TextureDecoder,
    source: &Path,
    resolution: u32,
    out_dir: &Path,
) -> TextureResult<NormalizedTexture> {
    let img = to_png_compatible(decoder.decode(source)?);
    let original_width = img.width();
    let original_height = img.height();

    let (img, was_resized) = resizer::fit_square(img, resolution);

    let output_path = out_dir.join(format!("{}.png", stem_of(source)));
    save_png(&img, &output_path)?;
    info!(
        "Normalized {} → {} ({}x{} → {}x{})",
        source.display(),
        output_path.display(),
        original_width,
        original_height,
        img.width(),
        img.height()
    );

    Ok(NormalizedTexture {
        path: output_path,
        original_width,
        original_height,
        final_width: img.width(),
        final_height: img.height(),
        color: img.color(),
        was_resized,
    })
}
