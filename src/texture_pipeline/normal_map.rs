//! Normal map generation from height/bump data
//!
//! Gradients come from a 3x3 Sobel operator with reflect-101 borders, the
//! per-pixel vector `(gx, gy, 1)` is normalized and packed into RGB.

use std::path::{Path, PathBuf};

use image::{DynamicImage, GrayImage, Rgb, RgbImage};
use log::info;

use super::decode::TextureDecoder;
use super::{resizer, save_png};
use crate::config::NormalMapConfig;
use crate::error::TextureResult;

/// Mirror an out-of-range index back into `0..len` without repeating the
/// edge sample (`-1 → 1`, `len → len - 2`).
fn reflect_101(i: i64, len: u32) -> u32 {
    let len = i64::from(len);
    if len == 1 {
        return 0;
    }
    let r = if i < 0 {
        -i
    } else if i >= len {
        2 * len - 2 - i
    } else {
        i
    };
    r.clamp(0, len - 1) as u32
}

/// Horizontal and vertical Sobel responses of a row-major height field in
/// [0, 1]. `height` must hold exactly `width * h` samples.
pub(crate) fn sobel_gradients(height: &[f32], width: u32, h: u32) -> (Vec<f32>, Vec<f32>) {
    assert_eq!(
        height.len(),
        width as usize * h as usize,
        "height field does not match {}x{}",
        width,
        h
    );
    let sample = |x: i64, y: i64| {
        let px = reflect_101(x, width) as usize;
        let py = reflect_101(y, h) as usize;
        height[py * width as usize + px]
    };

    let len = width as usize * h as usize;
    let mut gx = Vec::with_capacity(len);
    let mut gy = Vec::with_capacity(len);

    for y in 0..i64::from(h) {
        for x in 0..i64::from(width) {
            gx.push(
                (sample(x + 1, y - 1) - sample(x - 1, y - 1))
                    + 2.0 * (sample(x + 1, y) - sample(x - 1, y))
                    + (sample(x + 1, y + 1) - sample(x - 1, y + 1)),
            );
            gy.push(
                (sample(x - 1, y + 1) - sample(x - 1, y - 1))
                    + 2.0 * (sample(x, y + 1) - sample(x, y - 1))
                    + (sample(x + 1, y + 1) - sample(x + 1, y - 1)),
            );
        }
    }

    (gx, gy)
}

/// Map a unit-vector component from [-1, 1] to a byte.
fn pack_component(v: f32) -> u8 {
    ((v + 1.0) * 0.5 * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Build a tangent-space normal map from a grayscale height image.
///
/// A constant input always yields `(128, 128, 255)` because both gradients
/// vanish.
pub fn synthesize_normal_map(height: &GrayImage, params: &NormalMapConfig) -> RgbImage {
    let (width, h) = height.dimensions();
    let field: Vec<f32> = height.pixels().map(|p| f32::from(p[0]) / 255.0).collect();
    let (gx, gy) = sobel_gradients(&field, width, h);

    let sign_x = if params.invert_x { -1.0 } else { 1.0 };
    let sign_y = if params.invert_y { -1.0 } else { 1.0 };

    RgbImage::from_fn(width, h, |x, y| {
        let i = (y * width + x) as usize;
        let nx = gx[i] * params.scale * sign_x;
        let ny = gy[i] * params.scale * sign_y;
        let len = (nx * nx + ny * ny + 1.0).sqrt();
        Rgb([
            pack_component(nx / len),
            pack_component(ny / len),
            pack_component(1.0 / len),
        ])
    })
}

/// Bump → normal stage: decode as grayscale, fit to `resolution`, synthesize
/// and write `<bump stem>_normal.png` into `out_dir`.
pub fn convert_bump_to_normal(
    decoder: &dyn TextureDecoder,
    bump_path: &Path,
    resolution: u32,
    params: &NormalMapConfig,
    out_dir: &Path,
) -> TextureResult<PathBuf> {
    info!("Converting bump to normal: {}", bump_path.display());

    let source = decoder.decode(bump_path)?;
    let gray = DynamicImage::ImageLuma8(source.to_luma8());
    let (gray, _) = resizer::fit_square(gray, resolution);

    let normal = synthesize_normal_map(&gray.to_luma8(), params);
    let output_path = out_dir.join(format!("{}_normal.png", stem_of(bump_path)));
    save_png(&DynamicImage::ImageRgb8(normal), &output_path)?;

    info!("Normal map written: {}", output_path.display());
    Ok(output_path)
}

pub(super) fn stem_of(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
