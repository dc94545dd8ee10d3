use std::path::{Path, PathBuf};

use image::{DynamicImage, GrayImage, Luma, RgbImage};
use log::{debug, info, warn};
use serde::Serialize;

use super::decode::TextureDecoder;
use super::normal_map::{self, stem_of};
use super::{resizer, save_png, OutputDirs};
use crate::config::NormalMapConfig;
use crate::descriptor::MaterialParams;
use crate::error::TextureResult;

/// Mask used when no bump texture is available. A fixed mid value, not an
/// estimate of the missing data.
pub const PLACEHOLDER_MASK_VALUE: u8 = 127;

/// File suffixes of the three split channels, in channel order.
const CHANNEL_NAMES: [&str; 3] = ["R", "G", "B"];

/// Mask value reserved for each split channel, in channel order
/// (first ↔ 1.0, second ↔ 0.5, third ↔ 0.0).
const CHANNEL_CENTERS: [f32; 3] = [1.0, 0.5, 0.0];

/// Normal settings for the detail-derived normal map.
const DETAIL_NORMAL: NormalMapConfig = NormalMapConfig {
    scale: 1.0,
    invert_x: false,
    invert_y: false,
};

/// Triangular kernel: 1 at `center`, 0 at distance 0.5 and beyond.
pub fn triangle_weight(x: f32, center: f32) -> f32 {
    (1.0 - 2.0 * (x - center).abs()).clamp(0.0, 1.0)
}

/// Per-channel blend weights for a normalized mask value, in channel order.
///
/// The three kernels overlap so their sum is positive on all of [0, 1].
pub fn blend_weights(mask: f32) -> [f32; 3] {
    let raw = CHANNEL_CENTERS.map(|center| triangle_weight(mask, center));
    let total: f32 = raw.iter().sum();
    raw.map(|w| w / total)
}

/// Split an RGB image into three single-channel images.
pub fn split_channels(img: &RgbImage) -> [GrayImage; 3] {
    let (w, h) = img.dimensions();
    [0, 1, 2].map(|c| GrayImage::from_fn(w, h, |x, y| Luma([img.get_pixel(x, y)[c]])))
}

/// Blue channel of the bump image, or the placeholder, sized to `(w, h)`.
pub fn build_mask(bump: Option<&RgbImage>, width: u32, height: u32) -> GrayImage {
    let Some(bump) = bump else {
        return GrayImage::from_pixel(width, height, Luma([PLACEHOLDER_MASK_VALUE]));
    };

    let blue = GrayImage::from_fn(bump.width(), bump.height(), |x, y| {
        Luma([bump.get_pixel(x, y)[2]])
    });
    if blue.dimensions() == (width, height) {
        return blue;
    }
    debug!(
        "Resizing mask {}x{} to detail size {}x{}",
        blue.width(),
        blue.height(),
        width,
        height
    );
    resizer::resize_to(&DynamicImage::ImageLuma8(blue), width, height).to_luma8()
}

/// Weighted sum of the three channels, weights taken from the mask.
/// Fractional results are truncated toward zero.
pub fn bake_channels(channels: &[GrayImage; 3], mask: &GrayImage) -> GrayImage {
    let (w, h) = mask.dimensions();
    GrayImage::from_fn(w, h, |x, y| {
        let weights = blend_weights(f32::from(mask.get_pixel(x, y)[0]) / 255.0);
        let value: f32 = channels
            .iter()
            .zip(weights)
            .map(|(channel, weight)| weight * f32::from(channel.get_pixel(x, y)[0]))
            .sum();
        Luma([value.clamp(0.0, 255.0) as u8])
    })
}

/// Everything the detail stage managed to write before stopping.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct DetailArtifacts {
    pub channels: Vec<PathBuf>,
    pub baked: Option<PathBuf>,
    pub normal: Option<PathBuf>,
}

/// Split, bake and derive a normal map from a detail texture.
///
/// Any unreadable input or failed write ends the stage; artifacts already
/// written are returned.
pub fn process_detail_texture(
    decoder: &dyn TextureDecoder,
    detail_path: &Path,
    bump_path: Option<&Path>,
    params: &MaterialParams,
    dirs: &OutputDirs,
) -> DetailArtifacts {
    info!("Processing detail texture: {}", detail_path.display());
    let mut artifacts = DetailArtifacts::default();

    let detail = match decoder.decode(detail_path) {
        Ok(img) => img.to_rgb8(),
        Err(e) => {
            warn!("Detail stage skipped: {}", e);
            return artifacts;
        }
    };

    let detail_stem = stem_of(detail_path);
    let base = detail_stem.replace("_detail", "");
    let channels = split_channels(&detail);

    for (channel, name) in channels.iter().zip(CHANNEL_NAMES) {
        let path = dirs.details_raw.join(format!("{}_detail_{}.png", base, name));
        if let Err(e) = save_png(&DynamicImage::ImageLuma8(channel.clone()), &path) {
            warn!("Detail stage stopped while saving channels: {}", e);
            return artifacts;
        }
        artifacts.channels.push(path);
    }
    debug!("Detail channels saved for {}", base);

    let bump = bump_path.and_then(|path| match decoder.decode(path) {
        Ok(img) => Some(img.to_rgb8()),
        Err(e) => {
            warn!("Bump mask unavailable, using placeholder: {}", e);
            None
        }
    });
    let mask = build_mask(bump.as_ref(), detail.width(), detail.height());
    debug!(
        "Baking {} with detail_scale={} (mask from {})",
        base,
        params.detail_scale,
        if bump.is_some() { "bump" } else { "placeholder" }
    );

    let baked = bake_channels(&channels, &mask);
    let baked_path = dirs
        .details_baked
        .join(format!("{}_final.png", detail_stem));
    if let Err(e) = save_png(&DynamicImage::ImageLuma8(baked), &baked_path) {
        warn!("Detail stage stopped while saving bake: {}", e);
        return artifacts;
    }
    info!("Baked detail written: {}", baked_path.display());
    artifacts.baked = Some(baked_path.clone());

    match detail_normal(decoder, &baked_path, &dirs.details_baked, &base) {
        Ok(path) => artifacts.normal = Some(path),
        Err(e) => warn!("Detail normal map not created: {}", e),
    }

    artifacts
}

/// Re-read the baked image and derive its normal map at native size.
fn detail_normal(
    decoder: &dyn TextureDecoder,
    baked_path: &Path,
    out_dir: &Path,
    base: &str,
) -> TextureResult<PathBuf> {
    let baked = decoder.decode(baked_path)?.to_luma8();
    let normal = normal_map::synthesize_normal_map(&baked, &DETAIL_NORMAL);
    let output_path = out_dir.join(format!("{}_detail_normal.png", base));
    save_png(&DynamicImage::ImageRgb8(normal), &output_path)?;
    info!("Detail normal map written: {}", output_path.display());
    Ok(output_path)
}
