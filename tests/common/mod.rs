// Common test utilities and helpers
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use image::{GrayImage, Luma, Rgb, RgbImage};
use vmdl_porter::config::PipelineConfig;

/// Pipeline config rooted in a scratch directory, with a small target
/// resolution so fixtures never need resampling.
pub fn config_in(root: &Path, resolution: u32) -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.paths.input = root.join("input");
    config.paths.output = root.join("output");
    config.paths.temp = root.join("temp");
    config.textures.resolution = resolution;
    config.geometry.enabled = false;
    config
}

pub fn write_gray_png(path: &Path, size: u32, value: u8) -> PathBuf {
    ensure_parent(path);
    GrayImage::from_pixel(size, size, Luma([value]))
        .save(path)
        .unwrap();
    path.to_path_buf()
}

pub fn write_rgb_png(path: &Path, size: u32, rgb: [u8; 3]) -> PathBuf {
    ensure_parent(path);
    RgbImage::from_pixel(size, size, Rgb(rgb)).save(path).unwrap();
    path.to_path_buf()
}

pub fn write_bytes(path: &Path, bytes: &[u8]) -> PathBuf {
    ensure_parent(path);
    fs::write(path, bytes).unwrap();
    path.to_path_buf()
}

/// Descriptor blob: 4-byte magic, NUL-terminated path strings, then the
/// little-endian scalars.
pub fn descriptor_bytes(paths: &[&str], scalars: &[f32]) -> Vec<u8> {
    let mut data = vec![0x01, 0x00, 0x00, 0x00];
    for path in paths {
        data.extend_from_slice(path.as_bytes());
        data.push(0);
    }
    for value in scalars {
        data.extend_from_slice(&value.to_le_bytes());
    }
    data
}

/// Assert every pixel of an RGB image equals `expected`.
pub fn assert_solid_rgb(path: &Path, expected: [u8; 3]) {
    let img = image::open(path)
        .unwrap_or_else(|e| panic!("cannot open {}: {}", path.display(), e))
        .to_rgb8();
    for (x, y, px) in img.enumerate_pixels() {
        assert_eq!(px.0, expected, "pixel ({}, {}) of {}", x, y, path.display());
    }
}

pub fn assert_solid_gray(path: &Path, expected: u8) {
    let img = image::open(path)
        .unwrap_or_else(|e| panic!("cannot open {}: {}", path.display(), e))
        .to_luma8();
    for (x, y, px) in img.enumerate_pixels() {
        assert_eq!(px.0[0], expected, "pixel ({}, {}) of {}", x, y, path.display());
    }
}

fn ensure_parent(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
}
