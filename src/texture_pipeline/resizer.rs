use image::DynamicImage;

/// Check if a dimension is a power of two.
pub fn is_power_of_two(n: u32) -> bool {
    n > 0 && (n & (n - 1)) == 0
}

/// True when the larger side of a `width x height` image differs from the
/// target resolution.
pub fn needs_resize(width: u32, height: u32, resolution: u32) -> bool {
    width.max(height) != resolution
}

/// Resize an image to the given dimensions using Lanczos3 filter.
pub fn resize_to(img: &DynamicImage, width: u32, height: u32) -> DynamicImage {
    img.resize_exact(width, height, image::imageops::FilterType::Lanczos3)
}

/// Resize to a `resolution x resolution` square unless the larger side
/// already matches. Deterministic for identical input.
pub fn fit_square(img: DynamicImage, resolution: u32) -> (DynamicImage, bool) {
    if needs_resize(img.width(), img.height(), resolution) {
        (resize_to(&img, resolution, resolution), true)
    } else {
        (img, false)
    }
}
