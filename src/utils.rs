use std::path::Path;

use anyhow::{Context, Result};
use image::imageops::FilterType;
use image::DynamicImage;
use indicatif::ProgressStyle;

pub fn imread(path: &Path) -> Result<DynamicImage> {
    image::open(path).with_context(|| format!("failed to read image {}", path.display()))
}

/// Downscales the image to fit within `(width, height)`, preserving the
/// aspect ratio. Images already within bounds are returned untouched.
pub fn shrink_to(image: DynamicImage, (width, height): (u32, u32)) -> DynamicImage {
    if image.width() > width || image.height() > height {
        image.resize(width, height, FilterType::Triangle)
    } else {
        image
    }
}

pub fn pb_style() -> ProgressStyle {
    ProgressStyle::with_template("[{elapsed_precise}] {bar:40} {pos}/{len} {msg}")
        .expect("failed to build progress style")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shrink_preserves_small_images() {
        let image = DynamicImage::new_luma8(100, 80);
        let shrunk = shrink_to(image, (1920, 1080));
        assert_eq!((shrunk.width(), shrunk.height()), (100, 80));
    }

    #[test]
    fn shrink_fits_within_bounds() {
        let image = DynamicImage::new_luma8(4000, 1000);
        let shrunk = shrink_to(image, (1920, 1080));
        assert!(shrunk.width() <= 1920 && shrunk.height() <= 1080);
        // aspect ratio is kept
        assert_eq!(shrunk.width(), 1920);
        assert_eq!(shrunk.height(), 480);
    }
}
