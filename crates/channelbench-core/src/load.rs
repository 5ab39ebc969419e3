use std::path::Path;
use std::time::Instant;

use tracing::{debug, info};

use crate::error::{BenchError, Result};
use crate::pixel_grid::PixelGrid;

/// Decode a raster image (JPEG, PNG, TIFF) into an RGB pixel grid.
///
/// Gray and alpha images are converted to three channels, so a decoded
/// file always yields a `(height, width, 3)` grid.
pub fn load_pixel_grid(path: &Path) -> Result<PixelGrid> {
    info!(?path, "loading image file");
    let t0 = Instant::now();

    let img = image::open(path).map_err(|source| BenchError::ImageLoad {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(
        elapsed_ms = t0.elapsed().as_millis() as u64,
        width = img.width(),
        height = img.height(),
        color = ?img.color(),
        "image decode"
    );

    Ok(PixelGrid::from(img.into_rgb8()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage};

    #[test]
    fn loads_png_as_rgb_grid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("small.png");
        RgbImage::from_pixel(5, 3, Rgb([1, 2, 3])).save(&path).unwrap();

        let grid = load_pixel_grid(&path).unwrap();
        assert_eq!(grid.shape(), &[3, 5, 3]);
        assert_eq!(&grid.as_slice()[..3], &[1, 2, 3]);
    }

    #[test]
    fn gray_image_is_expanded_to_three_channels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gray.png");
        GrayImage::from_pixel(2, 2, Luma([40])).save(&path).unwrap();

        let grid = load_pixel_grid(&path).unwrap();
        assert_eq!(grid.shape(), &[2, 2, 3]);
        assert!(grid.as_slice().iter().all(|&v| v == 40));
    }

    #[test]
    fn missing_file_is_an_image_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.jpg");
        let err = load_pixel_grid(&path).unwrap_err();
        assert!(matches!(err, BenchError::ImageLoad { path: ref p, .. } if p == &path));
    }

    #[test]
    fn corrupt_file_is_an_image_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corrupt.jpg");
        std::fs::write(&path, b"definitely not a jpeg").unwrap();
        let err = load_pixel_grid(&path).unwrap_err();
        assert!(matches!(err, BenchError::ImageLoad { .. }));
    }
}
