use image::RgbImage;

use crate::error::{BenchError, Result};

/// Row-major, channel-last array of 8-bit samples.
///
/// A well-formed grid has shape `(height, width, 3)`, but any shape whose
/// element count matches the data length can be held. Checking the rank and
/// channel count is left to [`split_channels`](crate::split::split_channels),
/// so a malformed image is rejected at the same place no matter where it
/// came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelGrid {
    shape: Vec<usize>,
    data: Vec<u8>,
}

impl PixelGrid {
    pub fn from_shape_vec(shape: Vec<usize>, data: Vec<u8>) -> Result<Self> {
        let expected: usize = shape.iter().product();
        if shape.is_empty() || expected != data.len() {
            return Err(BenchError::InvalidImageShape { shape });
        }
        Ok(Self { shape, data })
    }

    /// Grid of the given shape with every sample set to `value`.
    ///
    /// Follows the same shape rules as [`PixelGrid::from_shape_vec`].
    pub fn filled(shape: Vec<usize>, value: u8) -> Result<Self> {
        let len = shape.iter().product();
        Self::from_shape_vec(shape, vec![value; len])
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn height(&self) -> usize {
        self.shape.first().copied().unwrap_or(0)
    }

    pub fn width(&self) -> usize {
        self.shape.get(1).copied().unwrap_or(0)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }
}

impl From<RgbImage> for PixelGrid {
    fn from(img: RgbImage) -> Self {
        let shape = vec![img.height() as usize, img.width() as usize, 3];
        Self {
            shape,
            data: img.into_raw(),
        }
    }
}
