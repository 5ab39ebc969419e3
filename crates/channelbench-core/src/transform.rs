use std::path::Path;

use anyhow::Result;
use image::error::{ParameterError, ParameterErrorKind};
use image::{DynamicImage, GrayImage, ImageError, RgbImage, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::split::ChannelPlanes;

/// Three opaque numbers passed through to a transform.
///
/// All zeros means "no adjustment". What the values mean is up to the
/// transform receiving them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParamVector(pub [f64; 3]);

/// A channel-wise image transform measured by the harness.
///
/// Planes are always passed in channel order 0, 1, 2. The returned view
/// borrows memory owned by the transform and stays valid until the next
/// invocation; [`last_output`](Self::last_output) hands out the same memory
/// again once the caller is done timing.
pub trait ChannelTransform {
    fn name(&self) -> &str;

    fn invoke(&mut self, planes: &ChannelPlanes<'_>) -> Result<OutputView<'_>>;

    /// Parameterized call form. Transforms without parameters ignore them.
    fn invoke_with_params(
        &mut self,
        planes: &ChannelPlanes<'_>,
        params: &ParamVector,
    ) -> Result<OutputView<'_>> {
        let _ = params;
        self.invoke(planes)
    }

    fn last_output(&self) -> Option<OutputView<'_>>;
}

impl<T: ChannelTransform + ?Sized> ChannelTransform for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn invoke(&mut self, planes: &ChannelPlanes<'_>) -> Result<OutputView<'_>> {
        (**self).invoke(planes)
    }

    fn invoke_with_params(
        &mut self,
        planes: &ChannelPlanes<'_>,
        params: &ParamVector,
    ) -> Result<OutputView<'_>> {
        (**self).invoke_with_params(planes, params)
    }

    fn last_output(&self) -> Option<OutputView<'_>> {
        (**self).last_output()
    }
}

/// Borrowed, interleaved output of a transform.
#[derive(Clone, Copy, Debug)]
pub struct OutputView<'a> {
    pub width: usize,
    pub height: usize,
    pub channels: usize,
    pub data: &'a [u8],
}

impl OutputView<'_> {
    pub fn to_image(&self) -> OutputImage {
        OutputImage {
            width: self.width,
            height: self.height,
            channels: self.channels,
            data: self.data.to_vec(),
        }
    }
}

/// Owned, interleaved u8 image.
///
/// Transforms keep one of these as their output storage; the harness copies
/// into one after timing has finished.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OutputImage {
    pub width: usize,
    pub height: usize,
    pub channels: usize,
    pub data: Vec<u8>,
}

impl OutputImage {
    pub fn new(width: usize, height: usize, channels: usize) -> Self {
        Self {
            width,
            height,
            channels,
            data: vec![0; width * height * channels],
        }
    }

    /// Reshape in place, keeping the allocation.
    pub fn resize(&mut self, width: usize, height: usize, channels: usize) {
        self.width = width;
        self.height = height;
        self.channels = channels;
        self.data.resize(width * height * channels, 0);
    }

    pub fn view(&self) -> OutputView<'_> {
        OutputView {
            width: self.width,
            height: self.height,
            channels: self.channels,
            data: &self.data,
        }
    }

    pub fn to_dynamic(&self) -> Result<DynamicImage, ImageError> {
        let width = u32::try_from(self.width).map_err(|_| dimension_mismatch())?;
        let height = u32::try_from(self.height).map_err(|_| dimension_mismatch())?;
        let data = self.data.clone();
        let img = match self.channels {
            1 => GrayImage::from_raw(width, height, data).map(DynamicImage::ImageLuma8),
            3 => RgbImage::from_raw(width, height, data).map(DynamicImage::ImageRgb8),
            4 => RgbaImage::from_raw(width, height, data).map(DynamicImage::ImageRgba8),
            _ => None,
        };
        img.ok_or_else(dimension_mismatch)
    }

    /// Encode to disk; the format follows the file extension.
    pub fn save(&self, path: &Path) -> Result<(), ImageError> {
        self.to_dynamic()?.save(path)
    }
}

fn dimension_mismatch() -> ImageError {
    ImageError::Parameter(ParameterError::from_kind(
        ParameterErrorKind::DimensionMismatch,
    ))
}
