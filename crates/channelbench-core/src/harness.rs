use std::num::NonZeroUsize;

use tracing::{debug, info};

use crate::error::{BenchError, Result};
use crate::pixel_grid::PixelGrid;
use crate::split::split_channels;
use crate::timing::{LatencySeries, TimingLoop};
use crate::transform::{ChannelTransform, OutputImage, ParamVector};

/// Outcome of a successful run: every iteration's latency plus a copy of
/// the final output, taken after timing stopped.
#[derive(Clone, Debug)]
pub struct Measurement {
    pub samples: LatencySeries,
    pub output: OutputImage,
}

/// Owns the transform for the duration of a run.
///
/// With `params` set every call uses the parameterized form, otherwise the
/// plain form.
pub struct Harness<T> {
    transform: T,
    params: Option<ParamVector>,
}

impl<T: ChannelTransform> Harness<T> {
    pub fn new(transform: T, params: Option<ParamVector>) -> Self {
        Self { transform, params }
    }

    pub fn transform(&self) -> &T {
        &self.transform
    }

    pub fn into_inner(self) -> T {
        self.transform
    }

    /// Split and invoke `iterations` times, timing each round trip.
    ///
    /// The grid shape is checked before the transform is called for the first
    /// time. A failed invocation aborts the run; no partial series is returned.
    pub fn measure(&mut self, grid: &PixelGrid, iterations: NonZeroUsize) -> Result<Measurement> {
        split_channels(grid)?;

        info!(
            transform = self.transform.name(),
            iterations = iterations.get(),
            parameterized = self.params.is_some(),
            shape = ?grid.shape(),
            "starting timing loop"
        );

        let transform = &mut self.transform;
        let params = self.params;
        let samples = TimingLoop::new(iterations.get()).run(|iteration| {
            let planes = split_channels(grid)?;
            let outcome = match &params {
                Some(params) => transform.invoke_with_params(&planes, params).map(|_| ()),
                None => transform.invoke(&planes).map(|_| ()),
            };
            outcome.map_err(|source| BenchError::TransformInvocation { iteration, source })
        })?;

        let output = self
            .transform
            .last_output()
            .map(|view| view.to_image())
            .ok_or_else(|| BenchError::MissingOutput {
                transform: self.transform.name().to_owned(),
            })?;
        debug!(
            width = output.width,
            height = output.height,
            channels = output.channels,
            "captured final output"
        );

        Ok(Measurement { samples, output })
    }
}
