//! The two benchmark modes, end to end.
//!
//! ```text
//! load image -> check shape -> timing loop (split + invoke) -> report
//! ```
//!
//! Any failure ends the run: nothing is reported or plotted for a run that
//! did not complete every iteration.

use std::num::NonZeroUsize;
use std::path::Path;

use tracing::info;

use crate::config::BenchConfig;
use crate::error::Result;
use crate::harness::Harness;
use crate::load::load_pixel_grid;
use crate::pixel_grid::PixelGrid;
use crate::report::{AggregateReport, SingleShotReport, report_aggregate, report_single_shot};
use crate::transform::{ChannelTransform, ParamVector};

/// Load the configured image, time one invocation, and write its output.
pub fn run_single_shot<T: ChannelTransform>(
    config: &BenchConfig,
    transform: T,
) -> Result<SingleShotReport> {
    let grid = load_pixel_grid(&config.image_path)?;
    single_shot(
        &grid,
        transform,
        config.single_shot.params,
        &config.single_shot.output_path,
    )
}

/// Load the configured image, time the configured number of invocations,
/// and plot the series.
pub fn run_aggregate<T: ChannelTransform>(
    config: &BenchConfig,
    transform: T,
) -> Result<AggregateReport> {
    let grid = load_pixel_grid(&config.image_path)?;
    aggregate(
        &grid,
        transform,
        config.aggregate.params,
        config.aggregate.iterations,
        &config.aggregate.plot_path,
    )
}

pub fn single_shot<T: ChannelTransform>(
    grid: &PixelGrid,
    transform: T,
    params: Option<ParamVector>,
    output_path: &Path,
) -> Result<SingleShotReport> {
    info!(transform = transform.name(), "single-shot run");
    let mut harness = Harness::new(transform, params);
    let measurement = harness.measure(grid, NonZeroUsize::MIN)?;
    report_single_shot(measurement, output_path)
}

pub fn aggregate<T: ChannelTransform>(
    grid: &PixelGrid,
    transform: T,
    params: Option<ParamVector>,
    iterations: NonZeroUsize,
    plot_path: &Path,
) -> Result<AggregateReport> {
    info!(transform = transform.name(), "aggregate run");
    let mut harness = Harness::new(transform, params);
    let measurement = harness.measure(grid, iterations)?;
    report_aggregate(measurement, plot_path)
}
