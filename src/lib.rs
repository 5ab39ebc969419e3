use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use channelbench_core::ChannelTransform;
use channelbench_core::config::{BenchConfig, TransformKind};
use channelbench_core::transforms::{ChannelMerge, PanoramaProjection};
use channelbench_gpu::{GpuChannelMerge, GpuContext};

pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

/// Acquire the configured transform. Runs once, before any timing starts.
pub fn build_transform(config: &BenchConfig) -> Result<Box<dyn ChannelTransform>> {
    let transform: Box<dyn ChannelTransform> = match config.transform {
        TransformKind::Merge => Box::new(ChannelMerge::new()),
        TransformKind::Projection => match config.projection_size {
            Some([width, height]) => {
                Box::new(PanoramaProjection::with_output_size(width as usize, height as usize))
            }
            None => Box::new(PanoramaProjection::new()),
        },
        TransformKind::GpuMerge => {
            let ctx = GpuContext::new_blocking().context("failed to initialise GPU")?;
            Box::new(GpuChannelMerge::new(ctx))
        }
    };
    info!(transform = transform.name(), "transform ready");
    Ok(transform)
}
