use anyhow::{Context, Result};

use channelbench_core::config::BenchConfig;
use channelbench_core::session::run_aggregate;

fn main() -> Result<()> {
    channelbench::init_tracing();

    let config = BenchConfig::load().context("failed to load configuration")?;
    let transform = channelbench::build_transform(&config)?;
    run_aggregate(&config, transform).context("aggregate run failed")?;
    Ok(())
}
