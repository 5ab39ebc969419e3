use anyhow::{Context, Result};

use channelbench_core::config::BenchConfig;
use channelbench_core::session::run_single_shot;

fn main() -> Result<()> {
    channelbench::init_tracing();

    let config = BenchConfig::load().context("failed to load configuration")?;
    let transform = channelbench::build_transform(&config)?;
    run_single_shot(&config, transform).context("single-shot run failed")?;
    Ok(())
}
