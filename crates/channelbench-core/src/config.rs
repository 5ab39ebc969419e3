use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, info};

use crate::transform::ParamVector;

/// Config file looked up in the working directory.
pub const CONFIG_FILENAME: &str = "channelbench.json";
/// Overrides [`CONFIG_FILENAME`] when set.
pub const CONFIG_ENV: &str = "CHANNELBENCH_CONFIG";

const DEFAULT_ITERATIONS: NonZeroUsize = NonZeroUsize::new(1000).unwrap();

/// Which built-in transform the binaries measure.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransformKind {
    #[default]
    Merge,
    Projection,
    GpuMerge,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BenchConfig {
    pub image_path: PathBuf,
    pub transform: TransformKind,
    /// `[width, height]` of the projected view; defaults to the input size.
    pub projection_size: Option<[u32; 2]>,
    pub single_shot: SingleShotConfig,
    pub aggregate: AggregateConfig,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            image_path: PathBuf::from("pano_4K.jpg"),
            transform: TransformKind::default(),
            projection_size: None,
            single_shot: SingleShotConfig::default(),
            aggregate: AggregateConfig::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SingleShotConfig {
    pub output_path: PathBuf,
    pub params: Option<ParamVector>,
}

impl Default for SingleShotConfig {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from("single_shot.png"),
            params: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AggregateConfig {
    pub iterations: NonZeroUsize,
    pub plot_path: PathBuf,
    pub params: Option<ParamVector>,
}

impl Default for AggregateConfig {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            plot_path: PathBuf::from("gpu.png"),
            params: Some(ParamVector::default()),
        }
    }
}

impl BenchConfig {
    /// Load from `$CHANNELBENCH_CONFIG`, else `./channelbench.json`, else
    /// fall back to defaults. A file that exists but fails to parse is an
    /// error.
    pub fn load() -> Result<Self> {
        let explicit = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        let path = explicit
            .clone()
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILENAME));

        if explicit.is_none() && !path.exists() {
            debug!("no config file, using defaults");
            return Ok(Self::default());
        }
        Self::from_file(&path)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;
        let config = Self::from_json(&text)
            .with_context(|| format!("failed to parse config: {}", path.display()))?;
        info!(?path, "loaded config");
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        if let Some([width, height]) = config.projection_size {
            anyhow::ensure!(
                width > 0 && height > 0,
                "projection_size must be non-zero, got {width}x{height}"
            );
        }
        Ok(config)
    }
}
