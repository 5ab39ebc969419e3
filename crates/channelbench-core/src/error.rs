use std::path::PathBuf;

use thiserror::Error;

/// Fatal failures of a benchmark run. None of them are retried.
#[derive(Debug, Error)]
pub enum BenchError {
    #[error("failed to load image: {}", path.display())]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("invalid image shape {shape:?}, expected (height, width, 3)")]
    InvalidImageShape { shape: Vec<usize> },

    #[error("transform invocation failed at iteration {iteration}")]
    TransformInvocation {
        iteration: usize,
        #[source]
        source: anyhow::Error,
    },

    #[error("transform {transform} returned no output after the final iteration")]
    MissingOutput { transform: String },

    #[error("failed to write report artifact: {}", path.display())]
    Report {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

pub type Result<T, E = BenchError> = std::result::Result<T, E>;
