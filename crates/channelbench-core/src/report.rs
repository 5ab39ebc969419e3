use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::info;

use crate::error::{BenchError, Result};
use crate::harness::Measurement;
use crate::plot::save_latency_plot;
use crate::timing::LatencySeries;
use crate::transform::OutputImage;

/// Result of a single timed invocation, kept for manual inspection.
#[derive(Clone, Debug)]
pub struct SingleShotReport {
    pub elapsed: Duration,
    pub output: OutputImage,
    pub output_path: PathBuf,
}

#[derive(Clone, Debug)]
pub struct AggregateReport {
    pub samples: LatencySeries,
    pub mean_seconds: f64,
    pub output: OutputImage,
    pub plot_path: PathBuf,
}

/// Print the elapsed time and write the output image to `output_path`.
pub fn report_single_shot(measurement: Measurement, output_path: &Path) -> Result<SingleShotReport> {
    let Measurement { samples, output } = measurement;
    let elapsed = samples.durations().iter().copied().sum::<Duration>();

    println!("{}", elapsed.as_secs_f64());

    output.save(output_path).map_err(|source| BenchError::Report {
        path: output_path.to_path_buf(),
        source,
    })?;
    info!(
        path = ?output_path,
        width = output.width,
        height = output.height,
        "output image written"
    );

    Ok(SingleShotReport {
        elapsed,
        output,
        output_path: output_path.to_path_buf(),
    })
}

/// Print the mean latency and write the latency-vs-iteration plot.
pub fn report_aggregate(measurement: Measurement, plot_path: &Path) -> Result<AggregateReport> {
    let Measurement { samples, output } = measurement;
    // A measurement always holds at least one sample.
    let mean_seconds = samples.mean_seconds().unwrap_or_default();

    println!("mean latency: {mean_seconds:.6} s over {} iterations", samples.len());
    info!(mean_seconds, iterations = samples.len(), "aggregate latency");

    save_latency_plot(&samples, plot_path)?;

    Ok(AggregateReport {
        samples,
        mean_seconds,
        output,
        plot_path: plot_path.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn measurement(millis: &[u64]) -> Measurement {
        Measurement {
            samples: LatencySeries::from_durations(
                millis.iter().map(|&ms| Duration::from_millis(ms)).collect(),
            ),
            output: OutputImage {
                width: 2,
                height: 2,
                channels: 3,
                data: vec![255; 12],
            },
        }
    }

    #[test]
    fn single_shot_writes_output_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        let report = report_single_shot(measurement(&[12]), &path).unwrap();
        assert_eq!(report.elapsed, Duration::from_millis(12));
        assert_eq!(report.output.data, vec![255; 12]);

        let written = image::open(&path).unwrap().into_rgb8();
        assert_eq!(written.dimensions(), (2, 2));
        assert!(written.as_raw().iter().all(|&v| v == 255));
    }

    #[test]
    fn aggregate_mean_and_plot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gpu.png");
        let report = report_aggregate(measurement(&[10, 20, 30, 40]), &path).unwrap();
        assert!((report.mean_seconds - 0.025).abs() < 1e-12);
        assert_eq!(report.samples.len(), 4);
        assert!(path.exists());
    }

    #[test]
    fn unwritable_output_is_a_report_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope").join("out.png");
        let err = report_single_shot(measurement(&[1]), &path).unwrap_err();
        assert!(matches!(err, BenchError::Report { .. }));
    }
}
