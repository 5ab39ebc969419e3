use std::cell::Cell;
use std::num::NonZeroUsize;
use std::rc::Rc;

use anyhow::bail;
use channelbench_core::config::BenchConfig;
use channelbench_core::session::{aggregate, run_aggregate, run_single_shot, single_shot};
use channelbench_core::split::interleave_into;
use channelbench_core::transforms::ChannelMerge;
use channelbench_core::{
    BenchError, ChannelPlanes, ChannelTransform, OutputImage, OutputView, ParamVector, PixelGrid,
};
use image::{Rgb, RgbImage};

/// Returns the interleaved input unchanged, failing on one chosen iteration.
struct Identity {
    output: OutputImage,
    calls: Rc<Cell<usize>>,
    fail_at: Option<usize>,
}

impl Identity {
    fn new() -> (Self, Rc<Cell<usize>>) {
        let calls = Rc::new(Cell::new(0));
        let stub = Self {
            output: OutputImage::default(),
            calls: Rc::clone(&calls),
            fail_at: None,
        };
        (stub, calls)
    }

    fn failing_at(iteration: usize) -> (Self, Rc<Cell<usize>>) {
        let (mut stub, calls) = Self::new();
        stub.fail_at = Some(iteration);
        (stub, calls)
    }
}

impl ChannelTransform for Identity {
    fn name(&self) -> &str {
        "identity-stub"
    }

    fn invoke(&mut self, planes: &ChannelPlanes<'_>) -> anyhow::Result<OutputView<'_>> {
        let call = self.calls.get();
        self.calls.set(call + 1);
        if self.fail_at == Some(call) {
            bail!("device lost");
        }
        self.output.resize(planes.width(), planes.height(), 3);
        interleave_into(planes, &mut self.output.data);
        Ok(self.output.view())
    }

    fn last_output(&self) -> Option<OutputView<'_>> {
        (self.calls.get() > 0).then(|| self.output.view())
    }
}

/// Ignores its input and returns a constant 4x4x3 buffer.
struct Constant {
    output: OutputImage,
}

impl Constant {
    fn new(value: u8) -> Self {
        Self {
            output: OutputImage {
                width: 4,
                height: 4,
                channels: 3,
                data: vec![value; 48],
            },
        }
    }
}

impl ChannelTransform for Constant {
    fn name(&self) -> &str {
        "constant-stub"
    }

    fn invoke(&mut self, _planes: &ChannelPlanes<'_>) -> anyhow::Result<OutputView<'_>> {
        Ok(self.output.view())
    }

    fn last_output(&self) -> Option<OutputView<'_>> {
        Some(self.output.view())
    }
}

fn n(value: usize) -> NonZeroUsize {
    NonZeroUsize::new(value).unwrap()
}

#[test]
fn identity_stub_five_iterations() {
    let dir = tempfile::tempdir().unwrap();
    let plot = dir.path().join("gpu.png");
    let grid = PixelGrid::filled(vec![4, 4, 3], 0).unwrap();
    let (stub, calls) = Identity::new();

    let report = aggregate(&grid, stub, None, n(5), &plot).unwrap();

    assert_eq!(calls.get(), 5);
    assert_eq!(report.samples.len(), 5);
    assert!(report.samples.seconds().all(|s| s >= 0.0));
    let expected_mean = report.samples.seconds().sum::<f64>() / 5.0;
    assert!((report.mean_seconds - expected_mean).abs() < 1e-12);
    assert_eq!(report.output.data, grid.as_slice());
    assert_eq!((report.output.width, report.output.height), (4, 4));
    assert!(plot.exists());
}

#[test]
fn single_shot_returns_constant_buffer() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("single_shot.png");
    let grid = PixelGrid::filled(vec![4, 4, 3], 0).unwrap();

    let report = single_shot(&grid, Constant::new(255), None, &out).unwrap();

    assert_eq!(report.output.data, vec![255; 48]);
    assert_eq!((report.output.width, report.output.height), (4, 4));
    let written = image::open(&out).unwrap().into_rgb8();
    assert_eq!(written.as_raw(), &vec![255; 48]);
}

#[test]
fn failure_carries_iteration_and_skips_the_plot() {
    let dir = tempfile::tempdir().unwrap();
    let plot = dir.path().join("gpu.png");
    let grid = PixelGrid::filled(vec![4, 4, 3], 0).unwrap();
    let (stub, calls) = Identity::failing_at(3);

    let err = aggregate(&grid, stub, None, n(10), &plot).unwrap_err();

    match err {
        BenchError::TransformInvocation { iteration, source } => {
            assert_eq!(iteration, 3);
            assert_eq!(source.to_string(), "device lost");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(calls.get(), 4);
    assert!(!plot.exists());
}

#[test]
fn failure_on_first_iteration() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("single_shot.png");
    let grid = PixelGrid::filled(vec![2, 2, 3], 0).unwrap();
    let (stub, _) = Identity::failing_at(0);

    let err = single_shot(&grid, stub, None, &out).unwrap_err();
    assert!(matches!(err, BenchError::TransformInvocation { iteration: 0, .. }));
    assert!(!out.exists());
}

#[test]
fn malformed_shapes_fail_before_any_invocation() {
    let dir = tempfile::tempdir().unwrap();
    for shape in [vec![4, 4], vec![4, 4, 4]] {
        let grid = PixelGrid::filled(shape, 0).unwrap();
        let (stub, calls) = Identity::new();
        let err = aggregate(&grid, stub, None, n(5), &dir.path().join("gpu.png")).unwrap_err();
        assert!(matches!(err, BenchError::InvalidImageShape { .. }));
        assert_eq!(calls.get(), 0);
    }
}

#[test]
fn missing_image_fails_before_timing() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = BenchConfig::default();
    config.image_path = dir.path().join("pano_4K.jpg");
    config.aggregate.plot_path = dir.path().join("gpu.png");
    let (stub, calls) = Identity::new();

    let err = run_aggregate(&config, stub).unwrap_err();
    assert!(matches!(err, BenchError::ImageLoad { .. }));
    assert_eq!(calls.get(), 0);
    assert!(!config.aggregate.plot_path.exists());
}

#[test]
fn configured_runs_use_files_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let image_path = dir.path().join("pano.png");
    RgbImage::from_fn(8, 4, |x, y| Rgb([x as u8 * 30, y as u8 * 60, 7]))
        .save(&image_path)
        .unwrap();

    let mut config = BenchConfig::default();
    config.image_path = image_path.clone();
    config.single_shot.output_path = dir.path().join("single_shot.png");
    config.aggregate.plot_path = dir.path().join("gpu.png");
    config.aggregate.iterations = n(20);
    config.aggregate.params = Some(ParamVector::default());

    let single = run_single_shot(&config, ChannelMerge::new()).unwrap();
    let source = image::open(&image_path).unwrap().into_rgb8();
    assert_eq!(single.output.data, source.as_raw().as_slice());
    assert!(config.single_shot.output_path.exists());

    let report = run_aggregate(&config, ChannelMerge::new()).unwrap();
    assert_eq!(report.samples.len(), 20);
    assert!(config.aggregate.plot_path.exists());
}
