use std::path::Path;

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut};
use tracing::info;

use crate::error::{BenchError, Result};
use crate::timing::LatencySeries;

pub const PLOT_WIDTH: u32 = 1200;
pub const PLOT_HEIGHT: u32 = 600;
const MARGIN: f32 = 40.0;
const GRID_LINES: u32 = 5;
/// Headroom above the slowest sample.
const Y_HEADROOM: f64 = 1.1;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const AXIS: Rgb<u8> = Rgb([0, 0, 0]);
const GRID: Rgb<u8> = Rgb([220, 220, 220]);
pub const SERIES: Rgb<u8> = Rgb([31, 119, 180]);
pub const MEAN: Rgb<u8> = Rgb([214, 39, 40]);

/// Maps (iteration, seconds) into canvas pixels.
struct Axes {
    left: f32,
    right: f32,
    top: f32,
    bottom: f32,
    count: usize,
    y_max: f64,
}

impl Axes {
    fn new(series: &LatencySeries) -> Self {
        let y_max = match series.max_seconds() {
            Some(max) if max > 0.0 => max * Y_HEADROOM,
            _ => 1.0,
        };
        Self {
            left: MARGIN,
            right: PLOT_WIDTH as f32 - MARGIN,
            top: MARGIN,
            bottom: PLOT_HEIGHT as f32 - MARGIN,
            count: series.len(),
            y_max,
        }
    }

    fn x(&self, iteration: usize) -> f32 {
        if self.count <= 1 {
            return (self.left + self.right) / 2.0;
        }
        let t = iteration as f32 / (self.count - 1) as f32;
        self.left + t * (self.right - self.left)
    }

    fn y(&self, seconds: f64) -> f32 {
        let t = (seconds / self.y_max) as f32;
        self.bottom - t * (self.bottom - self.top)
    }
}

/// Rasterize latency against iteration index: x runs 0..N-1, y is seconds
/// from zero. The mean is drawn as a horizontal line.
pub fn draw_latency_plot(series: &LatencySeries) -> RgbImage {
    let mut canvas = RgbImage::from_pixel(PLOT_WIDTH, PLOT_HEIGHT, BACKGROUND);
    let axes = Axes::new(series);

    for k in 1..=GRID_LINES {
        let y = axes.bottom - (axes.bottom - axes.top) * k as f32 / GRID_LINES as f32;
        draw_line_segment_mut(&mut canvas, (axes.left, y), (axes.right, y), GRID);
    }
    draw_line_segment_mut(
        &mut canvas,
        (axes.left, axes.bottom),
        (axes.right, axes.bottom),
        AXIS,
    );
    draw_line_segment_mut(
        &mut canvas,
        (axes.left, axes.top),
        (axes.left, axes.bottom),
        AXIS,
    );

    let points: Vec<(f32, f32)> = series
        .seconds()
        .enumerate()
        .map(|(i, s)| (axes.x(i), axes.y(s)))
        .collect();
    match points.as_slice() {
        [] => {}
        [(x, y)] => {
            draw_filled_circle_mut(&mut canvas, (*x as i32, *y as i32), 3, SERIES);
        }
        _ => {
            for pair in points.windows(2) {
                draw_line_segment_mut(&mut canvas, pair[0], pair[1], SERIES);
            }
        }
    }

    if let Some(mean) = series.mean_seconds() {
        let y = axes.y(mean);
        draw_line_segment_mut(&mut canvas, (axes.left, y), (axes.right, y), MEAN);
    }

    canvas
}

/// Draw the plot and encode it to `path`; the format follows the extension.
pub fn save_latency_plot(series: &LatencySeries, path: &Path) -> Result<()> {
    let canvas = draw_latency_plot(series);
    canvas.save(path).map_err(|source| BenchError::Report {
        path: path.to_path_buf(),
        source,
    })?;
    info!(?path, samples = series.len(), "latency plot written");
    Ok(())
}
