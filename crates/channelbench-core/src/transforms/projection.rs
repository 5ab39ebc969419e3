use std::f64::consts::{FRAC_PI_2, PI};

use anyhow::Result;
use tracing::debug;

use crate::split::{CHANNELS, ChannelPlanes, interleave_into};
use crate::transform::{ChannelTransform, OutputImage, OutputView, ParamVector};

/// Horizontal field of view of the virtual camera.
pub const FIELD_OF_VIEW_DEG: f64 = 90.0;

type Mat3 = [[f64; 3]; 3];

/// Renders a pinhole-camera view out of an equirectangular panorama.
///
/// The parameter vector holds the camera rotation in radians about the x, y
/// and z axes, composed as `Rx * Ry * Rz`. The plain call form looks straight
/// ahead. Columns wrap around the panorama seam; rows clamp at the poles.
#[derive(Debug, Default)]
pub struct PanoramaProjection {
    output_size: Option<(usize, usize)>,
    panorama: Vec<u8>,
    output: OutputImage,
    invoked: bool,
}

impl PanoramaProjection {
    /// Render at the input's size.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output_size(width: usize, height: usize) -> Self {
        Self {
            output_size: Some((width, height)),
            ..Self::default()
        }
    }

    fn render(&mut self, planes: &ChannelPlanes<'_>, angles: [f64; 3]) -> OutputView<'_> {
        let (src_w, src_h) = (planes.width(), planes.height());
        let (dst_w, dst_h) = self.output_size.unwrap_or((src_w, src_h));
        debug!(src_w, src_h, dst_w, dst_h, ?angles, "projecting panorama");

        interleave_into(planes, &mut self.panorama);
        self.output.resize(dst_w, dst_h, CHANNELS);
        self.invoked = true;

        if src_w == 0 || src_h == 0 || dst_w == 0 || dst_h == 0 {
            self.output.data.fill(0);
            return self.output.view();
        }

        let focal = dst_w as f64 / (2.0 * (FIELD_OF_VIEW_DEG.to_radians() / 2.0).tan());
        let (cx, cy) = (dst_w as f64 / 2.0, dst_h as f64 / 2.0);
        let rotation = rotation_matrix(angles);

        for (v, row) in self
            .output
            .data
            .chunks_exact_mut(dst_w * CHANNELS)
            .enumerate()
        {
            for (u, pixel) in row.chunks_exact_mut(CHANNELS).enumerate() {
                let ray = [
                    (u as f64 + 0.5 - cx) / focal,
                    (v as f64 + 0.5 - cy) / focal,
                    1.0,
                ];
                let [x, y, z] = transpose_mul(&rotation, ray);
                let norm = (x * x + y * y + z * z).sqrt();

                let theta = x.atan2(z);
                let phi = (y / norm).asin();
                let px = (theta + PI) * (src_w as f64 / (2.0 * PI)) - 0.5;
                let py = (phi + FRAC_PI_2) * (src_h as f64 / PI) - 0.5;

                sample_bilinear(&self.panorama, src_w, src_h, px, py, pixel);
            }
        }

        self.output.view()
    }
}

impl ChannelTransform for PanoramaProjection {
    fn name(&self) -> &str {
        "projection"
    }

    fn invoke(&mut self, planes: &ChannelPlanes<'_>) -> Result<OutputView<'_>> {
        Ok(self.render(planes, [0.0; 3]))
    }

    fn invoke_with_params(
        &mut self,
        planes: &ChannelPlanes<'_>,
        params: &ParamVector,
    ) -> Result<OutputView<'_>> {
        Ok(self.render(planes, params.0))
    }

    fn last_output(&self) -> Option<OutputView<'_>> {
        self.invoked.then(|| self.output.view())
    }
}

/// World-to-camera rotation for angles about x, y and z.
fn rotation_matrix([ax, ay, az]: [f64; 3]) -> Mat3 {
    let (sx, cx) = ax.sin_cos();
    let (sy, cy) = ay.sin_cos();
    let (sz, cz) = az.sin_cos();
    let rx = [[1.0, 0.0, 0.0], [0.0, cx, sx], [0.0, -sx, cx]];
    let ry = [[cy, 0.0, -sy], [0.0, 1.0, 0.0], [sy, 0.0, cy]];
    let rz = [[cz, sz, 0.0], [-sz, cz, 0.0], [0.0, 0.0, 1.0]];
    mat_mul(&mat_mul(&rx, &ry), &rz)
}

fn mat_mul(a: &Mat3, b: &Mat3) -> Mat3 {
    let mut out = [[0.0; 3]; 3];
    for (i, row) in out.iter_mut().enumerate() {
        for (j, cell) in row.iter_mut().enumerate() {
            *cell = (0..3).map(|k| a[i][k] * b[k][j]).sum();
        }
    }
    out
}

/// `mᵀ · v`; the inverse of a rotation is its transpose.
fn transpose_mul(m: &Mat3, v: [f64; 3]) -> [f64; 3] {
    [
        m[0][0] * v[0] + m[1][0] * v[1] + m[2][0] * v[2],
        m[0][1] * v[0] + m[1][1] * v[1] + m[2][1] * v[2],
        m[0][2] * v[0] + m[1][2] * v[1] + m[2][2] * v[2],
    ]
}

fn sample_bilinear(src: &[u8], width: usize, height: usize, x: f64, y: f64, out: &mut [u8]) {
    let x_floor = x.floor();
    let y_floor = y.floor();
    let fx = x - x_floor;
    let fy = y - y_floor;

    let x0 = (x_floor as i64).rem_euclid(width as i64) as usize;
    let x1 = (x0 + 1) % width;
    let y0 = (y_floor as i64).clamp(0, height as i64 - 1) as usize;
    let y1 = (y_floor as i64 + 1).clamp(0, height as i64 - 1) as usize;

    let at = |col: usize, row: usize, c: usize| src[(row * width + col) * CHANNELS + c] as f64;
    for (c, value) in out.iter_mut().enumerate() {
        let top = at(x0, y0, c) * (1.0 - fx) + at(x1, y0, c) * fx;
        let bottom = at(x0, y1, c) * (1.0 - fx) + at(x1, y1, c) * fx;
        *value = (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8;
    }
}
