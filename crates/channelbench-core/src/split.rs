use crate::error::{BenchError, Result};
use crate::pixel_grid::PixelGrid;

/// Number of color planes a grid is split into.
pub const CHANNELS: usize = 3;

/// Strided, borrowed view of one channel of a [`PixelGrid`].
///
/// Reading the view walks the interleaved source with a stride of
/// [`CHANNELS`]; no pixel data is copied.
#[derive(Clone, Copy, Debug)]
pub struct ChannelPlane<'a> {
    data: &'a [u8],
    width: usize,
    height: usize,
    channel: usize,
}

impl<'a> ChannelPlane<'a> {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn channel(&self) -> usize {
        self.channel
    }

    pub fn len(&self) -> usize {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, x: usize, y: usize) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.data[(y * self.width + x) * CHANNELS + self.channel])
    }

    /// Samples in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = u8> + 'a {
        let data: &'a [u8] = self.data;
        let start = self.channel.min(data.len());
        data[start..].iter().step_by(CHANNELS).copied()
    }

    /// Copy the plane into a contiguous buffer, for consumers that need one.
    pub fn copy_into(&self, out: &mut Vec<u8>) {
        out.clear();
        out.reserve(self.len());
        out.extend(self.iter());
    }

    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.copy_into(&mut out);
        out
    }
}

/// The three planes of one grid, always in channel order 0, 1, 2.
#[derive(Clone, Copy, Debug)]
pub struct ChannelPlanes<'a> {
    planes: [ChannelPlane<'a>; CHANNELS],
}

impl<'a> ChannelPlanes<'a> {
    pub fn width(&self) -> usize {
        self.planes[0].width
    }

    pub fn height(&self) -> usize {
        self.planes[0].height
    }

    pub fn plane(&self, channel: usize) -> Option<&ChannelPlane<'a>> {
        self.planes.get(channel)
    }

    pub fn as_array(&self) -> &[ChannelPlane<'a>; CHANNELS] {
        &self.planes
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChannelPlane<'a>> {
        self.planes.iter()
    }
}

/// Split a `(height, width, 3)` grid into its three channel planes.
pub fn split_channels(grid: &PixelGrid) -> Result<ChannelPlanes<'_>> {
    let &[height, width, channels] = grid.shape() else {
        return Err(BenchError::InvalidImageShape {
            shape: grid.shape().to_vec(),
        });
    };
    if channels != CHANNELS {
        return Err(BenchError::InvalidImageShape {
            shape: grid.shape().to_vec(),
        });
    }

    let data = grid.as_slice();
    let plane = |channel| ChannelPlane {
        data,
        width,
        height,
        channel,
    };
    Ok(ChannelPlanes {
        planes: [plane(0), plane(1), plane(2)],
    })
}

/// Interleave three planes back into a channel-last buffer.
///
/// `out` is cleared first so callers can reuse its allocation.
pub fn interleave_into(planes: &ChannelPlanes<'_>, out: &mut Vec<u8>) {
    let [c0, c1, c2] = planes.as_array();
    out.clear();
    out.reserve(c0.len() * CHANNELS);
    for ((a, b), c) in c0.iter().zip(c1.iter()).zip(c2.iter()) {
        out.extend_from_slice(&[a, b, c]);
    }
}

pub fn interleave(planes: &ChannelPlanes<'_>) -> Vec<u8> {
    let mut out = Vec::new();
    interleave_into(planes, &mut out);
    out
}
