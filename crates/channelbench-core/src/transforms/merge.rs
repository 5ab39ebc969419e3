use anyhow::Result;

use crate::split::{CHANNELS, ChannelPlanes, interleave_into};
use crate::transform::{ChannelTransform, OutputImage, OutputView};

/// Merges the three planes back into one interleaved image.
///
/// The output buffer is reused between calls, so steady-state invocations
/// do not allocate.
#[derive(Debug, Default)]
pub struct ChannelMerge {
    output: OutputImage,
    invoked: bool,
}

impl ChannelMerge {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ChannelTransform for ChannelMerge {
    fn name(&self) -> &str {
        "merge"
    }

    fn invoke(&mut self, planes: &ChannelPlanes<'_>) -> Result<OutputView<'_>> {
        self.output.width = planes.width();
        self.output.height = planes.height();
        self.output.channels = CHANNELS;
        interleave_into(planes, &mut self.output.data);
        self.invoked = true;
        Ok(self.output.view())
    }

    fn last_output(&self) -> Option<OutputView<'_>> {
        self.invoked.then(|| self.output.view())
    }
}
