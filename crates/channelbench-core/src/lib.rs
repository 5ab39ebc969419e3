pub mod config;
pub mod error;
pub mod harness;
pub mod load;
pub mod pixel_grid;
pub mod plot;
pub mod report;
pub mod session;
pub mod split;
pub mod timing;
pub mod transform;
pub mod transforms;

pub use error::{BenchError, Result};
pub use pixel_grid::PixelGrid;
pub use split::{ChannelPlane, ChannelPlanes, split_channels};
pub use transform::{ChannelTransform, OutputImage, OutputView, ParamVector};
