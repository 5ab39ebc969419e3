mod merge;
mod projection;

pub use merge::ChannelMerge;
pub use projection::{FIELD_OF_VIEW_DEG, PanoramaProjection};
