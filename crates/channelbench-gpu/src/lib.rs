pub mod context;
pub mod merge;
pub mod texture;

pub use context::GpuContext;
pub use merge::GpuChannelMerge;
