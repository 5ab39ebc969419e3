use anyhow::{Context, Result};
use tracing::info;

/// The device and queue a GPU transform is timed on.
pub struct GpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub adapter_info: wgpu::AdapterInfo,
}

impl GpuContext {
    /// Pick a high-performance adapter.
    ///
    /// `WGPU_BACKEND` narrows the backends considered (e.g. `vulkan`);
    /// otherwise the primary backends are tried.
    pub async fn new() -> Result<Self> {
        let backends = wgpu::Backends::from_env().unwrap_or(wgpu::Backends::PRIMARY);
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends,
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .context("no GPU adapter available for benchmarking")?;

        let adapter_info = adapter.get_info();
        let adapter_limits = adapter.limits();
        info!(
            adapter = %adapter_info.name,
            backend = ?adapter_info.backend,
            device_type = ?adapter_info.device_type,
            driver = %adapter_info.driver,
            "benchmarking on GPU adapter"
        );

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("channelbench"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits {
                    // Large panorama readbacks exceed the downlevel default.
                    max_buffer_size: adapter_limits.max_buffer_size,
                    ..wgpu::Limits::downlevel_defaults().using_resolution(adapter_limits.clone())
                },
                ..Default::default()
            })
            .await
            .context("failed to open GPU device")?;

        Ok(Self {
            device,
            queue,
            adapter_info,
        })
    }

    /// Acquire the device from synchronous code.
    ///
    /// The runtime only lives for the adapter and device requests.
    pub fn new_blocking() -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .context("failed to start runtime for GPU setup")?;
        runtime.block_on(Self::new())
    }
}
