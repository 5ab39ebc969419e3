use anyhow::{Context, Result, ensure};
use tracing::debug;

use channelbench_core::split::{CHANNELS, ChannelPlanes};
use channelbench_core::{ChannelTransform, OutputImage, OutputView};

use crate::context::GpuContext;
use crate::texture::{GpuTexture, readback_buffer_size};

const WORKGROUP_SIZE: u32 = 16;
const PLANE_LABELS: [&str; CHANNELS] = ["plane0", "plane1", "plane2"];

/// Merges the three planes on the GPU.
///
/// Each invocation uploads the planes as R8 textures, runs one compute pass
/// writing an RGBA8 texture, and waits for the readback. Strided planes are
/// first packed into contiguous staging buffers for the upload; that copy is
/// part of the measured latency.
pub struct GpuChannelMerge {
    ctx: GpuContext,
    bind_group_layout: wgpu::BindGroupLayout,
    pipeline: wgpu::ComputePipeline,
    staging: [Vec<u8>; CHANNELS],
    output: OutputImage,
    invoked: bool,
}

impl GpuChannelMerge {
    pub fn new(ctx: GpuContext) -> Self {
        debug!("loading merge compute shader");
        let module = ctx
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("merge"),
                source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/merge.wgsl").into()),
            });

        let bind_group_layout = Self::create_layout(&ctx.device);

        let pipeline_layout = ctx
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("merge_layout"),
                bind_group_layouts: &[&bind_group_layout],
                push_constant_ranges: &[],
            });

        let pipeline = ctx
            .device
            .create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some("merge"),
                layout: Some(&pipeline_layout),
                module: &module,
                entry_point: Some("main"),
                compilation_options: Default::default(),
                cache: None,
            });

        Self {
            ctx,
            bind_group_layout,
            pipeline,
            staging: Default::default(),
            output: OutputImage::default(),
            invoked: false,
        }
    }

    fn create_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
        let plane_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: false },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };

        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("merge_bgl"),
            entries: &[
                plane_entry(0),
                plane_entry(1),
                plane_entry(2),
                // Output texture
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::StorageTexture {
                        access: wgpu::StorageTextureAccess::WriteOnly,
                        format: wgpu::TextureFormat::Rgba8Unorm,
                        view_dimension: wgpu::TextureViewDimension::D2,
                    },
                    count: None,
                },
            ],
        })
    }
}

/// Rejects images the device cannot hold as textures or read back in one buffer.
fn check_device_limits(width: u32, height: u32, limits: &wgpu::Limits) -> Result<()> {
    let max_dim = limits.max_texture_dimension_2d;
    ensure!(
        width <= max_dim && height <= max_dim,
        "{width}x{height} image exceeds the {max_dim}px texture limit"
    );
    let readback = readback_buffer_size(width, height);
    ensure!(
        readback <= limits.max_buffer_size,
        "{width}x{height} image needs a {readback}-byte readback buffer, limit is {}",
        limits.max_buffer_size
    );
    Ok(())
}

impl ChannelTransform for GpuChannelMerge {
    fn name(&self) -> &str {
        "gpu-merge"
    }

    fn invoke(&mut self, planes: &ChannelPlanes<'_>) -> Result<OutputView<'_>> {
        let (width, height) = (planes.width(), planes.height());
        ensure!(
            width > 0 && height > 0,
            "cannot merge an empty {width}x{height} image on the GPU"
        );
        let w = u32::try_from(width)?;
        let h = u32::try_from(height)?;
        check_device_limits(w, h, &self.ctx.device.limits())
            .with_context(|| format!("adapter {}", self.ctx.adapter_info.name))?;

        let device = &self.ctx.device;
        let queue = &self.ctx.queue;

        let mut inputs = Vec::with_capacity(CHANNELS);
        for ((plane, staging), label) in planes.iter().zip(&mut self.staging).zip(PLANE_LABELS) {
            plane.copy_into(staging);
            inputs.push(GpuTexture::from_plane(device, queue, staging, w, h, label));
        }
        let output = GpuTexture::create_storage(device, w, h, "merge_out");

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("merge_bg"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&inputs[0].view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&inputs[1].view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&inputs[2].view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(&output.view),
                },
            ],
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("merge_encoder"),
        });

        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("merge_pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.dispatch_workgroups(w.div_ceil(WORKGROUP_SIZE), h.div_ceil(WORKGROUP_SIZE), 1);
        }

        queue.submit(std::iter::once(encoder.finish()));

        output.download_rgb(device, queue, &mut self.output.data)?;
        self.output.width = width;
        self.output.height = height;
        self.output.channels = CHANNELS;
        self.invoked = true;

        Ok(self.output.view())
    }

    fn last_output(&self) -> Option<OutputView<'_>> {
        self.invoked.then(|| self.output.view())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use channelbench_core::{PixelGrid, split_channels};

    fn gpu_merge() -> GpuChannelMerge {
        let ctx = GpuContext::new_blocking().expect("GPU adapter required for this test");
        GpuChannelMerge::new(ctx)
    }

    fn limits(max_dim: u32, max_buffer_size: u64) -> wgpu::Limits {
        wgpu::Limits {
            max_texture_dimension_2d: max_dim,
            max_buffer_size,
            ..wgpu::Limits::downlevel_defaults()
        }
    }

    #[test]
    fn image_within_limits_is_accepted() {
        let limits = limits(8192, 256 << 20);
        assert!(check_device_limits(3840, 1920, &limits).is_ok());
        assert!(check_device_limits(8192, 1, &limits).is_ok());
    }

    #[test]
    fn oversized_dimension_is_rejected() {
        let limits = limits(4096, u64::MAX);
        let err = check_device_limits(4097, 16, &limits).unwrap_err();
        assert!(err.to_string().contains("texture limit"), "{err}");
    }

    #[test]
    fn readback_over_buffer_limit_is_rejected() {
        // 16384x8192 fits the texture limit but its readback is 512 MiB.
        let limits = limits(16384, 256 << 20);
        let err = check_device_limits(16384, 8192, &limits).unwrap_err();
        assert!(err.to_string().contains("readback buffer"), "{err}");
        assert!(check_device_limits(16384, 4096, &limits).is_ok());
    }

    #[test]
    #[ignore = "needs a GPU adapter"]
    fn gpu_merge_reproduces_source() {
        let mut merge = gpu_merge();
        // Odd width so rows need padding on readback.
        let (h, w) = (5, 37);
        let data: Vec<u8> = (0..h * w * 3).map(|i| (i * 13 % 256) as u8).collect();
        let grid = PixelGrid::from_shape_vec(vec![h, w, 3], data.clone()).unwrap();

        let view = merge.invoke(&split_channels(&grid).unwrap()).unwrap();
        assert_eq!((view.width, view.height, view.channels), (w, h, 3));
        assert_eq!(view.data, data.as_slice());
    }

    #[test]
    #[ignore = "needs a GPU adapter"]
    fn empty_image_is_rejected() {
        let mut merge = gpu_merge();
        let grid = PixelGrid::filled(vec![0, 4, 3], 0).unwrap();
        assert!(merge.invoke(&split_channels(&grid).unwrap()).is_err());
        assert!(merge.last_output().is_none());
    }
}
