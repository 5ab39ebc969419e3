use anyhow::{Result, anyhow, ensure};

/// Bytes per row of an RGBA8 readback, padded to wgpu's copy alignment.
pub fn padded_bytes_per_row(width: u32) -> u64 {
    let align = u64::from(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT);
    (u64::from(width) * 4).div_ceil(align) * align
}

/// Size of the staging buffer needed to read back a `width`x`height` RGBA8 texture.
pub fn readback_buffer_size(width: u32, height: u32) -> u64 {
    padded_bytes_per_row(width) * u64::from(height)
}

/// A 2-D GPU texture plus its default view.
pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub width: u32,
    pub height: u32,
}

impl GpuTexture {
    /// Upload one channel plane (row-major u8) as an R8Unorm texture.
    pub fn from_plane(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        samples: &[u8],
        width: u32,
        height: u32,
        label: &str,
    ) -> Self {
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::R8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            samples,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            texture,
            view,
            width,
            height,
        }
    }

    /// Create an empty RGBA8 texture for use as a compute shader output.
    pub fn create_storage(device: &wgpu::Device, width: u32, height: u32, label: &str) -> Self {
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::STORAGE_BINDING | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            texture,
            view,
            width,
            height,
        }
    }

    /// Read an RGBA8 texture back to the CPU as interleaved RGB (blocking).
    ///
    /// `out` is cleared and refilled; alpha is dropped.
    pub fn download_rgb(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        out: &mut Vec<u8>,
    ) -> Result<()> {
        let bytes_per_row_unpadded = self.width as usize * 4;
        let bytes_per_row_padded = u32::try_from(padded_bytes_per_row(self.width))?;

        let buffer_size = readback_buffer_size(self.width, self.height);
        let max_buffer_size = device.limits().max_buffer_size;
        ensure!(
            buffer_size <= max_buffer_size,
            "readback of {}x{} needs {buffer_size} bytes, device allows {max_buffer_size}",
            self.width,
            self.height
        );
        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("texture_download_staging"),
            size: buffer_size,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("texture_download"),
        });

        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &staging,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(bytes_per_row_padded),
                    rows_per_image: Some(self.height),
                },
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );

        queue.submit(std::iter::once(encoder.finish()));

        let (sender, receiver) = std::sync::mpsc::channel();
        staging
            .slice(..)
            .map_async(wgpu::MapMode::Read, move |result| {
                let _ = sender.send(result);
            });
        device
            .poll(wgpu::PollType::Wait {
                submission_index: None,
                timeout: None,
            })
            .map_err(|e| anyhow!("GPU poll error: {e}"))?;
        receiver
            .recv()
            .map_err(|_| anyhow!("buffer map cancelled"))??;

        let mapped = staging.slice(..).get_mapped_range();
        out.clear();
        out.reserve(self.width as usize * self.height as usize * 3);

        for row in mapped.chunks_exact(bytes_per_row_padded as usize) {
            for pixel in row[..bytes_per_row_unpadded].chunks_exact(4) {
                out.extend_from_slice(&pixel[..3]);
            }
        }

        drop(mapped);
        staging.unmap();

        Ok(())
    }
}
