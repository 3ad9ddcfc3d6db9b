//! wgpu texture integration for UI frame buffers

use crate::bridge::{FrameView, TextureUploader};
use crate::error::{GpuError, Result};

/// Format of every texture the bridge writes
pub const TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// Target for uploading UI frames to wgpu textures
pub struct WgpuTextureTarget {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    width: u32,
    height: u32,
}

impl WgpuTextureTarget {
    /// Create a new texture target with the given dimensions
    pub fn new(device: &wgpu::Device, width: u32, height: u32, label: Option<&str>) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label,
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TEXTURE_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_DST
                | wgpu::TextureUsages::COPY_SRC
                | wgpu::TextureUsages::RENDER_ATTACHMENT,
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

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Resize the texture target. Creates a new texture if dimensions changed.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        if self.width == width && self.height == height {
            return;
        }
        tracing::debug!(width, height, "recreating ui texture");
        *self = Self::new(device, width, height, Some("xenon_ui_texture"));
    }

    /// Pair the target with a queue for [`crate::TextureBridge::render`]
    pub fn uploader<'a>(&'a self, queue: &'a wgpu::Queue) -> QueueUpload<'a> {
        QueueUpload {
            target: self,
            queue,
        }
    }

    fn write(&self, queue: &wgpu::Queue, frame: &FrameView<'_>) -> Result<()> {
        frame.validate()?;
        if frame.width != self.width || frame.height != self.height {
            return Err(GpuError::DimensionMismatch {
                frame_width: frame.width,
                frame_height: frame.height,
                texture_width: self.width,
                texture_height: self.height,
            });
        }

        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &frame.data,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(frame.bytes_per_row()),
                rows_per_image: Some(self.height),
            },
            self.extent(),
        );
        Ok(())
    }

    /// Copy the texture into another texture of the same size
    ///
    /// Used when the XR layer owns its own render target, e.g. the color
    /// attachment of a composition layer.
    pub fn copy_to(&self, encoder: &mut wgpu::CommandEncoder, dst: &wgpu::Texture) -> Result<()> {
        if dst.width() != self.width || dst.height() != self.height {
            return Err(GpuError::DimensionMismatch {
                frame_width: self.width,
                frame_height: self.height,
                texture_width: dst.width(),
                texture_height: dst.height(),
            });
        }

        encoder.copy_texture_to_texture(
            self.texture.as_image_copy(),
            dst.as_image_copy(),
            self.extent(),
        );
        Ok(())
    }

    fn extent(&self) -> wgpu::Extent3d {
        wgpu::Extent3d {
            width: self.width,
            height: self.height,
            depth_or_array_layers: 1,
        }
    }

    /// Create a bind group layout for sampling this texture
    pub fn create_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("xenon_texture_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        })
    }

    /// Create a bind group for sampling this texture
    pub fn create_bind_group(
        &self,
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
    ) -> wgpu::BindGroup {
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("xenon_texture_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("xenon_texture_bind_group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&self.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        })
    }
}

/// A [`WgpuTextureTarget`] borrowed together with the queue that writes it
pub struct QueueUpload<'a> {
    target: &'a WgpuTextureTarget,
    queue: &'a wgpu::Queue,
}

impl TextureUploader for QueueUpload<'_> {
    fn upload(&mut self, frame: FrameView<'_>) -> Result<()> {
        self.target.write(self.queue, &frame)
    }
}

/// Request a device without a surface, for off-screen hosts and tools
pub async fn request_headless_device() -> Result<(wgpu::Device, wgpu::Queue)> {
    let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::LowPower,
            compatible_surface: None,
            force_fallback_adapter: false,
        })
        .await
        .ok_or(GpuError::AdapterNotFound)?;

    let (device, queue) = adapter
        .request_device(
            &wgpu::DeviceDescriptor {
                label: Some("xenon_device"),
                ..Default::default()
            },
            None,
        )
        .await?;
    Ok((device, queue))
}
