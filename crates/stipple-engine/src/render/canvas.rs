use anyhow::{ensure, Context, Result};

use crate::coords::ColorRgba;

use super::ctx::begin_color_pass;
use super::{DotBatch, DotPipeline, SampledTexture, SamplerConfig};

/// Color format of every [`DotCanvas`].
pub const CANVAS_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// Side length used by the demo.
pub const DEFAULT_CANVAS_SIZE: u32 = 1024;

/// Square offscreen target the dots are drawn into.
///
/// The canvas owns its own [`DotPipeline`] built for [`CANVAS_FORMAT`] and
/// exposes its texture through [`sampled`](Self::sampled), ready to be bound
/// to a [`QuadPipeline`](super::QuadPipeline).
pub struct DotCanvas {
    target: SampledTexture,
    dots: DotPipeline,
    clear: ColorRgba,
    size: u32,
}

impl DotCanvas {
    pub fn new(device: &wgpu::Device, size: u32, clear: ColorRgba) -> Result<Self> {
        ensure!(size > 0, "dot canvas size must be non-zero");
        let max = device.limits().max_texture_dimension_2d;
        ensure!(size <= max, "dot canvas size {size} exceeds the device limit of {max}");

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("stipple dot canvas"),
            size: wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: CANVAS_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });

        let target = SampledTexture::new(device, texture, SamplerConfig::default())
            .context("creating dot canvas texture")?;
        let dots = DotPipeline::new(device, CANVAS_FORMAT).context("creating dot canvas pipeline")?;

        log::debug!("dot canvas created ({size}x{size})");

        Ok(Self {
            target,
            dots,
            clear,
            size,
        })
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn sampled(&self) -> &SampledTexture {
        &self.target
    }

    /// Clears the canvas and draws `batch` into it.
    ///
    /// The clear always happens, so an empty batch leaves a blank canvas.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        frame: u32,
        batch: &DotBatch,
    ) {
        self.dots.prepare(device, queue, frame, batch);

        let mut rpass = begin_color_pass(
            encoder,
            self.target.view(),
            "stipple dot canvas pass",
            wgpu::LoadOp::Clear(self.clear.to_wgpu()),
        );
        self.dots.encode(&mut rpass);
    }
}
