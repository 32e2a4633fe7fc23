use anyhow::{Context, Result};

use stipple_engine::render::{
    upload_texture, DotBatch, DotCanvas, FrameDriver, RenderCtx, RenderTarget, SampledTexture,
    SamplerConfig,
};

use crate::config::DemoConfig;

/// What the quad currently shows.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum QuadSource {
    Checkerboard,
    /// The dots, pre-rendered into the offscreen canvas.
    Canvas,
}

/// GPU state built once the surface format is known.
pub struct Scene {
    driver: FrameDriver,
    canvas: DotCanvas,
    checkerboard: SampledTexture,
    source: QuadSource,
    // Drawn on screen while the dots go to the canvas instead.
    no_dots: DotBatch,
}

impl Scene {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        format: wgpu::TextureFormat,
        config: &DemoConfig,
    ) -> Result<Self> {
        let mut driver = FrameDriver::new(device, format)?;
        let canvas = DotCanvas::new(device, config.canvas_size, config.canvas_clear)
            .context("creating dot canvas")?;

        let side = config.checker_cells * config.checker_cell_px;
        let pixels = checkerboard(config.checker_cells, config.checker_cell_px);
        let checkerboard = upload_texture(
            device,
            queue,
            &pixels,
            side,
            side,
            wgpu::TextureFormat::Rgba8UnormSrgb,
            SamplerConfig::nearest(),
        )
        .context("uploading checkerboard")?;

        driver.bind_texture(device, &checkerboard)?;

        Ok(Self {
            driver,
            canvas,
            checkerboard,
            source: QuadSource::Checkerboard,
            no_dots: DotBatch::new(),
        })
    }

    /// Switches the quad between the checkerboard and the dot canvas.
    pub fn toggle_source(&mut self, device: &wgpu::Device) -> Result<QuadSource> {
        let next = match self.source {
            QuadSource::Checkerboard => QuadSource::Canvas,
            QuadSource::Canvas => QuadSource::Checkerboard,
        };
        let texture = match next {
            QuadSource::Checkerboard => &self.checkerboard,
            QuadSource::Canvas => self.canvas.sampled(),
        };
        self.driver.bind_texture(device, texture)?;
        self.source = next;
        Ok(next)
    }

    pub fn draw(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        angle: f32,
        dots: &DotBatch,
    ) {
        match self.source {
            QuadSource::Checkerboard => self.driver.draw_frame(ctx, target, angle, dots),
            QuadSource::Canvas => {
                // Canvas pass first so the quad samples this frame's dots.
                let frame = self.driver.frame().wrapping_add(1);
                self.canvas.render(ctx.device, ctx.queue, target.encoder, frame, dots);
                self.driver.draw_frame(ctx, target, angle, &self.no_dots);
            }
        }
    }
}

/// Two-tone RGBA8 checkerboard, `cells` × `cells` squares of `cell_px` pixels.
fn checkerboard(cells: u32, cell_px: u32) -> Vec<u8> {
    const LIGHT: [u8; 4] = [230, 230, 230, 255];
    const DARK: [u8; 4] = [40, 40, 40, 255];

    let side = cells * cell_px;
    let mut pixels = Vec::with_capacity((side * side * 4) as usize);
    for y in 0..side {
        for x in 0..side {
            let light = (x / cell_px + y / cell_px) % 2 == 0;
            pixels.extend_from_slice(if light { &LIGHT } else { &DARK });
        }
    }
    pixels
}
