use anyhow::{Context, Result};

use super::{DotBatch, DotPipeline, QuadPipeline, RenderCtx, RenderTarget, SampledTexture};

/// Sequences one frame: advance the counter, update uniforms, draw the quad,
/// then the dots on top of it.
///
/// Surface acquisition and presentation stay with the caller.
pub struct FrameDriver {
    frame: u32,
    quad: QuadPipeline,
    dots: DotPipeline,
}

impl FrameDriver {
    pub fn new(device: &wgpu::Device, target_format: wgpu::TextureFormat) -> Result<Self> {
        let quad = QuadPipeline::new(device, target_format).context("creating quad pipeline")?;
        let dots = DotPipeline::new(device, target_format).context("creating dot pipeline")?;
        log::info!("frame driver ready for {target_format:?}");
        Ok(Self { frame: 0, quad, dots })
    }

    /// Frame counter used by the most recent [`draw_frame`](Self::draw_frame).
    ///
    /// Zero before the first frame; the first frame drawn is frame 1.
    pub fn frame(&self) -> u32 {
        self.frame
    }

    pub fn bind_texture(&mut self, device: &wgpu::Device, texture: &SampledTexture) -> Result<()> {
        self.quad.bind_texture(device, texture)
    }

    pub fn quad(&self) -> &QuadPipeline {
        &self.quad
    }

    pub fn dots(&self) -> &DotPipeline {
        &self.dots
    }

    /// Draws one frame over the current contents of `target`.
    ///
    /// Uniform and instance writes go through the queue, so both draws see
    /// this frame's values once `target`'s encoder is submitted.
    pub fn draw_frame(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        angle: f32,
        batch: &DotBatch,
    ) {
        self.frame = self.frame.wrapping_add(1);
        self.quad.set_angle(ctx.queue, angle);

        self.quad.render(ctx, target);
        self.dots.render(ctx, target, self.frame, batch);
    }
}
