use anyhow::{Context, Result};
use wgpu::util::DeviceExt;

use crate::render::{DotBatch, DotInstance, FrameUniform, InstanceBuffer, RenderCtx, RenderTarget, UniformBuffer};

use super::common::{
    create_render_pipeline, straight_alpha_blend, uniform_entry, validate_target_format,
    PipelineDesc, Vertex2D, UNIT_QUAD_INDICES, UNIT_QUAD_VERTICES,
};

/// Draws a [`DotBatch`] as instanced soft circles in a single call.
///
/// Vertex buffers:
///  slot 0  unit quad corner   loc 0       per vertex
///  slot 1  [`DotInstance`]    loc 1..=4   per instance
///
/// Bindings:
/// - group 0, binding 0: [`FrameUniform`] (vertex)
///
/// The instance index doubles as the jitter phase, so reordering a batch
/// changes how its dots wobble but not where they rest.
pub struct DotPipeline {
    format: wgpu::TextureFormat,
    pipeline: wgpu::RenderPipeline,

    frame: UniformBuffer<FrameUniform>,
    frame_bind_group: wgpu::BindGroup,

    quad_vbo: wgpu::Buffer,
    quad_ibo: wgpu::Buffer,

    instances: InstanceBuffer<DotInstance>,
}

impl DotPipeline {
    pub fn new(device: &wgpu::Device, target_format: wgpu::TextureFormat) -> Result<Self> {
        validate_target_format(target_format, device.features())
            .context("dot pipeline target format")?;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("stipple dot shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/dot.wgsl").into()),
        });

        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("stipple dot frame bgl"),
            entries: &[uniform_entry(0, UniformBuffer::<FrameUniform>::min_binding_size())],
        });

        let pipeline = create_render_pipeline(
            device,
            PipelineDesc {
                label: "stipple dot pipeline",
                shader: &shader,
                bind_group_layouts: &[&frame_layout],
                buffers: &[Vertex2D::layout(), DotInstance::layout()],
                format: target_format,
                blend: Some(straight_alpha_blend()),
            },
        );

        let frame = UniformBuffer::new(device, "stipple dot frame", FrameUniform::new(0));
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("stipple dot frame bg"),
            layout: &frame_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame.binding(),
            }],
        });

        let quad_vbo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("stipple dot quad vbo"),
            contents: bytemuck::cast_slice(&UNIT_QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let quad_ibo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("stipple dot quad ibo"),
            contents: bytemuck::cast_slice(&UNIT_QUAD_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        });

        log::debug!("dot pipeline created for {target_format:?}");

        Ok(Self {
            format: target_format,
            pipeline,
            frame,
            frame_bind_group,
            quad_vbo,
            quad_ibo,
            instances: InstanceBuffer::new("stipple dot instances"),
        })
    }

    pub fn target_format(&self) -> wgpu::TextureFormat {
        self.format
    }

    /// Frame counter last written to the uniform.
    pub fn frame(&self) -> u32 {
        self.frame.get().frame
    }

    /// Number of instances the next [`encode`](Self::encode) will draw.
    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    /// Writes the frame uniform and uploads `batch` if it changed since the
    /// last upload.
    pub fn prepare(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        frame: u32,
        batch: &DotBatch,
    ) {
        self.frame.write(queue, FrameUniform::new(frame));
        self.instances.sync(device, queue, batch.version(), batch.as_slice());
    }

    /// Records the instanced draw into an open pass.
    ///
    /// Returns `false` and records nothing when there are no instances.
    pub fn encode(&self, rpass: &mut wgpu::RenderPass<'_>) -> bool {
        let Some(instances) = self.instances.slice() else {
            return false;
        };

        rpass.set_pipeline(&self.pipeline);
        rpass.set_bind_group(0, &self.frame_bind_group, &[]);
        rpass.set_vertex_buffer(0, self.quad_vbo.slice(..));
        rpass.set_vertex_buffer(1, instances);
        rpass.set_index_buffer(self.quad_ibo.slice(..), wgpu::IndexFormat::Uint16);
        rpass.draw_indexed(
            0..UNIT_QUAD_INDICES.len() as u32,
            0,
            0..self.instances.len() as u32,
        );
        true
    }

    /// Draws `batch` over the current contents of `target`.
    ///
    /// An empty batch opens no pass.
    pub fn render(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        frame: u32,
        batch: &DotBatch,
    ) {
        if ctx.target_format != self.format {
            log::warn!(
                "dot pipeline built for {:?}, target is {:?}; skipping draw",
                self.format,
                ctx.target_format
            );
            return;
        }

        self.prepare(ctx.device, ctx.queue, frame, batch);
        if self.instances.is_empty() {
            return;
        }

        let mut rpass = target.begin_load_pass("stipple dot pass");
        self.encode(&mut rpass);
    }
}
