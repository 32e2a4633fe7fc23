use anyhow::{Context, Result};
use wgpu::util::DeviceExt;

use crate::render::{
    validate_quad_texture, RenderCtx, RenderTarget, RotationUniform, SampledTexture, UniformBuffer,
};

use super::common::{
    create_render_pipeline, uniform_entry, validate_target_format, PipelineDesc, Vertex2D,
    QUAD_VERTICES,
};

/// Draws one textured unit quad whose X axis is scaled by `cos(angle)`.
///
/// Bindings:
/// - group 0, binding 0: [`RotationUniform`] (vertex)
/// - group 1, binding 0: filterable float 2D texture (fragment)
/// - group 1, binding 1: filtering sampler (fragment)
///
/// The fragment stage writes the sampled texel unmodified and the color
/// target has no blending, so the quad replaces whatever is under it.
pub struct QuadPipeline {
    format: wgpu::TextureFormat,
    pipeline: wgpu::RenderPipeline,

    rotation: UniformBuffer<RotationUniform>,
    rotation_bind_group: wgpu::BindGroup,

    texture_layout: wgpu::BindGroupLayout,
    texture_bind_group: Option<wgpu::BindGroup>,

    vbo: wgpu::Buffer,

    warned_no_texture: bool,
}

impl QuadPipeline {
    /// Builds the pipeline for `target_format`.
    ///
    /// Fails if the format cannot be rendered to.
    pub fn new(device: &wgpu::Device, target_format: wgpu::TextureFormat) -> Result<Self> {
        validate_target_format(target_format, device.features())
            .context("quad pipeline target format")?;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("stipple quad shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/quad.wgsl").into()),
        });

        let rotation_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("stipple quad rotation bgl"),
            entries: &[uniform_entry(0, UniformBuffer::<RotationUniform>::min_binding_size())],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("stipple quad texture bgl"),
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
        });

        let pipeline = create_render_pipeline(
            device,
            PipelineDesc {
                label: "stipple quad pipeline",
                shader: &shader,
                bind_group_layouts: &[&rotation_layout, &texture_layout],
                buffers: &[Vertex2D::layout()],
                format: target_format,
                blend: None,
            },
        );

        let rotation = UniformBuffer::new(device, "stipple quad rotation", RotationUniform::new(0.0));
        let rotation_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("stipple quad rotation bg"),
            layout: &rotation_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: rotation.binding(),
            }],
        });

        let vbo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("stipple quad vbo"),
            contents: bytemuck::cast_slice(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });

        log::debug!("quad pipeline created for {target_format:?}");

        Ok(Self {
            format: target_format,
            pipeline,
            rotation,
            rotation_bind_group,
            texture_layout,
            texture_bind_group: None,
            vbo,
            warned_no_texture: false,
        })
    }

    pub fn target_format(&self) -> wgpu::TextureFormat {
        self.format
    }

    /// Last angle written with [`set_angle`](Self::set_angle), in radians.
    pub fn angle(&self) -> f32 {
        self.rotation.get().angle
    }

    pub fn set_angle(&mut self, queue: &wgpu::Queue, angle: f32) {
        self.rotation.write(queue, RotationUniform::new(angle));
    }

    /// Binds `texture` for subsequent draws, replacing any previous one.
    ///
    /// On error the previous binding is kept.
    pub fn bind_texture(&mut self, device: &wgpu::Device, texture: &SampledTexture) -> Result<()> {
        validate_quad_texture(&texture.info(), device.features())
            .context("texture is not compatible with the quad pipeline")?;

        self.texture_bind_group = Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("stipple quad texture bg"),
            layout: &self.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(texture.view()),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(texture.sampler()),
                },
            ],
        }));
        self.warned_no_texture = false;
        Ok(())
    }

    pub fn has_texture(&self) -> bool {
        self.texture_bind_group.is_some()
    }

    /// Records the quad draw into an open pass.
    ///
    /// Returns `false` and records nothing when no texture is bound.
    pub fn encode(&self, rpass: &mut wgpu::RenderPass<'_>) -> bool {
        let Some(texture_bind_group) = self.texture_bind_group.as_ref() else {
            return false;
        };

        rpass.set_pipeline(&self.pipeline);
        rpass.set_bind_group(0, &self.rotation_bind_group, &[]);
        rpass.set_bind_group(1, texture_bind_group, &[]);
        rpass.set_vertex_buffer(0, self.vbo.slice(..));
        rpass.draw(0..QUAD_VERTICES.len() as u32, 0..1);
        true
    }

    /// Draws the quad over the current contents of `target`.
    pub fn render(&mut self, ctx: &RenderCtx<'_>, target: &mut RenderTarget<'_>) {
        if ctx.target_format != self.format {
            log::warn!(
                "quad pipeline built for {:?}, target is {:?}; skipping draw",
                self.format,
                ctx.target_format
            );
            return;
        }
        if !self.has_texture() {
            if !self.warned_no_texture {
                log::warn!("quad pipeline has no texture bound; skipping draw");
                self.warned_no_texture = true;
            }
            return;
        }

        let mut rpass = target.begin_load_pass("stipple quad pass");
        self.encode(&mut rpass);
    }
}
