//! Shared GPU types and helpers used by both pipelines.

use anyhow::{ensure, Result};
use bytemuck::{Pod, Zeroable};

// ── blend ─────────────────────────────────────────────────────────────────

/// Straight-alpha "over" blending for the dot pipeline.
pub(super) fn straight_alpha_blend() -> wgpu::BlendState {
    wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::SrcAlpha,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
        alpha: wgpu::BlendComponent::OVER,
    }
}

// ── static geometry ───────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex2D {
    pub position: [f32; 2],
}

impl Vertex2D {
    const ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];

    pub(super) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex2D>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

const fn v(x: f32, y: f32) -> Vertex2D {
    Vertex2D { position: [x, y] }
}

/// Two triangles over the unit square, drawn non-indexed by the quad pipeline.
pub const QUAD_VERTICES: [Vertex2D; 6] = [
    v(0.0, 0.0),
    v(1.0, 0.0),
    v(1.0, 1.0),
    v(1.0, 1.0),
    v(0.0, 1.0),
    v(0.0, 0.0),
];

/// Corners of the unit square, the instanced base geometry for dots.
pub const UNIT_QUAD_VERTICES: [Vertex2D; 4] = [
    v(0.0, 0.0),
    v(1.0, 0.0),
    v(1.0, 1.0),
    v(0.0, 1.0),
];

pub const UNIT_QUAD_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

// ── layouts ───────────────────────────────────────────────────────────────

pub(super) fn uniform_entry(
    binding: u32,
    min_binding_size: Option<wgpu::BufferSize>,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::VERTEX,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size,
        },
        count: None,
    }
}

/// Refuses color targets the pipelines cannot render or blend into.
///
/// Only the formats' guaranteed capabilities are consulted, so a format that
/// passes here works on every adapter exposing `device_features`.
pub(super) fn validate_target_format(
    format: wgpu::TextureFormat,
    device_features: wgpu::Features,
) -> Result<()> {
    let caps = format.guaranteed_format_features(device_features);
    ensure!(
        caps.allowed_usages.contains(wgpu::TextureUsages::RENDER_ATTACHMENT),
        "{format:?} cannot be used as a color attachment"
    );
    ensure!(
        caps.flags.contains(wgpu::TextureFormatFeatureFlags::BLENDABLE),
        "{format:?} does not support blending"
    );
    Ok(())
}

// ── pipeline ──────────────────────────────────────────────────────────────

pub(super) struct PipelineDesc<'a> {
    pub label: &'a str,
    pub shader: &'a wgpu::ShaderModule,
    pub bind_group_layouts: &'a [&'a wgpu::BindGroupLayout],
    pub buffers: &'a [wgpu::VertexBufferLayout<'a>],
    pub format: wgpu::TextureFormat,
    pub blend: Option<wgpu::BlendState>,
}

/// Builds a triangle-list pipeline with `vs_main`/`fs_main` entry points and
/// a single color target.
pub(super) fn create_render_pipeline(
    device: &wgpu::Device,
    desc: PipelineDesc<'_>,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(desc.label),
        bind_group_layouts: desc.bind_group_layouts,
        immediate_size: 0,
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(desc.label),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: desc.shader,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: desc.buffers,
        },
        fragment: Some(wgpu::FragmentState {
            module: desc.shader,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: desc.format,
                blend: desc.blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    })
}
