//! GPU rendering subsystem.
//!
//! Two independent pipelines, each owning its own bind group layouts and
//! buffers:
//! - [`QuadPipeline`]: one textured unit quad, X scaled by `cos(angle)`
//! - [`DotPipeline`]: N instanced soft circles that jitter with the frame counter
//!
//! [`FrameDriver`] sequences them (quad, then dots) for one frame.
//!
//! Convention: geometry is in normalized device coordinates; the static quad
//! tables cover the unit square `[0, 1] × [0, 1]`.

mod canvas;
mod ctx;
mod driver;
mod instance;
mod pipelines;
pub mod shading;
mod texture;
mod uniform;

pub use canvas::{DotCanvas, CANVAS_FORMAT, DEFAULT_CANVAS_SIZE};
pub use ctx::{RenderCtx, RenderTarget};
pub use driver::FrameDriver;
pub use instance::{BatchVersion, DotBatch, DotInstance, InstanceBuffer};
pub use pipelines::{
    DotPipeline, QuadPipeline, Vertex2D, QUAD_VERTICES, UNIT_QUAD_INDICES, UNIT_QUAD_VERTICES,
};
pub use texture::{upload_texture, validate_quad_texture, SampledTexture, SamplerConfig, TextureInfo};
pub use uniform::{FrameUniform, RotationUniform, UniformBuffer};
