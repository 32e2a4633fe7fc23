//! The two render pipelines.

mod common;

mod dot;
mod quad;

pub use common::{Vertex2D, QUAD_VERTICES, UNIT_QUAD_INDICES, UNIT_QUAD_VERTICES};
pub use dot::DotPipeline;
pub use quad::QuadPipeline;
