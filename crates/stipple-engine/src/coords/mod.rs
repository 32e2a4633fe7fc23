//! Small value types shared by the renderers and the application layer.
//!
//! Positions are in normalized device coordinates unless stated otherwise:
//! origin at the center, +X right, +Y up, visible range `[-1, 1]`.

mod color;
mod vec2;

pub use color::ColorRgba;
pub use vec2::Vec2;
