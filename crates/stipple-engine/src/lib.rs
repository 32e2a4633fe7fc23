//! Stipple engine crate.
//!
//! Owns the platform + GPU runtime pieces and the two render paths: a
//! textured quad driven by a rotation uniform, and a batch of instanced
//! soft-edged dots driven by a frame counter.

pub mod device;
pub mod window;
pub mod time;
pub mod core;

pub mod logging;
pub mod coords;
pub mod render;
