//! CPU mirror of the shader math in `pipelines/shaders/*.wgsl`.
//!
//! Every function here computes exactly what the matching shader line
//! computes, in `f32`. They exist so the rendering contract can be checked
//! without a GPU and so application code can reason about where a dot lands.

use crate::coords::Vec2;

use super::DotInstance;

/// Frames per radian of jitter phase.
pub const JITTER_PERIOD: f32 = 10.0;
/// Peak jitter offset in NDC, applied to X and Y alike.
pub const JITTER_AMPLITUDE: f32 = 0.01;
/// Offset subtracted from the base vertex to form the fragment-local coordinate.
pub const LOCAL_BIAS: f32 = 0.25;
/// Squared-distance value at which a dot is fully transparent.
pub const OUTER_EDGE: f32 = 0.5;

/// WGSL `smoothstep`: cubic Hermite between `edge0` and `edge1`.
///
/// `edge0 >= edge1` is undefined in WGSL. Equal edges act as a step at
/// `edge1`; reversed edges give a reversed ramp.
#[inline]
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let width = edge1 - edge0;
    if width == 0.0 {
        return if x >= edge1 { 1.0 } else { 0.0 };
    }
    let t = ((x - edge0) / width).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

// ── quad ──────────────────────────────────────────────────────────────────

/// Quad vertex stage: X scaled by `cos(angle)`, Y unchanged.
#[inline]
pub fn quad_vertex_position(vertex: Vec2, angle: f32) -> Vec2 {
    Vec2::new(vertex.x * angle.cos(), vertex.y)
}

/// Texture coordinate of a quad vertex (the unscaled unit-square position).
#[inline]
pub fn quad_uv(vertex: Vec2) -> Vec2 {
    vertex
}

// ── dots ──────────────────────────────────────────────────────────────────

/// Offset added to both axes of instance `instance_index` at `frame`.
///
/// The counter sum wraps like WGSL `u32` addition.
#[inline]
pub fn dot_jitter(frame: u32, instance_index: u32) -> f32 {
    (frame.wrapping_add(instance_index) as f32 / JITTER_PERIOD).sin() * JITTER_AMPLITUDE
}

/// Dot vertex stage: clip-space XY of one base-quad corner.
#[inline]
pub fn dot_vertex_position(vertex: Vec2, dot: &DotInstance, frame: u32, instance_index: u32) -> Vec2 {
    (vertex - Vec2::splat(0.5)) * dot.radius
        + Vec2::from(dot.position)
        + Vec2::splat(dot_jitter(frame, instance_index))
}

/// Fragment-local coordinate the vertex stage emits for a base-quad point.
#[inline]
pub fn dot_local(vertex: Vec2) -> Vec2 {
    vertex - Vec2::splat(LOCAL_BIAS)
}

/// Scaled squared distance: `dot(a, a) * 2` with `a = local - 0.25`.
///
/// Not Euclidean; it reaches `0.5` at the quad's edge midpoints.
#[inline]
pub fn dot_distance(local: Vec2) -> f32 {
    let a = local - Vec2::splat(LOCAL_BIAS);
    a.dot(a) * 2.0
}

/// Coverage mask: `1 - smoothstep(hardness / 2, 0.5, distance)`.
#[inline]
pub fn circle_mask(distance: f32, hardness: f32) -> f32 {
    1.0 - smoothstep(hardness / 2.0, OUTER_EDGE, distance)
}

/// Final fragment color at fragment-local coordinate `local`.
#[inline]
pub fn dot_fragment_color(local: Vec2, dot: &DotInstance) -> [f32; 4] {
    let mask = circle_mask(dot_distance(local), dot.hardness);
    let [r, g, b, a] = dot.color;
    [r, g, b, a * mask]
}
