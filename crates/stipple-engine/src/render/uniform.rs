use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

/// Quad rotation angle in radians, padded to 16 bytes.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct RotationUniform {
    pub angle: f32,
    pub _pad: [f32; 3],
}

impl RotationUniform {
    #[inline]
    pub const fn new(angle: f32) -> Self {
        Self { angle, _pad: [0.0; 3] }
    }
}

/// Animation frame counter, padded to 16 bytes.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct FrameUniform {
    pub frame: u32,
    pub _pad: [u32; 3],
}

impl FrameUniform {
    #[inline]
    pub const fn new(frame: u32) -> Self {
        Self { frame, _pad: [0; 3] }
    }
}

/// A uniform buffer holding exactly one `T`.
///
/// Keeps a CPU copy of the last written value. Writes go through
/// `Queue::write_buffer`, so they are ordered before any command buffer
/// submitted afterwards.
pub struct UniformBuffer<T: Pod> {
    buffer: wgpu::Buffer,
    value: T,
}

impl<T: Pod> UniformBuffer<T> {
    pub fn new(device: &wgpu::Device, label: &str, value: T) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::bytes_of(&value),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        Self { buffer, value }
    }

    /// Stores `value` and schedules its upload.
    pub fn write(&mut self, queue: &wgpu::Queue, value: T) {
        self.value = value;
        queue.write_buffer(&self.buffer, 0, bytemuck::bytes_of(&self.value));
    }

    /// The last written value.
    pub fn get(&self) -> T {
        self.value
    }

    pub fn binding(&self) -> wgpu::BindingResource<'_> {
        self.buffer.as_entire_binding()
    }

    /// `min_binding_size` for a layout entry that binds this buffer.
    pub fn min_binding_size() -> Option<wgpu::BufferSize> {
        wgpu::BufferSize::new(std::mem::size_of::<T>() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniforms_are_sixteen_bytes() {
        assert_eq!(std::mem::size_of::<RotationUniform>(), 16);
        assert_eq!(std::mem::size_of::<FrameUniform>(), 16);
    }

    #[test]
    fn frame_is_first_word() {
        let u = FrameUniform::new(0x0102_0304);
        let bytes = bytemuck::bytes_of(&u);
        assert_eq!(&bytes[..4], &0x0102_0304u32.to_ne_bytes());
        assert!(bytes[4..].iter().all(|b| *b == 0));
    }

    #[test]
    fn angle_is_first_word() {
        let u = RotationUniform::new(1.5);
        let words: &[f32] = bytemuck::cast_slice(bytemuck::bytes_of(&u));
        assert_eq!(words, &[1.5, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn min_binding_size_matches_struct() {
        assert_eq!(UniformBuffer::<FrameUniform>::min_binding_size().map(|s| s.get()), Some(16));
    }
}
