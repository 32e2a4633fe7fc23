use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};

use bytemuck::{Pod, Zeroable};

use crate::coords::{ColorRgba, Vec2};

// ── per-dot GPU record ────────────────────────────────────────────────────

/// Instance data layout (32 bytes):
///
///  offset  0  position  [f32; 2]   loc 1
///  offset  8  radius    f32        loc 2
///  offset 12  hardness  f32        loc 3  (expected in [0, 1])
///  offset 16  color     [f32; 4]   loc 4  (straight alpha)
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct DotInstance {
    pub position: [f32; 2],
    pub radius: f32,
    pub hardness: f32,
    pub color: [f32; 4],
}

impl DotInstance {
    const ATTRS: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        1 => Float32x2, // position
        2 => Float32,   // radius
        3 => Float32,   // hardness
        4 => Float32x4  // color
    ];

    /// Hardness outside `[0, 1]` is accepted as-is; the edge it produces is
    /// inverted or degenerate.
    #[inline]
    pub fn new(position: Vec2, radius: f32, hardness: f32, color: ColorRgba) -> Self {
        Self {
            position: position.to_array(),
            radius,
            hardness,
            color: color.to_array(),
        }
    }

    pub(crate) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<DotInstance>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRS,
        }
    }
}

// ── CPU-side batch ────────────────────────────────────────────────────────

static NEXT_BATCH_ID: AtomicU64 = AtomicU64::new(0);

/// Identifies one state of one [`DotBatch`].
///
/// Two batches never share an `id`, so a buffer synced from one batch is
/// never mistaken for being in sync with another.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct BatchVersion {
    pub id: u64,
    pub generation: u64,
}

/// Contiguous, index-addressed set of dots.
///
/// The index of a dot is also its jitter phase in the shader. Every mutation
/// bumps the generation so the GPU copy is re-uploaded only after a change.
#[derive(Debug)]
pub struct DotBatch {
    id: u64,
    generation: u64,
    dots: Vec<DotInstance>,
}

impl DotBatch {
    pub fn new() -> Self {
        Self::from_vec(Vec::new())
    }

    pub fn from_vec(dots: Vec<DotInstance>) -> Self {
        Self {
            id: NEXT_BATCH_ID.fetch_add(1, Ordering::Relaxed),
            generation: 0,
            dots,
        }
    }

    pub fn version(&self) -> BatchVersion {
        BatchVersion { id: self.id, generation: self.generation }
    }

    pub fn len(&self) -> usize {
        self.dots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dots.is_empty()
    }

    pub fn as_slice(&self) -> &[DotInstance] {
        &self.dots
    }

    pub fn get(&self, index: usize) -> Option<&DotInstance> {
        self.dots.get(index)
    }

    /// Appends a dot and returns its index.
    pub fn push(&mut self, dot: DotInstance) -> usize {
        self.dots.push(dot);
        self.touch();
        self.dots.len() - 1
    }

    pub fn extend<I: IntoIterator<Item = DotInstance>>(&mut self, dots: I) {
        let before = self.dots.len();
        self.dots.extend(dots);
        if self.dots.len() != before {
            self.touch();
        }
    }

    /// Replaces the dot at `index`. Returns the previous value, or `None`
    /// (and changes nothing) when out of range.
    pub fn set(&mut self, index: usize, dot: DotInstance) -> Option<DotInstance> {
        let slot = self.dots.get_mut(index)?;
        let old = std::mem::replace(slot, dot);
        self.touch();
        Some(old)
    }

    pub fn clear(&mut self) {
        if !self.dots.is_empty() {
            self.dots.clear();
            self.touch();
        }
    }

    fn touch(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }
}

impl Default for DotBatch {
    fn default() -> Self {
        Self::new()
    }
}

// ── GPU instance buffer ───────────────────────────────────────────────────

const MIN_INSTANCE_CAPACITY: usize = 64;

/// Growable vertex buffer of per-instance records.
///
/// Capacity grows to the next power of two and never shrinks, so steady
/// state frames only issue `write_buffer` and only when the data changed.
pub struct InstanceBuffer<T: Pod> {
    label: &'static str,
    buffer: Option<wgpu::Buffer>,
    capacity: usize,
    len: usize,
    synced: Option<BatchVersion>,
    _marker: PhantomData<T>,
}

impl<T: Pod> InstanceBuffer<T> {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            buffer: None,
            capacity: 0,
            len: 0,
            synced: None,
            _marker: PhantomData,
        }
    }

    /// Number of records currently uploaded.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Uploads `data` unless `version` is what was uploaded last.
    ///
    /// Returns `true` if an upload happened.
    pub fn sync(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        version: BatchVersion,
        data: &[T],
    ) -> bool {
        if self.synced == Some(version) {
            return false;
        }
        self.write(device, queue, data);
        self.synced = Some(version);
        true
    }

    /// The uploaded records, or `None` when there are none.
    pub fn slice(&self) -> Option<wgpu::BufferSlice<'_>> {
        if self.len == 0 {
            return None;
        }
        let bytes = (self.len * std::mem::size_of::<T>()) as u64;
        self.buffer.as_ref().map(|b| b.slice(..bytes))
    }

    fn write(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, data: &[T]) {
        self.len = data.len();
        if data.is_empty() {
            return;
        }

        if let Some(new_cap) = grown_capacity(self.capacity, data.len()) {
            log::debug!("{}: growing to {new_cap} instances", self.label);
            self.buffer = Some(device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(self.label),
                size: (new_cap * std::mem::size_of::<T>()) as u64,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }));
            self.capacity = new_cap;
        }

        if let Some(buffer) = self.buffer.as_ref() {
            queue.write_buffer(buffer, 0, bytemuck::cast_slice(data));
        }
    }
}

/// New capacity needed to hold `required` records, or `None` if `current`
/// already suffices.
fn grown_capacity(current: usize, required: usize) -> Option<usize> {
    if required <= current {
        return None;
    }
    Some(required.next_power_of_two().max(MIN_INSTANCE_CAPACITY))
}
