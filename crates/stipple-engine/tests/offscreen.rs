//! Renders into offscreen targets and reads the pixels back.
//!
//! Every test skips (passes without asserting) when no adapter is available.

use std::f32::consts::PI;

use stipple_engine::coords::{ColorRgba, Vec2};
use stipple_engine::device::{GpuInit, HeadlessGpu};
use stipple_engine::render::shading::dot_jitter;
use stipple_engine::render::{
    upload_texture, DotBatch, DotCanvas, DotInstance, DotPipeline, FrameDriver, QuadPipeline,
    RenderCtx, RenderTarget, SamplerConfig,
};

const SIZE: u32 = 64;
const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

const RED: [u8; 4] = [255, 0, 0, 255];
const WHITE: [u8; 4] = [255, 255, 255, 255];
const BLUE: [u8; 4] = [0, 0, 255, 255];
const CLEAR: [u8; 4] = [0, 0, 0, 0];

fn gpu() -> Option<HeadlessGpu> {
    match pollster::block_on(HeadlessGpu::new(&GpuInit::default())) {
        Ok(gpu) => Some(gpu),
        Err(err) => {
            eprintln!("skipping GPU test: {err:#}");
            None
        }
    }
}

struct Target {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl Target {
    fn new(device: &wgpu::Device) -> Self {
        Self::with_size(device, SIZE)
    }

    fn with_size(device: &wgpu::Device, size: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("test target"),
            size: wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }
}

fn clear_pass(encoder: &mut wgpu::CommandEncoder, view: &wgpu::TextureView, color: wgpu::Color) {
    let _ = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("test clear"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(color),
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
        multiview_mask: None,
    });
}

/// Submits `encoder` after appending a copy of `texture` and returns its
/// tightly packed RGBA8 rows.
fn submit_and_read(
    gpu: &HeadlessGpu,
    mut encoder: wgpu::CommandEncoder,
    texture: &wgpu::Texture,
) -> Vec<u8> {
    let (w, h) = (texture.width(), texture.height());
    // Row pitch must be a multiple of 256; test targets are sized so it is.
    let bytes_per_row = w * 4;
    assert_eq!(bytes_per_row % wgpu::COPY_BYTES_PER_ROW_ALIGNMENT, 0);

    let readback = gpu.device().create_buffer(&wgpu::BufferDescriptor {
        label: Some("test readback"),
        size: (bytes_per_row * h) as u64,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &readback,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(h),
            },
        },
        wgpu::Extent3d {
            width: w,
            height: h,
            depth_or_array_layers: 1,
        },
    );
    gpu.queue().submit(Some(encoder.finish()));

    let slice = readback.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |res| {
        let _ = tx.send(res);
    });
    gpu.device()
        .poll(wgpu::PollType::wait_indefinitely())
        .expect("device poll");
    rx.recv().expect("map callback").expect("map readback");

    let bytes = slice.get_mapped_range().to_vec();
    readback.unmap();
    bytes
}

fn pixel(bytes: &[u8], width: u32, x: u32, y: u32) -> [u8; 4] {
    let i = ((y * width + x) * 4) as usize;
    [bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]
}

fn encoder(gpu: &HeadlessGpu) -> wgpu::CommandEncoder {
    gpu.device()
        .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("test encoder") })
}

fn red_dot(radius: f32) -> DotInstance {
    DotInstance::new(Vec2::zero(), radius, 0.0, ColorRgba::new(1.0, 0.0, 0.0, 1.0))
}

fn white_texture(gpu: &HeadlessGpu) -> stipple_engine::render::SampledTexture {
    upload_texture(
        gpu.device(),
        gpu.queue(),
        &WHITE,
        1,
        1,
        wgpu::TextureFormat::Rgba8Unorm,
        SamplerConfig::default(),
    )
    .expect("upload 1x1 texture")
}

// ── dots ──────────────────────────────────────────────────────────────────

#[test]
fn full_screen_dot_is_opaque_at_center_and_clear_at_corners() {
    let Some(gpu) = gpu() else { return };
    let target = Target::new(gpu.device());
    let mut dots = DotPipeline::new(gpu.device(), FORMAT).expect("dot pipeline");
    let batch = DotBatch::from_vec(vec![red_dot(2.0)]);

    let mut enc = encoder(&gpu);
    clear_pass(&mut enc, &target.view, wgpu::Color::TRANSPARENT);
    {
        let ctx = RenderCtx::new(gpu.device(), gpu.queue(), FORMAT);
        let mut rt = RenderTarget::new(&mut enc, &target.view);
        dots.render(&ctx, &mut rt, 0, &batch);
    }
    assert_eq!(dots.instance_count(), 1);
    assert_eq!(dots.frame(), 0);

    let px = submit_and_read(&gpu, enc, &target.texture);
    assert_eq!(pixel(&px, SIZE, SIZE / 2, SIZE / 2), RED);
    for (x, y) in [(0, 0), (SIZE - 1, 0), (0, SIZE - 1), (SIZE - 1, SIZE - 1)] {
        assert_eq!(pixel(&px, SIZE, x, y), CLEAR, "corner ({x}, {y})");
    }
}

#[test]
fn empty_batch_leaves_target_untouched() {
    let Some(gpu) = gpu() else { return };
    let target = Target::new(gpu.device());
    let mut dots = DotPipeline::new(gpu.device(), FORMAT).expect("dot pipeline");

    let mut enc = encoder(&gpu);
    clear_pass(&mut enc, &target.view, wgpu::Color::BLUE);
    {
        let ctx = RenderCtx::new(gpu.device(), gpu.queue(), FORMAT);
        let mut rt = RenderTarget::new(&mut enc, &target.view);
        dots.render(&ctx, &mut rt, 7, &DotBatch::new());
    }
    assert_eq!(dots.instance_count(), 0);

    let px = submit_and_read(&gpu, enc, &target.texture);
    assert!(px.chunks_exact(4).all(|p| p == BLUE));
}

/// Alpha-weighted centroid, in pixels, of columns `x0..x1` of a square image.
fn alpha_centroid(bytes: &[u8], size: u32, x0: u32, x1: u32) -> (f64, f64) {
    let (mut sum, mut sx, mut sy) = (0.0f64, 0.0f64, 0.0f64);
    for y in 0..size {
        for x in x0..x1 {
            let a = pixel(bytes, size, x, y)[3] as f64;
            sum += a;
            sx += a * (x as f64 + 0.5);
            sy += a * (y as f64 + 0.5);
        }
    }
    assert!(sum > 0.0, "no coverage in columns {x0}..{x1}");
    (sx / sum, sy / sum)
}

#[test]
fn jitter_phase_follows_instance_index() {
    let Some(gpu) = gpu() else { return };
    // Large enough that the phase difference between two neighbouring
    // indices is a measurable fraction of a pixel.
    const BIG: u32 = 512;
    let target = Target::with_size(gpu.device(), BIG);
    let mut dots = DotPipeline::new(gpu.device(), FORMAT).expect("dot pipeline");

    // Same dot twice, half a screen apart; the left half and right half of
    // the target each hold exactly one.
    let white = ColorRgba::new(1.0, 1.0, 1.0, 1.0);
    let batch = DotBatch::from_vec(vec![
        DotInstance::new(Vec2::new(-0.5, 0.0), 0.9, 0.0, white),
        DotInstance::new(Vec2::new(0.5, 0.0), 0.9, 0.0, white),
    ]);

    // Frame 0: sin(0 / 10) = 0 for index 0, sin(1 / 10) for index 1.
    let frame = 0;
    let mut enc = encoder(&gpu);
    clear_pass(&mut enc, &target.view, wgpu::Color::TRANSPARENT);
    {
        let ctx = RenderCtx::new(gpu.device(), gpu.queue(), FORMAT);
        let mut rt = RenderTarget::new(&mut enc, &target.view);
        dots.render(&ctx, &mut rt, frame, &batch);
    }
    let px = submit_and_read(&gpu, enc, &target.texture);

    let half = BIG / 2;
    let (lx, ly) = alpha_centroid(&px, BIG, 0, half);
    let (rx, ry) = alpha_centroid(&px, BIG, half, BIG);

    // Without jitter the right dot is the left one moved by exactly `half`.
    let px_per_ndc = half as f64;
    let expected = (dot_jitter(frame, 1) - dot_jitter(frame, 0)) as f64 * px_per_ndc;
    assert!(expected > 0.2, "test setup: expected shift {expected}");

    let dx = rx - lx - half as f64;
    // NDC y points up, pixel rows go down.
    let dy = ly - ry;
    assert!((dx - expected).abs() < 0.05, "x shift {dx}, expected {expected}");
    assert!((dy - expected).abs() < 0.05, "y shift {dy}, expected {expected}");
}

#[test]
fn dot_pipeline_rejects_depth_target() {
    let Some(gpu) = gpu() else { return };
    assert!(DotPipeline::new(gpu.device(), wgpu::TextureFormat::Depth32Float).is_err());
}

// ── quad ──────────────────────────────────────────────────────────────────

fn render_quad(gpu: &HeadlessGpu, angle: f32) -> Vec<u8> {
    let target = Target::new(gpu.device());
    let mut quad = QuadPipeline::new(gpu.device(), FORMAT).expect("quad pipeline");
    let texture = white_texture(gpu);
    quad.bind_texture(gpu.device(), &texture).expect("bind texture");
    quad.set_angle(gpu.queue(), angle);
    assert_eq!(quad.angle(), angle);

    let mut enc = encoder(gpu);
    clear_pass(&mut enc, &target.view, wgpu::Color::TRANSPARENT);
    {
        let ctx = RenderCtx::new(gpu.device(), gpu.queue(), FORMAT);
        let mut rt = RenderTarget::new(&mut enc, &target.view);
        quad.render(&ctx, &mut rt);
    }
    submit_and_read(gpu, enc, &target.texture)
}

#[test]
fn unrotated_quad_covers_top_right_quadrant() {
    let Some(gpu) = gpu() else { return };
    let px = render_quad(&gpu, 0.0);

    assert_eq!(pixel(&px, SIZE, 48, 16), WHITE);
    assert_eq!(pixel(&px, SIZE, 16, 16), CLEAR);
    assert_eq!(pixel(&px, SIZE, 48, 48), CLEAR);
    assert_eq!(pixel(&px, SIZE, 16, 48), CLEAR);
}

#[test]
fn quad_is_squashed_by_cosine_of_angle() {
    let Some(gpu) = gpu() else { return };
    // cos(PI / 3) = 0.5: the quad spans x in [0, 0.5].
    let px = render_quad(&gpu, PI / 3.0);

    assert_eq!(pixel(&px, SIZE, 40, 16), WHITE);
    assert_eq!(pixel(&px, SIZE, 56, 16), CLEAR);
}

#[test]
fn quad_without_texture_draws_nothing() {
    let Some(gpu) = gpu() else { return };
    let target = Target::new(gpu.device());
    let mut quad = QuadPipeline::new(gpu.device(), FORMAT).expect("quad pipeline");
    assert!(!quad.has_texture());

    let mut enc = encoder(&gpu);
    clear_pass(&mut enc, &target.view, wgpu::Color::BLUE);
    {
        let ctx = RenderCtx::new(gpu.device(), gpu.queue(), FORMAT);
        let mut rt = RenderTarget::new(&mut enc, &target.view);
        quad.render(&ctx, &mut rt);
    }

    let px = submit_and_read(&gpu, enc, &target.texture);
    assert!(px.chunks_exact(4).all(|p| p == BLUE));
}

// ── driver and canvas ─────────────────────────────────────────────────────

#[test]
fn driver_draws_dots_over_quad() {
    let Some(gpu) = gpu() else { return };
    let target = Target::new(gpu.device());
    let mut driver = FrameDriver::new(gpu.device(), FORMAT).expect("frame driver");
    let texture = white_texture(&gpu);
    driver.bind_texture(gpu.device(), &texture).expect("bind texture");

    // Small dot centered in the quad's half of the screen.
    let batch = DotBatch::from_vec(vec![DotInstance::new(
        Vec2::new(0.5, 0.5),
        0.5,
        0.0,
        ColorRgba::new(1.0, 0.0, 0.0, 1.0),
    )]);

    let mut enc = encoder(&gpu);
    clear_pass(&mut enc, &target.view, wgpu::Color::TRANSPARENT);
    {
        let ctx = RenderCtx::new(gpu.device(), gpu.queue(), FORMAT);
        let mut rt = RenderTarget::new(&mut enc, &target.view);
        driver.draw_frame(&ctx, &mut rt, 0.0, &batch);
    }
    assert_eq!(driver.frame(), 1);
    assert_eq!(driver.dots().frame(), 1);
    assert_eq!(driver.quad().angle(), 0.0);

    let px = submit_and_read(&gpu, enc, &target.texture);
    // Dot center (0.5, 0.5) plus a jitter of sin(0.1) * 0.01, well inside.
    assert_eq!(pixel(&px, SIZE, 48, 16), RED);
    // Inside the quad, outside the dot.
    assert_eq!(pixel(&px, SIZE, 63, 0), WHITE);
}

#[test]
fn canvas_clears_then_draws() {
    let Some(gpu) = gpu() else { return };
    let mut canvas =
        DotCanvas::new(gpu.device(), SIZE, ColorRgba::new(0.0, 0.0, 1.0, 1.0)).expect("canvas");
    assert_eq!(canvas.size(), SIZE);
    assert_eq!(canvas.sampled().size(), (SIZE, SIZE));

    let batch = DotBatch::from_vec(vec![red_dot(2.0)]);
    let mut enc = encoder(&gpu);
    canvas.render(gpu.device(), gpu.queue(), &mut enc, 0, &batch);

    let px = submit_and_read(&gpu, enc, canvas.sampled().texture());
    assert_eq!(pixel(&px, SIZE, SIZE / 2, SIZE / 2), RED);
    assert_eq!(pixel(&px, SIZE, 0, 0), BLUE);
}

#[test]
fn canvas_binds_to_quad() {
    let Some(gpu) = gpu() else { return };
    let canvas = DotCanvas::new(gpu.device(), SIZE, ColorRgba::transparent()).expect("canvas");
    let mut quad = QuadPipeline::new(gpu.device(), FORMAT).expect("quad pipeline");
    quad.bind_texture(gpu.device(), canvas.sampled()).expect("canvas is sampleable");
    assert!(quad.has_texture());
}
