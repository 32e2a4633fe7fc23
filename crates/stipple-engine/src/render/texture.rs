use anyhow::{bail, ensure, Context, Result};

/// Sampler settings for textures bound to the quad pipeline.
///
/// The quad's sampler slot is declared as filtering, which accepts both
/// filtering and non-filtering samplers; the texture itself must always be
/// float-filterable.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SamplerConfig {
    pub address_mode: wgpu::AddressMode,
    pub mag_filter: wgpu::FilterMode,
    pub min_filter: wgpu::FilterMode,
    pub mipmap_filter: wgpu::MipmapFilterMode,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            address_mode: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
        }
    }
}

impl SamplerConfig {
    /// Nearest filtering everywhere; keeps texel edges crisp.
    pub fn nearest() -> Self {
        Self {
            mag_filter: wgpu::FilterMode::Nearest,
            ..Self::default()
        }
    }

    pub fn is_filtering(&self) -> bool {
        self.mag_filter == wgpu::FilterMode::Linear
            || self.min_filter == wgpu::FilterMode::Linear
            || self.mipmap_filter == wgpu::MipmapFilterMode::Linear
    }

    fn create(&self, device: &wgpu::Device, label: &str) -> wgpu::Sampler {
        device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(label),
            address_mode_u: self.address_mode,
            address_mode_v: self.address_mode,
            address_mode_w: self.address_mode,
            mag_filter: self.mag_filter,
            min_filter: self.min_filter,
            mipmap_filter: self.mipmap_filter,
            ..Default::default()
        })
    }
}

/// The properties of a texture that decide whether it can be sampled by the
/// quad pipeline.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TextureInfo {
    pub format: wgpu::TextureFormat,
    pub dimension: wgpu::TextureDimension,
    pub sample_count: u32,
    pub usage: wgpu::TextureUsages,
}

impl TextureInfo {
    pub fn of(texture: &wgpu::Texture) -> Self {
        Self {
            format: texture.format(),
            dimension: texture.dimension(),
            sample_count: texture.sample_count(),
            usage: texture.usage(),
        }
    }
}

/// Checks that a texture matches the quad pipeline's group 1 layout:
/// a single-sampled 2D `texture_2d<f32>` that a filtering sampler may read.
pub fn validate_quad_texture(info: &TextureInfo, device_features: wgpu::Features) -> Result<()> {
    ensure!(
        info.dimension == wgpu::TextureDimension::D2,
        "quad texture must be 2D, got {:?}",
        info.dimension
    );
    ensure!(
        info.sample_count == 1,
        "quad texture must be single-sampled, got {} samples",
        info.sample_count
    );
    ensure!(
        info.usage.contains(wgpu::TextureUsages::TEXTURE_BINDING),
        "quad texture lacks TEXTURE_BINDING usage ({:?})",
        info.usage
    );

    match info.format.sample_type(None, Some(device_features)) {
        Some(wgpu::TextureSampleType::Float { filterable: true }) => Ok(()),
        Some(wgpu::TextureSampleType::Float { filterable: false }) => bail!(
            "{:?} is not filterable on this device; the quad samples with a filtering sampler",
            info.format
        ),
        other => bail!(
            "{:?} samples as {other:?}; the quad expects a float texture",
            info.format
        ),
    }
}

/// A texture view plus the sampler used to read it.
pub struct SampledTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    sampler: wgpu::Sampler,
}

impl SampledTexture {
    /// Wraps an existing texture after checking it against the quad layout.
    pub fn new(device: &wgpu::Device, texture: wgpu::Texture, sampler_config: SamplerConfig) -> Result<Self> {
        validate_quad_texture(&TextureInfo::of(&texture), device.features())?;

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = sampler_config.create(device, "stipple texture sampler");
        log::debug!(
            "sampled texture {:?}, filtering sampler: {}",
            texture.format(),
            sampler_config.is_filtering()
        );
        Ok(Self {
            texture,
            view,
            sampler,
        })
    }

    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }

    pub fn info(&self) -> TextureInfo {
        TextureInfo::of(&self.texture)
    }

    pub fn size(&self) -> (u32, u32) {
        (self.texture.width(), self.texture.height())
    }
}

/// Number of bytes `upload_texture` expects for a tightly packed image.
pub(crate) fn expected_byte_len(format: wgpu::TextureFormat, width: u32, height: u32) -> Result<usize> {
    ensure!(
        format.block_dimensions() == (1, 1),
        "{format:?} is block-compressed; only uncompressed uploads are supported"
    );
    let texel = format
        .block_copy_size(None)
        .with_context(|| format!("{format:?} has no single copyable aspect"))?;
    Ok(texel as usize * width as usize * height as usize)
}

/// Creates a 2D texture from tightly packed rows and uploads `pixels`.
///
/// Fails before touching the GPU if the dimensions, the byte count or the
/// format don't fit the quad pipeline.
pub fn upload_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    pixels: &[u8],
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
    sampler: SamplerConfig,
) -> Result<SampledTexture> {
    ensure!(width > 0 && height > 0, "texture has zero size ({width}x{height})");
    let max = device.limits().max_texture_dimension_2d;
    ensure!(
        width <= max && height <= max,
        "texture {width}x{height} exceeds the device limit of {max}"
    );

    let usage = wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST;
    validate_quad_texture(
        &TextureInfo {
            format,
            dimension: wgpu::TextureDimension::D2,
            sample_count: 1,
            usage,
        },
        device.features(),
    )?;

    let expected = expected_byte_len(format, width, height)?;
    ensure!(
        pixels.len() == expected,
        "{width}x{height} {format:?} needs {expected} bytes, got {}",
        pixels.len()
    );

    let size = wgpu::Extent3d { width, height, depth_or_array_layers: 1 };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("stipple uploaded texture"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage,
        view_formats: &[],
    });

    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        pixels,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some((expected / height as usize) as u32),
            rows_per_image: Some(height),
        },
        size,
    );

    log::debug!("uploaded {width}x{height} {format:?} texture");
    SampledTexture::new(device, texture, sampler)
}
