//! Bounded PNG decode and fit for amiibo icons.
//!
//! [`decode_png`] turns raw file bytes into an RGBA8 buffer that fits a
//! bounding box, or a [`ThumbnailError`]. [`ImageDecoder`] owns one
//! thumbnail slot and only decodes again when the requested path changes.

use amiibox_types::config::{OverlayConfig, ThumbnailBox, UpscalePolicy};
use amiibox_vfs::{Vfs, with_storage};

/// PNG file signature.
pub const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// Why a thumbnail could not be produced. Checked in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ThumbnailError {
    #[error("image file not found")]
    FileMissing,
    #[error("not a PNG image")]
    NotPng,
    #[error("malformed PNG data")]
    Malformed,
    #[error("unsupported PNG color mode")]
    UnsupportedColorMode,
    #[error("interlaced PNG images are not supported")]
    Interlaced,
    #[error("not enough memory to decode image")]
    OutOfMemory,
    #[error("invalid decode parameters")]
    InvalidParameters,
    #[error("use an RGBA image")]
    RgbWithoutAlpha,
    #[error("upscale not allowed")]
    UpscaleNotAllowed,
    #[error("malformed PNG pixel data")]
    MalformedFrame,
}

/// Decoder settings shared by every slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    pub upscale: UpscalePolicy,
    /// Upper bound for the raw frame plus the fitted output, in bytes.
    pub memory_limit: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self::from_config(&OverlayConfig::default())
    }
}

impl DecodeOptions {
    pub fn from_config(config: &OverlayConfig) -> Self {
        Self {
            upscale: config.upscale,
            memory_limit: config.decode_memory_limit,
        }
    }
}

/// RGBA8 pixels fitted to a box.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    /// Factor applied to the source dimensions.
    pub scale: f32,
    /// RGBA pixel data, 4 bytes per pixel, row-major.
    pub pixels: Vec<u8>,
}

/// Contents of one thumbnail slot.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Thumbnail {
    /// Nothing requested.
    #[default]
    Empty,
    Ready {
        path: String,
        image: DecodedImage,
    },
    Failed {
        path: String,
        error: ThumbnailError,
    },
}

impl Thumbnail {
    /// Path of the requested icon, if any.
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::Empty => None,
            Self::Ready { path, .. } | Self::Failed { path, .. } => Some(path),
        }
    }

    pub fn image(&self) -> Option<&DecodedImage> {
        match self {
            Self::Ready { image, .. } => Some(image),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<ThumbnailError> {
        match self {
            Self::Failed { error, .. } => Some(*error),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// Exact rational scale `num / den` and the output size it yields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Fit {
    num: u64,
    den: u64,
    width: u32,
    height: u32,
}

impl Fit {
    fn compute(
        width: u32,
        height: u32,
        max_width: u32,
        max_height: u32,
        policy: UpscalePolicy,
    ) -> Result<Self, ThumbnailError> {
        let (w, h) = (u64::from(width), u64::from(height));
        let (bw, bh) = (u64::from(max_width), u64::from(max_height));
        // min(bh / h, bw / w) without floating point.
        let (mut num, mut den) = if bh * w <= bw * h { (bh, h) } else { (bw, w) };
        if num > den {
            match policy {
                UpscalePolicy::Reject => return Err(ThumbnailError::UpscaleNotAllowed),
                UpscalePolicy::Clamp => (num, den) = (1, 1),
                UpscalePolicy::Allow => {},
            }
        }
        let scaled =
            |v: u64| -> u32 { u32::try_from((v * num / den).max(1)).unwrap_or(u32::MAX) };
        Ok(Self {
            num,
            den,
            width: scaled(w),
            height: scaled(h),
        })
    }

    fn is_identity(&self) -> bool {
        self.num == self.den
    }

    fn scale(&self) -> f32 {
        if self.is_identity() {
            1.0
        } else {
            (self.num as f64 / self.den as f64) as f32
        }
    }

    /// RGBA byte count of the output, `None` if it does not fit in a `u64`.
    fn output_bytes(&self) -> Option<u64> {
        u64::from(self.width)
            .checked_mul(u64::from(self.height))?
            .checked_mul(4)
    }
}

fn map_header_error(err: png::DecodingError) -> ThumbnailError {
    match err {
        png::DecodingError::LimitsExceeded => ThumbnailError::OutOfMemory,
        png::DecodingError::Parameter(_) => ThumbnailError::InvalidParameters,
        _ => ThumbnailError::Malformed,
    }
}

fn map_frame_error(err: png::DecodingError) -> ThumbnailError {
    match err {
        png::DecodingError::LimitsExceeded => ThumbnailError::OutOfMemory,
        png::DecodingError::Parameter(_) => ThumbnailError::InvalidParameters,
        _ => ThumbnailError::MalformedFrame,
    }
}

fn allocate(len: usize) -> Result<Vec<u8>, ThumbnailError> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| ThumbnailError::OutOfMemory)?;
    buf.resize(len, 0);
    Ok(buf)
}

/// Decode `data` and fit it into `max_width` x `max_height`.
///
/// Only 8-bit RGBA, non-interlaced images are accepted. Errors follow the
/// order of [`ThumbnailError`]'s variants: the first failing check wins.
pub fn decode_png(
    data: &[u8],
    max_height: u32,
    max_width: u32,
    options: DecodeOptions,
) -> Result<DecodedImage, ThumbnailError> {
    if !data.starts_with(&PNG_SIGNATURE) {
        return Err(ThumbnailError::NotPng);
    }

    let mut limits = png::Limits::default();
    limits.bytes = options.memory_limit;
    let mut decoder = png::Decoder::new_with_limits(data, limits);
    decoder.set_transformations(png::Transformations::IDENTITY);
    let mut reader = decoder.read_info().map_err(map_header_error)?;

    let (width, height, color, depth, interlaced) = {
        let info = reader.info();
        (
            info.width,
            info.height,
            info.color_type,
            info.bit_depth,
            info.interlaced,
        )
    };

    if depth != png::BitDepth::Eight
        || !matches!(color, png::ColorType::Rgba | png::ColorType::Rgb)
    {
        return Err(ThumbnailError::UnsupportedColorMode);
    }
    if interlaced {
        return Err(ThumbnailError::Interlaced);
    }

    let frame_size = reader.output_buffer_size();
    let fit = if max_width == 0 || max_height == 0 || width == 0 || height == 0 {
        None
    } else {
        Fit::compute(width, height, max_width, max_height, options.upscale).ok()
    };
    let resampled_bytes = match fit.filter(|f| !f.is_identity()) {
        Some(f) => f.output_bytes().ok_or(ThumbnailError::OutOfMemory)?,
        None => 0,
    };
    let needed = (frame_size as u64)
        .checked_add(resampled_bytes)
        .ok_or(ThumbnailError::OutOfMemory)?;
    if needed > options.memory_limit as u64 {
        return Err(ThumbnailError::OutOfMemory);
    }

    if max_width == 0 || max_height == 0 {
        return Err(ThumbnailError::InvalidParameters);
    }
    if color == png::ColorType::Rgb {
        return Err(ThumbnailError::RgbWithoutAlpha);
    }
    let fit = Fit::compute(width, height, max_width, max_height, options.upscale)?;

    let mut frame = allocate(frame_size)?;
    let output = reader.next_frame(&mut frame).map_err(map_frame_error)?;
    frame.truncate(output.buffer_size());

    let pixels = if fit.is_identity() {
        frame
    } else {
        let resampled = resample(&frame, width, height, &fit)?;
        drop(frame);
        resampled
    };

    log::debug!(
        "Decoded {width}x{height} PNG to {}x{} (scale {})",
        fit.width,
        fit.height,
        fit.scale()
    );
    Ok(DecodedImage {
        width: fit.width,
        height: fit.height,
        scale: fit.scale(),
        pixels,
    })
}

/// Nearest-neighbour resample: destination `(x, y)` reads source
/// `(x / scale, y / scale)`, clamped to the source.
fn resample(src: &[u8], width: u32, height: u32, fit: &Fit) -> Result<Vec<u8>, ThumbnailError> {
    let len = fit
        .output_bytes()
        .and_then(|n| usize::try_from(n).ok())
        .ok_or(ThumbnailError::OutOfMemory)?;
    let mut out = allocate(len)?;
    let src_stride = width as usize * 4;
    let dst_stride = fit.width as usize * 4;
    for y in 0..fit.height {
        let sy = ((u64::from(y) * fit.den / fit.num) as u32).min(height - 1) as usize;
        let src_row = &src[sy * src_stride..(sy + 1) * src_stride];
        let dst_row = &mut out[y as usize * dst_stride..(y as usize + 1) * dst_stride];
        for x in 0..fit.width {
            let sx = ((u64::from(x) * fit.den / fit.num) as u32).min(width - 1) as usize;
            let d = x as usize * 4;
            dst_row[d..d + 4].copy_from_slice(&src_row[sx * 4..sx * 4 + 4]);
        }
    }
    Ok(out)
}

fn read_file(vfs: &dyn Vfs, path: &str) -> Result<Vec<u8>, ThumbnailError> {
    match with_storage(vfs, |v| v.read(path)) {
        Ok(Ok(data)) => Ok(data),
        Ok(Err(e)) | Err(e) => {
            log::debug!("Icon {path} unreadable: {e}");
            Err(ThumbnailError::FileMissing)
        },
    }
}

/// One thumbnail slot with a fixed bounding box.
#[derive(Debug)]
pub struct ImageDecoder {
    bounds: ThumbnailBox,
    options: DecodeOptions,
    current: Thumbnail,
}

impl ImageDecoder {
    pub fn new(bounds: ThumbnailBox, options: DecodeOptions) -> Self {
        Self {
            bounds,
            options,
            current: Thumbnail::Empty,
        }
    }

    pub fn bounds(&self) -> ThumbnailBox {
        self.bounds
    }

    pub fn thumbnail(&self) -> &Thumbnail {
        &self.current
    }

    /// Point the slot at `path`.
    ///
    /// `None` clears the slot. Requesting the path already held is a
    /// no-op, so failed decodes are not retried until the path changes.
    pub fn request(&mut self, vfs: &dyn Vfs, path: Option<&str>) -> &Thumbnail {
        match path {
            None => self.clear(),
            Some(p) if self.current.path() == Some(p) => {},
            Some(p) => self.load(vfs, p),
        }
        &self.current
    }

    pub fn clear(&mut self) {
        self.current = Thumbnail::Empty;
    }

    fn load(&mut self, vfs: &dyn Vfs, path: &str) {
        // Release the held buffer before decoding the next one.
        self.current = Thumbnail::Empty;
        let result = read_file(vfs, path).and_then(|data| {
            decode_png(
                &data,
                self.bounds.max_height,
                self.bounds.max_width,
                self.options,
            )
        });
        self.current = match result {
            Ok(image) => Thumbnail::Ready {
                path: path.to_string(),
                image,
            },
            Err(error) => {
                log::debug!("Thumbnail {path}: {error}");
                Thumbnail::Failed {
                    path: path.to_string(),
                    error,
                }
            },
        };
    }
}
