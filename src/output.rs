//! Output adapters: encoded bytes, raw packed array, host widget paint.
//!
//! All adapters read the surface through a shared borrow or hand out a copy;
//! nothing here keeps a handle to the viewer's buffer.
//!
//! Encoding is deterministic for a given surface, format and quality: the
//! `image` encoders used here write no timestamps and use no randomness.

use std::fmt;
use std::io::{Cursor, Seek, Write};
use std::path::Path;
use std::str::FromStr;

use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder, ImageFormat};
use log::{debug, info};

use crate::entities::surface::{ChannelOrder, Surface};
use crate::entities::view_state::CursorHandle;
use crate::error::{Result, ViewerError};

pub const DEFAULT_QUALITY: u8 = 90;

/// Encoded raster formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Png,
    Jpeg,
    Tiff,
    Tga,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Tiff => "tif",
            OutputFormat::Tga => "tga",
        }
    }

    /// Guess from a file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| ViewerError::UnsupportedFormat(path.display().to_string()))?;
        ext.parse()
    }

    fn image_format(&self) -> ImageFormat {
        match self {
            OutputFormat::Png => ImageFormat::Png,
            OutputFormat::Jpeg => ImageFormat::Jpeg,
            OutputFormat::Tiff => ImageFormat::Tiff,
            OutputFormat::Tga => ImageFormat::Tga,
        }
    }
}

impl FromStr for OutputFormat {
    type Err = ViewerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(OutputFormat::Png),
            "jpg" | "jpeg" => Ok(OutputFormat::Jpeg),
            "tif" | "tiff" => Ok(OutputFormat::Tiff),
            "tga" => Ok(OutputFormat::Tga),
            _ => Err(ViewerError::UnsupportedFormat(s.to_string())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Png => write!(f, "PNG"),
            OutputFormat::Jpeg => write!(f, "JPEG"),
            OutputFormat::Tiff => write!(f, "TIFF"),
            OutputFormat::Tga => write!(f, "TGA"),
        }
    }
}

/// Seam for the host toolkit. The core never calls a toolkit directly.
pub trait HostWidget {
    /// Show `pixels` (RGBA8, row-major). Returns false if the widget refused.
    fn paint(&mut self, pixels: &[u8], width: usize, height: usize) -> bool;

    /// Apply a cursor previously registered with the viewer.
    fn set_cursor(&mut self, _cursor: &CursorHandle) {}
}

/// Encode the surface into `writer`.
///
/// `quality` (0-100) is clamped to 1-100 and only used for JPEG, which also
/// drops the alpha channel.
pub fn encode_to_writer<W: Write + Seek>(
    surface: &Surface,
    writer: &mut W,
    format: OutputFormat,
    quality: u8,
) -> Result<()> {
    let (w, h) = (surface.width() as u32, surface.height() as u32);

    match format {
        OutputFormat::Jpeg => {
            let rgb = image::DynamicImage::ImageRgba8(surface.image().clone()).to_rgb8();
            let encoder = JpegEncoder::new_with_quality(writer, quality.clamp(1, 100));
            encoder.write_image(rgb.as_raw(), w, h, ExtendedColorType::Rgb8)?;
        }
        _ => {
            surface.image().write_to(writer, format.image_format())?;
        }
    }
    debug!("encoded {}x{} surface as {}", w, h, format);
    Ok(())
}

/// Encode the surface into a fresh byte vector.
pub fn encode(surface: &Surface, format: OutputFormat, quality: u8) -> Result<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::new());
    encode_to_writer(surface, &mut cursor, format, quality)?;
    Ok(cursor.into_inner())
}

/// Encode and write to `path`.
pub fn save(surface: &Surface, path: &Path, format: OutputFormat, quality: u8) -> Result<()> {
    let bytes = encode(surface, format, quality)?;
    std::fs::write(path, &bytes)?;
    info!("wrote {} file '{}' ({} bytes)", format, path.display(), bytes.len());
    Ok(())
}

/// Copy of the surface as packed bytes in `order`.
///
/// Row-major, no padding, always 4 channels: exactly `width * height * 4` bytes.
pub fn to_raw_array(surface: &Surface, order: ChannelOrder) -> Result<Vec<u8>> {
    if !order.has_alpha() {
        return Err(ViewerError::InvalidChannelOrder(order.to_string()));
    }
    let src = surface.as_raw();
    if order == ChannelOrder::Rgba {
        return Ok(src.to_vec());
    }

    let mut out = vec![0u8; src.len()];
    for (dst, px) in out.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        order.write_rgba([px[0], px[1], px[2], px[3]], dst);
    }
    Ok(out)
}

/// Hand the surface to the host widget for display.
pub fn write_to_widget(surface: &Surface, widget: &mut dyn HostWidget) -> bool {
    widget.paint(surface.as_raw(), surface.width(), surface.height())
}
