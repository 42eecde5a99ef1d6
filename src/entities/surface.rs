//! Pixel containers: the incoming window array and the off-screen surface.
//!
//! # Layouts
//!
//! - `RgbArray`: (height, width, channels) u8 samples, 3 or 4 channels in any
//!   supported [`ChannelOrder`]. Produced upstream, already scaled to the window.
//! - `Surface`: width x height RGBA8, row-major, no padding. Replaced as a whole
//!   whenever the window size changes, never resized in place.

use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, ViewerError};

/// Channel order of a packed pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ChannelOrder {
    Rgb,
    Bgr,
    #[default]
    Rgba,
    Bgra,
    Argb,
    Abgr,
}

impl ChannelOrder {
    pub fn channels(&self) -> usize {
        match self {
            ChannelOrder::Rgb | ChannelOrder::Bgr => 3,
            _ => 4,
        }
    }

    pub fn has_alpha(&self) -> bool {
        self.channels() == 4
    }

    /// Byte offsets of (r, g, b, a) within one pixel.
    fn offsets(&self) -> (usize, usize, usize, Option<usize>) {
        match self {
            ChannelOrder::Rgb => (0, 1, 2, None),
            ChannelOrder::Bgr => (2, 1, 0, None),
            ChannelOrder::Rgba => (0, 1, 2, Some(3)),
            ChannelOrder::Bgra => (2, 1, 0, Some(3)),
            ChannelOrder::Argb => (1, 2, 3, Some(0)),
            ChannelOrder::Abgr => (3, 2, 1, Some(0)),
        }
    }

    /// Read one pixel in this order as RGBA. Missing alpha is opaque.
    pub fn to_rgba(&self, px: &[u8]) -> [u8; 4] {
        let (r, g, b, a) = self.offsets();
        [px[r], px[g], px[b], a.map(|i| px[i]).unwrap_or(255)]
    }

    /// Write an RGBA pixel in this order. Alpha is dropped for 3-channel orders.
    pub fn write_rgba(&self, rgba: [u8; 4], out: &mut [u8]) {
        let (r, g, b, a) = self.offsets();
        out[r] = rgba[0];
        out[g] = rgba[1];
        out[b] = rgba[2];
        if let Some(a) = a {
            out[a] = rgba[3];
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelOrder::Rgb => "RGB",
            ChannelOrder::Bgr => "BGR",
            ChannelOrder::Rgba => "RGBA",
            ChannelOrder::Bgra => "BGRA",
            ChannelOrder::Argb => "ARGB",
            ChannelOrder::Abgr => "ABGR",
        }
    }
}

impl FromStr for ChannelOrder {
    type Err = ViewerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "RGB" => Ok(ChannelOrder::Rgb),
            "BGR" => Ok(ChannelOrder::Bgr),
            "RGBA" => Ok(ChannelOrder::Rgba),
            "BGRA" => Ok(ChannelOrder::Bgra),
            "ARGB" => Ok(ChannelOrder::Argb),
            "ABGR" => Ok(ChannelOrder::Abgr),
            _ => Err(ViewerError::InvalidChannelOrder(s.to_string())),
        }
    }
}

impl TryFrom<String> for ChannelOrder {
    type Error = ViewerError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<ChannelOrder> for String {
    fn from(order: ChannelOrder) -> Self {
        order.as_str().to_string()
    }
}

impl fmt::Display for ChannelOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Window-sized source pixels handed to the compositor.
#[derive(Debug, Clone, PartialEq)]
pub struct RgbArray {
    width: usize,
    height: usize,
    order: ChannelOrder,
    data: Vec<u8>,
}

impl RgbArray {
    /// Wrap packed samples, checking the length against the shape.
    pub fn new(width: usize, height: usize, order: ChannelOrder, data: Vec<u8>) -> Result<Self> {
        let channels = order.channels();
        if data.len() != width * height * channels {
            return Err(ViewerError::ArrayLength {
                len: data.len(),
                width,
                height,
                channels,
            });
        }
        Ok(Self {
            width,
            height,
            order,
            data,
        })
    }

    /// Solid RGBA array.
    pub fn filled(width: usize, height: usize, rgba: [u8; 4]) -> Self {
        let mut data = vec![0u8; width * height * 4];
        for px in data.chunks_exact_mut(4) {
            px.copy_from_slice(&rgba);
        }
        Self {
            width,
            height,
            order: ChannelOrder::Rgba,
            data,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn dims(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn order(&self) -> ChannelOrder {
        self.order
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Pixel at (x, y) as RGBA.
    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let c = self.order.channels();
        let idx = (y * self.width + x) * c;
        Some(self.order.to_rgba(&self.data[idx..idx + c]))
    }
}

/// Off-screen RGBA8 pixel buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    image: RgbaImage,
}

impl Surface {
    /// Transparent black surface.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            image: RgbaImage::new(width as u32, height as u32),
        }
    }

    pub fn width(&self) -> usize {
        self.image.width() as usize
    }

    pub fn height(&self) -> usize {
        self.image.height() as usize
    }

    pub fn dims(&self) -> (usize, usize) {
        (self.width(), self.height())
    }

    /// Geometric window center, integer division like the window coordinates.
    pub fn center(&self) -> (usize, usize) {
        (self.width() / 2, self.height() / 2)
    }

    /// Packed RGBA bytes, row-major.
    pub fn as_raw(&self) -> &[u8] {
        self.image.as_raw()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub(crate) fn raw_mut(&mut self) -> &mut [u8] {
        &mut self.image
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 4]> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        Some(self.image.get_pixel(x as u32, y as u32).0)
    }

    /// Source-over blend of `rgba` at (x, y). Out-of-bounds writes are clipped.
    pub(crate) fn blend_pixel(&mut self, x: i64, y: i64, rgba: [u8; 4]) {
        if x < 0 || y < 0 || x >= self.width() as i64 || y >= self.height() as i64 {
            return;
        }
        let dst = self.image.get_pixel_mut(x as u32, y as u32);
        *dst = Rgba(blend_over(rgba, dst.0));
    }
}

/// Source-over compositing of two straight-alpha RGBA8 pixels.
pub(crate) fn blend_over(src: [u8; 4], dst: [u8; 4]) -> [u8; 4] {
    match src[3] {
        255 => return src,
        0 => return dst,
        _ => {}
    }
    let src_a = src[3] as f32 / 255.0;
    let dst_a = dst[3] as f32 / 255.0;
    let out_a = src_a + dst_a * (1.0 - src_a);

    let blend = |s: u8, d: u8| -> u8 {
        let s = s as f32 / 255.0;
        let d = d as f32 / 255.0;
        let out = (s * src_a + d * dst_a * (1.0 - src_a)) / out_a;
        (out.clamp(0.0, 1.0) * 255.0).round() as u8
    };

    [
        blend(src[0], dst[0]),
        blend(src[1], dst[1]),
        blend(src[2], dst[2]),
        (out_a.clamp(0.0, 1.0) * 255.0).round() as u8,
    ]
}
