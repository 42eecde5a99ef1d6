//! Surface compositor - paints the window array plus overlays.
//!
//! Paint order is fixed, later steps land on top:
//! 1. source array, blitted verbatim at (0, 0) over the whole surface
//! 2. pan-position crosshair at the window center
//! 3. on-screen message, centered horizontally at 2/3 of the height
//!
//! No scaling happens here; the array must already match the surface.

use log::trace;

use super::settings::ViewerSettings;
use super::surface::{ChannelOrder, RgbArray, Surface};
use super::text::{self, TextSprite, TextStyle};
use crate::error::{Result, ViewerError};

/// Crosshair half-length in pixels, per axis.
pub const PAN_MARKER_HALF_LEN: i64 = 10;

/// Overlays to draw for one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Overlays<'a> {
    pub pan_marker: bool,
    /// Already filtered for expiry
    pub message: Option<&'a str>,
}

/// Composites frames for one viewer. Holds the last rasterised message so
/// overlay-only redraws do not reshape text.
#[derive(Debug, Clone)]
pub struct SurfaceCompositor {
    marker_color: [u8; 4],
    text_style: TextStyle,
    cached_text: Option<(String, TextSprite)>,
}

impl SurfaceCompositor {
    pub fn new(settings: &ViewerSettings) -> Self {
        Self {
            marker_color: settings.marker_color,
            text_style: TextStyle {
                family: settings.onscreen_ff.clone(),
                size: settings.onscreen_font_size,
                color: settings.message_color,
            },
            cached_text: None,
        }
    }

    /// Paint `source` and `overlays` into `surface`.
    ///
    /// The surface buffer is reused; identical inputs give identical pixels.
    pub fn render(&mut self, surface: &mut Surface, source: &RgbArray, overlays: &Overlays) -> Result<()> {
        if source.dims() != surface.dims() {
            return Err(ViewerError::ArrayShapeMismatch {
                expected: surface.dims(),
                actual: source.dims(),
            });
        }
        trace!(
            "compositing {}x{} (marker={}, message={})",
            surface.width(),
            surface.height(),
            overlays.pan_marker,
            overlays.message.is_some()
        );

        blit(surface, source);

        if overlays.pan_marker {
            self.draw_crosshair(surface);
        }

        if let Some(message) = overlays.message {
            self.draw_message(surface, message);
        }
        Ok(())
    }

    fn draw_crosshair(&self, surface: &mut Surface) {
        let (cx, cy) = surface.center();
        let (cx, cy) = (cx as i64, cy as i64);
        for d in -PAN_MARKER_HALF_LEN..=PAN_MARKER_HALF_LEN {
            surface.blend_pixel(cx + d, cy, self.marker_color);
        }
        for d in -PAN_MARKER_HALF_LEN..=PAN_MARKER_HALF_LEN {
            if d != 0 {
                surface.blend_pixel(cx, cy + d, self.marker_color);
            }
        }
    }

    fn draw_message(&mut self, surface: &mut Surface, message: &str) {
        let sprite = self.sprite_for(message);
        let (win_w, win_h) = (surface.width() as i64, surface.height() as i64);
        let (txt_w, txt_h) = (sprite.width as i64, sprite.height as i64);

        let y = (win_h / 3) * 2 - txt_h / 2;
        let x = win_w / 2 - txt_w / 2;
        sprite.blit(surface, x, y);
    }

    fn sprite_for(&mut self, message: &str) -> &TextSprite {
        if !matches!(&self.cached_text, Some((text, _)) if text == message) {
            self.cached_text = None;
        }
        let style = &self.text_style;
        let (_, sprite) = self
            .cached_text
            .get_or_insert_with(|| (message.to_string(), text::rasterize(message, style)));
        sprite
    }

    /// Extents (width, height) of `message` in the on-screen font.
    pub fn text_extents(&mut self, message: &str) -> (usize, usize) {
        let sprite = self.sprite_for(message);
        (sprite.width, sprite.height)
    }
}

/// Copy the array into the surface as RGBA.
fn blit(surface: &mut Surface, source: &RgbArray) {
    let dst = surface.raw_mut();
    let src = source.as_bytes();
    let order = source.order();

    if order == ChannelOrder::Rgba {
        dst.copy_from_slice(src);
        return;
    }

    let c = order.channels();
    for (out, px) in dst.chunks_exact_mut(4).zip(src.chunks_exact(c)) {
        out.copy_from_slice(&order.to_rgba(px));
    }
}
