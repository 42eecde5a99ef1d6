//! On-screen text rasterisation.
//!
//! Uses cosmic-text for shaping and glyph coverage. Text is laid out once,
//! rendered to a transparent RGBA sprite, then blended onto the surface.

use cosmic_text::{
    Attrs as TextAttrs, Buffer, Color, Family, FontSystem, Metrics, Shaping, SwashCache,
};
use std::sync::Mutex;

use super::surface::{blend_over, Surface};

// Global font system (expensive to create, shared by every viewer)
lazy_static::lazy_static! {
    static ref FONT_SYSTEM: Mutex<FontSystem> = Mutex::new(FontSystem::new());
    static ref SWASH_CACHE: Mutex<SwashCache> = Mutex::new(SwashCache::new());
}

/// Line height as a multiple of the font size.
const LINE_HEIGHT: f32 = 1.2;

/// Font family + size + colour for one piece of text.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub family: String,
    pub size: f32,
    pub color: [u8; 4],
}

/// Rasterised text: straight-alpha RGBA, `width * height * 4` bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSprite {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<u8>,
}

impl TextSprite {
    /// Blend onto `surface` with its top-left corner at (x, y). Clipped.
    pub fn blit(&self, surface: &mut Surface, x: i64, y: i64) {
        for sy in 0..self.height {
            for sx in 0..self.width {
                let idx = (sy * self.width + sx) * 4;
                let px = [
                    self.pixels[idx],
                    self.pixels[idx + 1],
                    self.pixels[idx + 2],
                    self.pixels[idx + 3],
                ];
                if px[3] == 0 {
                    continue;
                }
                surface.blend_pixel(x + sx as i64, y + sy as i64, px);
            }
        }
    }
}

fn family_of(name: &str) -> Family<'_> {
    match name.to_lowercase().as_str() {
        "sans serif" | "sans-serif" | "sans" => Family::SansSerif,
        "serif" => Family::Serif,
        "monospace" | "mono" => Family::Monospace,
        "cursive" => Family::Cursive,
        "fantasy" => Family::Fantasy,
        _ => Family::Name(name),
    }
}

/// Render `text` to a sprite sized to its extents.
///
/// With no usable fonts installed the sprite is 1x1 and fully transparent.
pub fn rasterize(text: &str, style: &TextStyle) -> TextSprite {
    let mut font_system = FONT_SYSTEM.lock().unwrap_or_else(|e| e.into_inner());
    let mut swash_cache = SWASH_CACHE.lock().unwrap_or_else(|e| e.into_inner());

    let line_height = style.size * LINE_HEIGHT;
    let metrics = Metrics::new(style.size, line_height);
    let mut buffer = Buffer::new(&mut font_system, metrics);

    // Unbounded layout width: messages are single-purpose and never wrapped
    buffer.set_size(&mut font_system, Some(4096.0), None);

    let text_attrs = TextAttrs::new().family(family_of(&style.family));
    buffer.set_text(&mut font_system, text, &text_attrs, Shaping::Advanced, None);
    buffer.shape_until_scroll(&mut font_system, false);

    let (width, height) = {
        let mut max_x = 0.0f32;
        let mut max_y = 0.0f32;
        for run in buffer.layout_runs() {
            for glyph in run.glyphs.iter() {
                max_x = max_x.max(glyph.x + glyph.w);
            }
            max_y = max_y.max(run.line_y + line_height);
        }
        ((max_x.ceil() as usize).max(1), (max_y.ceil() as usize).max(1))
    };

    let mut pixels = vec![0u8; width * height * 4];
    let [r, g, b, a] = style.color;
    let text_color = Color::rgba(r, g, b, a);

    buffer.draw(&mut font_system, &mut swash_cache, text_color, |x, y, w, h, color| {
        if color.a() == 0 {
            return;
        }
        let src = [color.r(), color.g(), color.b(), color.a()];
        for dy in 0..h as i64 {
            for dx in 0..w as i64 {
                let px = x as i64 + dx;
                let py = y as i64 + dy;
                if px < 0 || py < 0 || px >= width as i64 || py >= height as i64 {
                    continue;
                }
                let idx = (py as usize * width + px as usize) * 4;
                let dst = [pixels[idx], pixels[idx + 1], pixels[idx + 2], pixels[idx + 3]];
                pixels[idx..idx + 4].copy_from_slice(&blend_over(src, dst));
            }
        }
    });

    TextSprite {
        width,
        height,
        pixels,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style() -> TextStyle {
        TextStyle {
            family: "Sans Serif".into(),
            size: 24.0,
            color: [255, 255, 255, 255],
        }
    }

    #[test]
    fn test_family_mapping() {
        assert_eq!(family_of("Sans Serif"), Family::SansSerif);
        assert_eq!(family_of("MONO"), Family::Monospace);
        assert_eq!(family_of("DejaVu Sans"), Family::Name("DejaVu Sans"));
    }

    #[test]
    fn test_rasterize_is_deterministic() {
        let a = rasterize("M31", &style());
        let b = rasterize("M31", &style());
        assert_eq!(a, b);
        assert_eq!(a.pixels.len(), a.width * a.height * 4);
    }

    #[test]
    fn test_empty_text_is_transparent() {
        let sprite = rasterize("", &style());
        assert!(sprite.pixels.iter().all(|&v| v == 0));
    }

    #[test]
    fn test_blit_skips_transparent_and_clips() {
        let sprite = TextSprite {
            width: 2,
            height: 1,
            pixels: vec![0, 0, 0, 0, 9, 9, 9, 255],
        };
        let mut s = Surface::new(2, 2);
        sprite.blit(&mut s, 0, 1);
        assert_eq!(s.pixel(0, 1), Some([0, 0, 0, 0]));
        assert_eq!(s.pixel(1, 1), Some([9, 9, 9, 255]));

        sprite.blit(&mut s, 1, -1);
        assert_eq!(s.pixel(1, 0), Some([0, 0, 0, 0]));
    }
}
