//! Single-plane raster image with linear cut-level mapping.
//!
//! A minimal [`ImageSource`]: nearest-neighbour sampling around the pan
//! position, then `(v - low) / (high - low)` stretched to 0..255 grey.
//! Inverted cuts (low > high) invert the ramp.

use std::path::Path;

use anyhow::Context;

use super::surface::{ChannelOrder, RgbArray};
use super::view_state::{ImageSource, ViewState};

/// Grey data plane (row-major f32 samples).
#[derive(Debug, Clone)]
pub struct RasterImage {
    name: String,
    width: usize,
    height: usize,
    data: Vec<f32>,
    /// Window pixels outside the data
    outside: [u8; 4],
}

impl RasterImage {
    pub fn new(name: &str, width: usize, height: usize, data: Vec<f32>) -> anyhow::Result<Self> {
        anyhow::ensure!(
            data.len() == width * height,
            "raster '{}' has {} samples, expected {}x{}",
            name,
            data.len(),
            width,
            height
        );
        Ok(Self {
            name: name.to_string(),
            width,
            height,
            data,
            outside: [0, 0, 0, 255],
        })
    }

    /// Luminance of a decoded image, 0..255 per sample.
    pub fn from_dynamic(name: &str, img: &image::DynamicImage) -> Self {
        let luma = img.to_luma8();
        let (w, h) = (luma.width() as usize, luma.height() as usize);
        let data = luma.as_raw().iter().map(|&v| v as f32).collect();
        Self {
            name: name.to_string(),
            width: w,
            height: h,
            data,
            outside: [0, 0, 0, 255],
        }
    }

    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let img = image::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Noname".to_string());
        Ok(Self::from_dynamic(&name, &img))
    }

    pub fn with_outside_color(mut self, rgba: [u8; 4]) -> Self {
        self.outside = rgba;
        self
    }

    /// Sample at data coordinates, None outside the plane.
    pub fn value(&self, x: usize, y: usize) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.data[y * self.width + x])
    }
}

fn stretch(v: f64, low: f64, high: f64) -> u8 {
    let span = high - low;
    if span == 0.0 {
        return if v >= high { 255 } else { 0 };
    }
    let t = ((v - low) / span).clamp(0.0, 1.0);
    (t * 255.0).round() as u8
}

impl ImageSource for RasterImage {
    fn name(&self) -> &str {
        &self.name
    }

    fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn minmax(&self) -> Option<(f64, f64)> {
        let mut it = self.data.iter().copied().filter(|v| v.is_finite());
        let first = it.next()? as f64;
        Some(it.fold((first, first), |(lo, hi), v| {
            (lo.min(v as f64), hi.max(v as f64))
        }))
    }

    fn window_array(&self, width: usize, height: usize, view: &ViewState) -> anyhow::Result<RgbArray> {
        let (sx, sy) = view.scale();
        let (low, high) = view.cut_levels();
        let (pan_x, pan_y) = view.pan();

        // Data point under the window center; pan offsets from the image center.
        let ctr_x = self.width as f64 / 2.0 + pan_x;
        let ctr_y = self.height as f64 / 2.0 + pan_y;
        let win_cx = (width / 2) as f64;
        let win_cy = (height / 2) as f64;

        let mut data = vec![0u8; width * height * 4];
        for wy in 0..height {
            let dy = ctr_y + (wy as f64 - win_cy) / sy;
            for wx in 0..width {
                let dx = ctr_x + (wx as f64 - win_cx) / sx;
                let idx = (wy * width + wx) * 4;
                let px = &mut data[idx..idx + 4];

                if dx < 0.0 || dy < 0.0 {
                    px.copy_from_slice(&self.outside);
                    continue;
                }
                match self.value(dx.floor() as usize, dy.floor() as usize) {
                    Some(v) => {
                        let g = stretch(v as f64, low, high);
                        px.copy_from_slice(&[g, g, g, 255]);
                    }
                    None => px.copy_from_slice(&self.outside),
                }
            }
        }

        Ok(RgbArray::new(width, height, ChannelOrder::Rgba, data)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(w: usize, h: usize) -> RasterImage {
        let data = (0..w * h).map(|i| (i % w) as f32 * 10.0).collect();
        RasterImage::new("ramp", w, h, data).unwrap()
    }

    #[test]
    fn test_new_checks_length() {
        assert!(RasterImage::new("bad", 2, 2, vec![0.0; 3]).is_err());
    }

    #[test]
    fn test_minmax() {
        let img = ramp(4, 2);
        assert_eq!(img.minmax(), Some((0.0, 30.0)));
    }

    #[test]
    fn test_stretch() {
        assert_eq!(stretch(0.0, 0.0, 100.0), 0);
        assert_eq!(stretch(100.0, 0.0, 100.0), 255);
        assert_eq!(stretch(200.0, 0.0, 100.0), 255);
        // Inverted cuts invert the ramp
        assert_eq!(stretch(0.0, 100.0, 0.0), 255);
        assert_eq!(stretch(5.0, 5.0, 5.0), 255);
    }

    #[test]
    fn test_window_at_unit_scale_matches_data() {
        let img = ramp(4, 4);
        let mut view = ViewState::default();
        view.cut_low = 0.0;
        view.cut_high = 30.0;

        let arr = img.window_array(4, 4, &view).unwrap();
        assert_eq!(arr.dims(), (4, 4));
        assert_eq!(arr.pixel(0, 0), Some([0, 0, 0, 255]));
        assert_eq!(arr.pixel(3, 2), Some([255, 255, 255, 255]));
    }

    #[test]
    fn test_window_outside_data_uses_fill() {
        let img = ramp(2, 2).with_outside_color([1, 2, 3, 4]);
        let arr = img.window_array(6, 6, &ViewState::default()).unwrap();
        assert_eq!(arr.pixel(0, 0), Some([1, 2, 3, 4]));
        assert_eq!(arr.pixel(5, 5), Some([1, 2, 3, 4]));
    }
}
