//! Viewer settings: typed keys plus a pass-through map for unknown ones.
//!
//! Settings are validated once, when the viewer is built. Keys are matched
//! case-insensitively when loading from JSON.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::surface::ChannelOrder;
use crate::error::{Result, ViewerError};

pub const DEFAULT_FONT: &str = "Sans Serif";
pub const DEFAULT_FONT_SIZE: f32 = 24.0;

/// Viewer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerSettings {
    /// Draw the pan-position crosshair
    pub show_pan_position: bool,
    /// On-screen message font family
    pub onscreen_ff: String,
    pub onscreen_font_size: f32,
    /// Crosshair color, RGBA
    pub marker_color: [u8; 4],
    /// On-screen message color, RGBA
    pub message_color: [u8; 4],
    /// Fill used when no image is set
    pub bg_color: [u8; 4],
    /// Channel order of raw output; must carry alpha
    pub rgb_order: ChannelOrder,
    /// Keys this version does not know about, kept for forward compatibility
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_json::Value>,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            show_pan_position: false,
            onscreen_ff: DEFAULT_FONT.to_string(),
            onscreen_font_size: DEFAULT_FONT_SIZE,
            marker_color: [255, 0, 0, 255],
            message_color: [255, 255, 255, 255],
            bg_color: [0, 0, 0, 255],
            rgb_order: ChannelOrder::Rgba,
            extra: IndexMap::new(),
        }
    }
}

impl ViewerSettings {
    /// Parse settings from a JSON object. Missing keys take defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| ViewerError::InvalidSettings(e.to_string()))?;

        let serde_json::Value::Object(map) = value else {
            return Err(ViewerError::InvalidSettings(
                "settings must be a JSON object".to_string(),
            ));
        };
        let lowered: serde_json::Map<String, serde_json::Value> = map
            .into_iter()
            .map(|(k, v)| (k.to_lowercase(), v))
            .collect();

        let settings: Self = serde_json::from_value(serde_json::Value::Object(lowered))
            .map_err(|e| ViewerError::InvalidSettings(e.to_string()))?;
        settings.validated()
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| ViewerError::InvalidSettings(e.to_string()))
    }

    /// Check invariants and normalise extension keys.
    pub fn validated(mut self) -> Result<Self> {
        if self.onscreen_ff.trim().is_empty() {
            return Err(ViewerError::InvalidSettings(
                "onscreen_ff must name a font family".to_string(),
            ));
        }
        if !self.onscreen_font_size.is_finite() || self.onscreen_font_size <= 0.0 {
            return Err(ViewerError::InvalidSettings(format!(
                "onscreen_font_size must be > 0, got {}",
                self.onscreen_font_size
            )));
        }
        if !self.rgb_order.has_alpha() {
            return Err(ViewerError::InvalidSettings(format!(
                "rgb_order '{}' has no alpha channel",
                self.rgb_order
            )));
        }
        self.extra = self
            .extra
            .into_iter()
            .map(|(k, v)| (k.to_lowercase(), v))
            .collect();
        Ok(self)
    }

    /// Extension value by case-insensitive key.
    pub fn extra(&self, key: &str) -> Option<&serde_json::Value> {
        self.extra.get(&key.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = ViewerSettings::default();
        assert!(!s.show_pan_position);
        assert_eq!(s.onscreen_ff, "Sans Serif");
        assert_eq!(s.rgb_order, ChannelOrder::Rgba);
        assert!(s.clone().validated().is_ok());
    }

    #[test]
    fn test_from_json_caseless_with_extra() {
        let s = ViewerSettings::from_json(
            r#"{"Show_Pan_Position": true, "rgb_order": "bgra", "Autocut_Method": "zscale"}"#,
        )
        .unwrap();
        assert!(s.show_pan_position);
        assert_eq!(s.rgb_order, ChannelOrder::Bgra);
        assert_eq!(s.extra("AUTOCUT_METHOD"), Some(&serde_json::json!("zscale")));
        assert_eq!(s.onscreen_ff, DEFAULT_FONT);
    }

    #[test]
    fn test_rejects_invalid() {
        assert!(ViewerSettings::from_json(r#"{"rgb_order": "RGB"}"#).is_err());
        assert!(ViewerSettings::from_json(r#"{"rgb_order": "XYZ"}"#).is_err());
        assert!(ViewerSettings::from_json(r#"{"onscreen_font_size": 0}"#).is_err());
        assert!(ViewerSettings::from_json("[1, 2]").is_err());

        let s = ViewerSettings {
            onscreen_ff: "  ".into(),
            ..Default::default()
        };
        assert!(matches!(s.validated(), Err(ViewerError::InvalidSettings(_))));
    }

    #[test]
    fn test_json_roundtrip_keeps_extra() {
        let s = ViewerSettings::from_json(r#"{"color_map": "gray"}"#).unwrap();
        let back = ViewerSettings::from_json(&s.to_json().unwrap()).unwrap();
        assert_eq!(back, s);
    }
}
