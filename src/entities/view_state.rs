//! Observable state of one image view.
//!
//! Fields are read-only from outside the crate; every mutation goes through
//! [`Viewer`](crate::viewer::Viewer), which pairs it with a bus publish.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Instant;

use super::surface::RgbArray;

/// Upstream producer of window-sized pixels.
///
/// Scaling, panning, and cut-level colour mapping all happen here; the
/// compositor only blits what it is given.
pub trait ImageSource: Send + Sync {
    fn name(&self) -> &str;

    /// Data dimensions (width, height).
    fn dimensions(&self) -> (usize, usize);

    /// Data value range, if known.
    fn minmax(&self) -> Option<(f64, f64)> {
        None
    }

    /// Render a `width` x `height` window of this image as seen through `view`.
    fn window_array(&self, width: usize, height: usize, view: &ViewState) -> anyhow::Result<RgbArray>;
}

/// Opaque toolkit cursor, stored and handed back untouched.
#[derive(Clone)]
pub struct CursorHandle(Arc<dyn Any + Send + Sync>);

impl CursorHandle {
    pub fn new<T: Any + Send + Sync>(cursor: T) -> Self {
        Self(Arc::new(cursor))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    pub fn same(&self, other: &CursorHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for CursorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CursorHandle(..)")
    }
}

/// Text overlay with optional expiry.
#[derive(Debug, Clone, PartialEq)]
pub struct OnscreenMessage {
    pub text: String,
    pub expires_at: Option<Instant>,
}

impl OnscreenMessage {
    pub fn is_visible(&self, now: Instant) -> bool {
        !self.text.is_empty() && self.expires_at.is_none_or(|t| now < t)
    }
}

/// Zoom, cuts, pan, cursors, message, and the current image of one view.
#[derive(Clone)]
pub struct ViewState {
    pub(crate) scale_x: f64,
    pub(crate) scale_y: f64,
    pub(crate) cut_low: f64,
    pub(crate) cut_high: f64,
    pub(crate) pan_x: f64,
    pub(crate) pan_y: f64,
    pub(crate) image: Option<Weak<dyn ImageSource>>,
    pub(crate) message: Option<OnscreenMessage>,
    pub(crate) cursors: HashMap<String, CursorHandle>,
    pub(crate) show_pan_marker: bool,
    pub(crate) autocuts: String,
    pub(crate) autozoom: String,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            scale_x: 1.0,
            scale_y: 1.0,
            cut_low: 0.0,
            cut_high: 255.0,
            pan_x: 0.0,
            pan_y: 0.0,
            image: None,
            message: None,
            cursors: HashMap::new(),
            show_pan_marker: false,
            autocuts: "off".to_string(),
            autozoom: "off".to_string(),
        }
    }
}

impl fmt::Debug for ViewState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let image = self.image().map(|img| img.name().to_string());
        f.debug_struct("ViewState")
            .field("scale", &(self.scale_x, self.scale_y))
            .field("cuts", &(self.cut_low, self.cut_high))
            .field("pan", &(self.pan_x, self.pan_y))
            .field("image", &image)
            .field("message", &self.message)
            .field("cursors", &self.cursors.keys().collect::<Vec<_>>())
            .field("show_pan_marker", &self.show_pan_marker)
            .field("autocuts", &self.autocuts)
            .field("autozoom", &self.autozoom)
            .finish()
    }
}

impl ViewState {
    pub fn scale(&self) -> (f64, f64) {
        (self.scale_x, self.scale_y)
    }

    /// Single zoom factor reported to observers: the larger axis scale.
    pub fn scale_factor(&self) -> f64 {
        self.scale_x.max(self.scale_y)
    }

    pub fn cut_levels(&self) -> (f64, f64) {
        (self.cut_low, self.cut_high)
    }

    pub fn pan(&self) -> (f64, f64) {
        (self.pan_x, self.pan_y)
    }

    /// Current image, if one is set and its owner still holds it.
    pub fn image(&self) -> Option<Arc<dyn ImageSource>> {
        self.image.as_ref().and_then(Weak::upgrade)
    }

    pub fn message(&self) -> Option<&OnscreenMessage> {
        self.message.as_ref()
    }

    pub fn visible_message(&self, now: Instant) -> Option<&str> {
        self.message
            .as_ref()
            .filter(|m| m.is_visible(now))
            .map(|m| m.text.as_str())
    }

    pub fn cursor(&self, kind: &str) -> Option<&CursorHandle> {
        self.cursors.get(kind)
    }

    pub fn show_pan_marker(&self) -> bool {
        self.show_pan_marker
    }

    pub fn autocuts(&self) -> &str {
        &self.autocuts
    }

    pub fn autozoom(&self) -> &str {
        &self.autozoom
    }
}

/// Human-readable zoom label: "2x", "1.5x", "1/3x".
pub fn zoom_label(scale: f64) -> String {
    fn trim(v: f64) -> String {
        let s = format!("{:.2}", v);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }

    if scale >= 1.0 {
        format!("{}x", trim(scale))
    } else {
        format!("1/{}x", trim(1.0 / scale))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_zoom_label() {
        assert_eq!(zoom_label(1.0), "1x");
        assert_eq!(zoom_label(2.0), "2x");
        assert_eq!(zoom_label(2.5), "2.5x");
        assert_eq!(zoom_label(1.0 / 3.0), "1/3x");
        assert_eq!(zoom_label(0.25), "1/4x");
        assert_eq!(zoom_label(10.0), "10x");
    }

    #[test]
    fn test_message_visibility() {
        let now = Instant::now();
        let forever = OnscreenMessage {
            text: "hello".into(),
            expires_at: None,
        };
        assert!(forever.is_visible(now));

        let expired = OnscreenMessage {
            text: "bye".into(),
            expires_at: Some(now),
        };
        assert!(!expired.is_visible(now));
        assert!(expired.is_visible(now - Duration::from_millis(1)));

        let empty = OnscreenMessage {
            text: String::new(),
            expires_at: None,
        };
        assert!(!empty.is_visible(now));
    }

    #[test]
    fn test_cursor_handle_roundtrip() {
        let h = CursorHandle::new(42u32);
        assert_eq!(h.downcast_ref::<u32>(), Some(&42));
        assert!(h.downcast_ref::<String>().is_none());
        assert!(h.same(&h.clone()));
        assert!(!h.same(&CursorHandle::new(42u32)));
    }

    #[test]
    fn test_defaults() {
        let s = ViewState::default();
        assert_eq!(s.scale(), (1.0, 1.0));
        assert_eq!(s.scale_factor(), 1.0);
        assert!(s.image().is_none());
        assert!(!s.show_pan_marker());
    }
}
