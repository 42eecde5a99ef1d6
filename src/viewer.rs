//! Viewer - owns the view state, the surface and the event bus of one view.
//!
//! Every mutating call follows the same sequence:
//! 1. build a candidate [`ViewState`]
//! 2. fetch the window array for it (full redraws only)
//! 3. commit, composite, paint the host widget
//! 4. publish on the matching channel
//!
//! A failure in step 2 leaves the committed state, the surface and the bus
//! untouched. Handlers get `&Viewer`, so they can read the new state but
//! cannot mutate the view from inside a publish.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, info, trace};

use crate::core::args::{Arg, CallbackArgs};
use crate::core::event_bus::{EventBus, Outcome};
use crate::core::timer::{DeadlineTimer, MessageTimer};
use crate::entities::compositor::{Overlays, SurfaceCompositor};
use crate::entities::settings::ViewerSettings;
use crate::entities::surface::{RgbArray, Surface};
use crate::entities::view_state::{zoom_label, CursorHandle, ImageSource, OnscreenMessage, ViewState};
use crate::error::{Result, ViewerError};
use crate::output::{self, HostWidget, OutputFormat};
use crate::viewer_events as ev;

/// Log target for handler failures on the viewer's bus.
pub const BUS_LOG_TARGET: &str = "fitsview::callbacks";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Redraw {
    /// Refetch the window array from the image source
    Full,
    /// Re-composite the cached window array
    Overlays,
}

pub struct Viewer {
    state: ViewState,
    settings: ViewerSettings,
    surface: Option<Surface>,
    /// Last window array, reused by overlay-only redraws
    window: Option<RgbArray>,
    compositor: SurfaceCompositor,
    bus: EventBus<Viewer>,
    timer: Box<dyn MessageTimer>,
    widget: Option<Box<dyn HostWidget>>,
}

impl Viewer {
    /// Build a viewer with every channel in [`viewer_events::ALL`](ev::ALL) enabled.
    pub fn new(settings: ViewerSettings) -> Result<Self> {
        let settings = settings.validated()?;

        let bus = EventBus::with_logger(BUS_LOG_TARGET);
        for channel in ev::ALL {
            bus.enable(channel);
        }

        let state = ViewState {
            show_pan_marker: settings.show_pan_position,
            ..ViewState::default()
        };

        Ok(Self {
            state,
            compositor: SurfaceCompositor::new(&settings),
            settings,
            surface: None,
            window: None,
            bus,
            timer: Box::new(DeadlineTimer::new()),
            widget: None,
        })
    }

    /// Replace the message timer (host toolkit timer, test clock).
    pub fn with_timer(mut self, timer: impl MessageTimer + 'static) -> Self {
        self.timer = Box::new(timer);
        self
    }

    pub fn set_widget(&mut self, widget: Box<dyn HostWidget>) {
        self.widget = Some(widget);
    }

    // ========== Accessors ==========

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn settings(&self) -> &ViewerSettings {
        &self.settings
    }

    /// Shared handle to the bus; subscribe observers through it.
    pub fn bus(&self) -> &EventBus<Viewer> {
        &self.bus
    }

    pub fn image(&self) -> Option<Arc<dyn ImageSource>> {
        self.state.image()
    }

    pub fn window_size(&self) -> Option<(usize, usize)> {
        self.surface.as_ref().map(Surface::dims)
    }

    /// The composited frame.
    pub fn surface(&self) -> Result<&Surface> {
        self.surface.as_ref().ok_or(ViewerError::NoSurface)
    }

    // ========== State mutation ==========

    /// Allocate a `width` x `height` surface and render into it.
    pub fn configure_surface(&mut self, width: usize, height: usize) -> Result<Outcome> {
        if width == 0 || height == 0 {
            return Err(ViewerError::InvalidSettings(format!(
                "window size must be non-zero, got {}x{}",
                width, height
            )));
        }

        let window = self.fetch_window(&self.state, width, height)?;
        self.surface = Some(Surface::new(width, height));
        self.window = Some(window);
        self.composite()?;

        debug!("configured {}x{} surface", width, height);
        Ok(self.publish(ev::CONFIGURE, vec![Arg::Size(width, height)]))
    }

    /// Set cut levels. Order is not enforced; low > high inverts the mapping.
    pub fn set_cut_levels(&mut self, low: f64, high: f64) -> Result<Outcome> {
        if !low.is_finite() || !high.is_finite() {
            return Err(ViewerError::InvalidCutLevels { low, high });
        }
        let mut candidate = self.state.clone();
        candidate.cut_low = low;
        candidate.cut_high = high;
        self.commit(candidate, Redraw::Full)?;

        Ok(self.publish(ev::CUT_SET, vec![Arg::from(low), Arg::from(high)]))
    }

    pub fn set_scale(&mut self, scale_x: f64, scale_y: f64) -> Result<Outcome> {
        let valid = |s: f64| s.is_finite() && s > 0.0;
        if !valid(scale_x) || !valid(scale_y) {
            return Err(ViewerError::InvalidScale { sx: scale_x, sy: scale_y });
        }
        let mut candidate = self.state.clone();
        candidate.scale_x = scale_x;
        candidate.scale_y = scale_y;
        self.commit(candidate, Redraw::Full)?;

        let factor = self.state.scale_factor();
        Ok(self.publish(ev::ZOOM_SET, vec![Arg::from(zoom_label(factor)), Arg::from(factor)]))
    }

    /// Show `image`. Only a weak handle is kept; the caller owns the image.
    pub fn set_image(&mut self, image: &Arc<dyn ImageSource>) -> Result<Outcome> {
        let mut candidate = self.state.clone();
        candidate.image = Some(Arc::downgrade(image));
        self.commit(candidate, Redraw::Full)?;

        let (w, h) = image.dimensions();
        info!("image set: '{}' ({}x{})", image.name(), w, h);
        Ok(self.publish(ev::IMAGE_SET, vec![Arg::from(image.name())]))
    }

    /// Pan position, as an offset of the window center from the image center.
    pub fn set_pan(&mut self, x: f64, y: f64) -> Result<Outcome> {
        if !x.is_finite() || !y.is_finite() {
            return Err(ViewerError::InvalidPan { x, y });
        }
        let mut candidate = self.state.clone();
        candidate.pan_x = x;
        candidate.pan_y = y;
        self.commit(candidate, Redraw::Full)?;

        Ok(self.publish(ev::PAN_SET, vec![Arg::from(x), Arg::from(y)]))
    }

    /// Record the autocuts mode label. Nothing is redrawn.
    pub fn set_autocuts_mode(&mut self, mode: &str) -> Outcome {
        self.state.autocuts = mode.to_string();
        self.publish(ev::AUTOCUTS, vec![Arg::from(mode)])
    }

    /// Record the autozoom mode label. Nothing is redrawn.
    pub fn set_autozoom_mode(&mut self, mode: &str) -> Outcome {
        self.state.autozoom = mode.to_string();
        self.publish(ev::AUTOZOOM, vec![Arg::from(mode)])
    }

    pub fn toggle_pan_marker(&mut self, show: bool) -> Result<Outcome> {
        let mut candidate = self.state.clone();
        candidate.show_pan_marker = show;
        self.commit(candidate, Redraw::Overlays)?;

        Ok(self.publish(ev::PAN_MARKER_SET, vec![Arg::from(show)]))
    }

    /// Show `text` on screen, for `delay` if given, otherwise until replaced.
    ///
    /// Any pending expiry is cancelled first. Publishes nothing.
    pub fn show_message(&mut self, text: &str, delay: Option<Duration>) -> Result<()> {
        self.timer.cancel();

        let mut candidate = self.state.clone();
        candidate.message = Some(OnscreenMessage {
            text: text.to_string(),
            expires_at: delay.map(|d| Instant::now() + d),
        });
        self.commit(candidate, Redraw::Overlays)?;

        if let Some(delay) = delay {
            self.timer.start(delay);
        }
        Ok(())
    }

    pub fn clear_message(&mut self) -> Result<()> {
        self.timer.cancel();
        let mut candidate = self.state.clone();
        candidate.message = None;
        self.commit(candidate, Redraw::Overlays)
    }

    // ========== Cursors ==========

    /// Register `cursor` for `kind`, replacing any earlier one.
    pub fn define_cursor(&mut self, kind: &str, cursor: CursorHandle) {
        self.state.cursors.insert(kind.to_string(), cursor);
    }

    pub fn cursor(&self, kind: &str) -> Option<&CursorHandle> {
        self.state.cursor(kind)
    }

    /// Ask the host widget to show the cursor registered for `kind`.
    pub fn switch_cursor(&mut self, kind: &str) -> Result<()> {
        let cursor = self
            .state
            .cursor(kind)
            .ok_or_else(|| ViewerError::UnknownCursor(kind.to_string()))?;
        if let Some(widget) = self.widget.as_mut() {
            widget.set_cursor(cursor);
        }
        Ok(())
    }

    // ========== Redraw ==========

    /// Refetch the window array and re-composite.
    pub fn redraw(&mut self) -> Result<()> {
        if self.surface.is_none() {
            return Err(ViewerError::NoSurface);
        }
        self.commit(self.state.clone(), Redraw::Full)
    }

    /// Poll the message timer. Returns true if an expired message was cleared.
    pub fn tick(&mut self) -> Result<bool> {
        if !self.timer.fired() {
            return Ok(false);
        }
        trace!("message timer fired");
        self.state.message = None;
        self.composite()?;
        Ok(true)
    }

    // ========== Output ==========

    pub fn get_rgb_image_as_bytes(&self, format: OutputFormat, quality: u8) -> Result<Vec<u8>> {
        output::encode(self.surface()?, format, quality)
    }

    /// Save the frame. Without an explicit format it is taken from the extension.
    pub fn save_rgb_image_as_file(
        &self,
        path: &Path,
        format: Option<OutputFormat>,
        quality: u8,
    ) -> Result<()> {
        let surface = self.surface()?;
        let format = match format {
            Some(f) => f,
            None => OutputFormat::from_path(path)?,
        };
        output::save(surface, path, format, quality)
    }

    /// Packed copy of the frame in the configured `rgb_order`.
    pub fn get_image_as_array(&self) -> Result<Vec<u8>> {
        output::to_raw_array(self.surface()?, self.settings.rgb_order)
    }

    /// Paint the current frame onto the host widget, if one is attached.
    pub fn write_to_widget(&mut self) -> Result<bool> {
        let surface = self.surface.as_ref().ok_or(ViewerError::NoSurface)?;
        Ok(match self.widget.as_mut() {
            Some(widget) => output::write_to_widget(surface, widget.as_mut()),
            None => false,
        })
    }

    // ========== Internals ==========

    fn fetch_window(&self, state: &ViewState, width: usize, height: usize) -> Result<RgbArray> {
        let Some(image) = state.image() else {
            return Ok(RgbArray::filled(width, height, self.settings.bg_color));
        };
        let array = image
            .window_array(width, height, state)
            .map_err(ViewerError::Source)?;
        if array.dims() != (width, height) {
            return Err(ViewerError::ArrayShapeMismatch {
                expected: (width, height),
                actual: array.dims(),
            });
        }
        Ok(array)
    }

    fn commit(&mut self, candidate: ViewState, redraw: Redraw) -> Result<()> {
        let window = match (&self.surface, redraw) {
            (Some(surface), Redraw::Full) => {
                Some(self.fetch_window(&candidate, surface.width(), surface.height())?)
            }
            _ => None,
        };

        self.state = candidate;
        if window.is_some() {
            self.window = window;
        }
        self.composite()
    }

    fn composite(&mut self) -> Result<()> {
        let (Some(surface), Some(window)) = (self.surface.as_mut(), self.window.as_ref()) else {
            return Ok(());
        };
        let overlays = Overlays {
            pan_marker: self.state.show_pan_marker,
            message: self.state.visible_message(Instant::now()),
        };
        self.compositor.render(surface, window, &overlays)?;

        if let Some(widget) = self.widget.as_mut() {
            output::write_to_widget(surface, widget.as_mut());
        }
        Ok(())
    }

    fn publish(&self, channel: &str, args: Vec<Arg>) -> Outcome {
        let outcome = self.bus.publish(self, channel, CallbackArgs::new(args));
        trace!("published '{}': {:?}", channel, outcome);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::args::KwArgs;
    use crate::core::event_bus::Callback;
    use crate::entities::compositor::PAN_MARKER_HALF_LEN;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    const GREY: [u8; 4] = [40, 40, 40, 255];
    const RED: [u8; 4] = [255, 0, 0, 255];

    /// Uniform image; optionally broken or returning the wrong size.
    struct Solid {
        rgba: [u8; 4],
        fail: bool,
        wrong_size: bool,
    }

    fn solid(rgba: [u8; 4]) -> Arc<dyn ImageSource> {
        Arc::new(Solid { rgba, fail: false, wrong_size: false })
    }

    impl ImageSource for Solid {
        fn name(&self) -> &str {
            "solid.fits"
        }

        fn dimensions(&self) -> (usize, usize) {
            (16, 16)
        }

        fn window_array(&self, width: usize, height: usize, _view: &ViewState) -> anyhow::Result<RgbArray> {
            anyhow::ensure!(!self.fail, "source unavailable");
            let width = if self.wrong_size { width + 1 } else { width };
            Ok(RgbArray::filled(width, height, self.rgba))
        }
    }

    fn viewer() -> Viewer {
        Viewer::new(ViewerSettings::default()).unwrap()
    }

    fn recorder(v: &Viewer, channel: &str) -> Arc<Mutex<Vec<Vec<Arg>>>> {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let c = Arc::clone(&calls);
        let cb = Callback::new(move |_: &Viewer, a: &CallbackArgs| {
            c.lock().unwrap().push(a.args.clone());
            Ok(true)
        });
        v.bus().subscribe(channel, &cb, vec![], KwArgs::new()).unwrap();
        calls
    }

    #[test]
    fn test_all_channels_enabled() {
        let v = viewer();
        for channel in ev::ALL {
            assert_eq!(v.bus().subscriber_count(channel), Some(0), "{}", channel);
        }
    }

    #[test]
    fn test_cut_levels_published_once() {
        let mut v = viewer();
        let calls = recorder(&v, ev::CUT_SET);

        let outcome = v.set_cut_levels(10.0, 250.0).unwrap();
        assert!(outcome.any_true());
        assert_eq!(*calls.lock().unwrap(), vec![vec![Arg::from(10.0), Arg::from(250.0)]]);
        assert_eq!(v.state().cut_levels(), (10.0, 250.0));
    }

    #[test]
    fn test_handler_sees_committed_state() {
        let mut v = viewer();
        let seen = Arc::new(Mutex::new(None));
        let s = Arc::clone(&seen);
        let cb = Callback::new(move |viewer: &Viewer, _: &CallbackArgs| {
            *s.lock().unwrap() = Some(viewer.state().cut_levels());
            Ok(true)
        });
        v.bus().subscribe(ev::CUT_SET, &cb, vec![], KwArgs::new()).unwrap();

        v.set_cut_levels(300.0, 20.0).unwrap();
        assert_eq!(*seen.lock().unwrap(), Some((300.0, 20.0)));
    }

    #[test]
    fn test_invalid_scale_leaves_state() {
        let mut v = viewer();
        v.set_scale(2.0, 2.0).unwrap();
        let calls = recorder(&v, ev::ZOOM_SET);

        for (sx, sy) in [(0.0, 1.0), (-1.0, 1.0), (1.0, f64::NAN), (f64::INFINITY, 1.0)] {
            assert!(matches!(
                v.set_scale(sx, sy),
                Err(ViewerError::InvalidScale { .. })
            ));
        }
        assert_eq!(v.state().scale(), (2.0, 2.0));
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_zoom_event_args() {
        let mut v = viewer();
        let calls = recorder(&v, ev::ZOOM_SET);
        v.set_scale(0.5, 0.25).unwrap();
        v.set_scale(1.0, 3.0).unwrap();
        assert_eq!(
            *calls.lock().unwrap(),
            vec![
                vec![Arg::from("1/2x"), Arg::from(0.5)],
                vec![Arg::from("3x"), Arg::from(3.0)],
            ]
        );
    }

    #[test]
    fn test_invalid_cut_levels_and_pan() {
        let mut v = viewer();
        assert!(matches!(
            v.set_cut_levels(f64::NAN, 1.0),
            Err(ViewerError::InvalidCutLevels { .. })
        ));
        assert!(matches!(
            v.set_pan(0.0, f64::INFINITY),
            Err(ViewerError::InvalidPan { .. })
        ));
        assert_eq!(v.state().cut_levels(), (0.0, 255.0));
        assert_eq!(v.state().pan(), (0.0, 0.0));
    }

    #[test]
    fn test_output_before_configure_is_no_surface() {
        let mut v = viewer();
        assert!(matches!(
            v.get_rgb_image_as_bytes(OutputFormat::Png, 90),
            Err(ViewerError::NoSurface)
        ));
        assert!(matches!(v.get_image_as_array(), Err(ViewerError::NoSurface)));
        assert!(matches!(v.redraw(), Err(ViewerError::NoSurface)));
        assert!(matches!(v.write_to_widget(), Err(ViewerError::NoSurface)));
        // Setters still work without a surface
        assert!(v.set_cut_levels(1.0, 2.0).is_ok());
    }

    #[test]
    fn test_configure_publishes_size() {
        let mut v = viewer();
        let calls = recorder(&v, ev::CONFIGURE);
        v.configure_surface(40, 30).unwrap();
        assert_eq!(v.window_size(), Some((40, 30)));
        assert_eq!(*calls.lock().unwrap(), vec![vec![Arg::Size(40, 30)]]);

        assert!(v.configure_surface(0, 30).is_err());
        assert_eq!(v.window_size(), Some((40, 30)));
    }

    #[test]
    fn test_empty_viewer_fills_background() {
        let mut v = viewer();
        v.configure_surface(4, 4).unwrap();
        let surface = v.surface().unwrap();
        assert!(surface.as_raw().chunks_exact(4).all(|px| px == [0, 0, 0, 255]));
    }

    #[test]
    fn test_pan_marker_on_100x100() {
        let mut v = viewer();
        let image = solid(GREY);
        v.configure_surface(100, 100).unwrap();
        v.set_image(&image).unwrap();
        let calls = recorder(&v, ev::PAN_MARKER_SET);

        v.toggle_pan_marker(true).unwrap();
        let s = v.surface().unwrap();
        let half = PAN_MARKER_HALF_LEN as usize;
        assert_eq!(s.pixel(50, 50), Some(RED));
        assert_eq!(s.pixel(50 - half, 50), Some(RED));
        assert_eq!(s.pixel(50 + half, 50), Some(RED));
        assert_eq!(s.pixel(50, 50 - half), Some(RED));
        assert_eq!(s.pixel(50, 50 + half), Some(RED));
        assert_eq!(s.pixel(50 + half + 1, 50), Some(GREY));

        v.toggle_pan_marker(false).unwrap();
        let s = v.surface().unwrap();
        assert!(s.as_raw().chunks_exact(4).all(|px| px == GREY));
        assert_eq!(
            *calls.lock().unwrap(),
            vec![vec![Arg::from(true)], vec![Arg::from(false)]]
        );
    }

    #[test]
    fn test_pan_marker_from_settings() {
        let settings = ViewerSettings {
            show_pan_position: true,
            ..ViewerSettings::default()
        };
        let mut v = Viewer::new(settings).unwrap();
        v.configure_surface(30, 30).unwrap();
        assert!(v.state().show_pan_marker());
        assert_eq!(v.surface().unwrap().pixel(15, 15), Some(RED));
    }

    #[test]
    fn test_image_set_weak_handle() {
        let mut v = viewer();
        v.configure_surface(8, 8).unwrap();
        let calls = recorder(&v, ev::IMAGE_SET);

        let image = solid(GREY);
        v.set_image(&image).unwrap();
        assert_eq!(*calls.lock().unwrap(), vec![vec![Arg::from("solid.fits")]]);
        assert_eq!(v.image().map(|i| i.name().to_string()), Some("solid.fits".into()));
        assert_eq!(v.surface().unwrap().pixel(0, 0), Some(GREY));

        // The viewer never keeps the image alive
        drop(image);
        assert!(v.image().is_none());
        v.redraw().unwrap();
        assert_eq!(v.surface().unwrap().pixel(0, 0), Some([0, 0, 0, 255]));
    }

    #[test]
    fn test_source_failure_is_atomic() {
        let mut v = viewer();
        v.configure_surface(8, 8).unwrap();
        let good = solid(GREY);
        v.set_image(&good).unwrap();
        let before = v.surface().unwrap().clone();

        let broken: Arc<dyn ImageSource> =
            Arc::new(Solid { rgba: RED, fail: true, wrong_size: false });
        let calls = recorder(&v, ev::IMAGE_SET);
        assert!(matches!(v.set_image(&broken), Err(ViewerError::Source(_))));
        assert_eq!(v.image().map(|i| Arc::ptr_eq(&i, &good)), Some(true));
        assert_eq!(v.surface().unwrap(), &before);
        assert!(calls.lock().unwrap().is_empty());

        let skewed: Arc<dyn ImageSource> =
            Arc::new(Solid { rgba: RED, fail: false, wrong_size: true });
        assert!(matches!(
            v.set_image(&skewed),
            Err(ViewerError::ArrayShapeMismatch { expected: (8, 8), actual: (9, 8) })
        ));
        assert_eq!(v.surface().unwrap(), &before);
    }

    #[test]
    fn test_mode_labels_publish_without_redraw() {
        let mut v = viewer();
        let cuts = recorder(&v, ev::AUTOCUTS);
        let zoom = recorder(&v, ev::AUTOZOOM);
        v.set_autocuts_mode("zscale");
        v.set_autozoom_mode("on");
        assert_eq!(v.state().autocuts(), "zscale");
        assert_eq!(v.state().autozoom(), "on");
        assert_eq!(*cuts.lock().unwrap(), vec![vec![Arg::from("zscale")]]);
        assert_eq!(*zoom.lock().unwrap(), vec![vec![Arg::from("on")]]);
    }

    #[derive(Default)]
    struct TimerLog {
        starts: Vec<Duration>,
        cancels: usize,
        armed: bool,
        expire: bool,
    }

    /// Test clock: fires only when the test says so.
    struct FakeTimer(Arc<Mutex<TimerLog>>);

    impl MessageTimer for FakeTimer {
        fn start(&mut self, delay: Duration) {
            let mut log = self.0.lock().unwrap();
            log.starts.push(delay);
            log.armed = true;
        }

        fn cancel(&mut self) {
            let mut log = self.0.lock().unwrap();
            log.cancels += 1;
            log.armed = false;
        }

        fn fired(&mut self) -> bool {
            let mut log = self.0.lock().unwrap();
            if log.armed && log.expire {
                log.armed = false;
                return true;
            }
            false
        }

        fn is_pending(&self) -> bool {
            self.0.lock().unwrap().armed
        }
    }

    #[test]
    fn test_message_timer_lifecycle() {
        let log = Arc::new(Mutex::new(TimerLog::default()));
        let mut v = viewer().with_timer(FakeTimer(Arc::clone(&log)));
        v.configure_surface(200, 120).unwrap();
        let blank = v.surface().unwrap().clone();

        v.show_message("first", Some(Duration::from_secs(5))).unwrap();
        v.show_message("Zoom 2x", Some(Duration::from_secs(5))).unwrap();
        {
            let log = log.lock().unwrap();
            assert_eq!(log.starts.len(), 2);
            assert_eq!(log.cancels, 2, "each show cancels the pending expiry");
        }
        assert_eq!(v.state().message().map(|m| m.text.as_str()), Some("Zoom 2x"));

        assert!(!v.tick().unwrap(), "not yet expired");
        log.lock().unwrap().expire = true;
        assert!(v.tick().unwrap());
        assert!(v.state().message().is_none());
        assert_eq!(v.surface().unwrap(), &blank);
        assert!(!v.tick().unwrap(), "fires once");
    }

    #[test]
    fn test_message_without_delay_never_arms_timer() {
        let log = Arc::new(Mutex::new(TimerLog::default()));
        let mut v = viewer().with_timer(FakeTimer(Arc::clone(&log)));
        v.show_message("sticky", None).unwrap();
        assert!(log.lock().unwrap().starts.is_empty());
        v.clear_message().unwrap();
        assert!(v.state().message().is_none());
    }

    struct Widget {
        paints: Arc<AtomicUsize>,
        cursors: Arc<Mutex<Vec<CursorHandle>>>,
    }

    impl HostWidget for Widget {
        fn paint(&mut self, pixels: &[u8], width: usize, height: usize) -> bool {
            assert_eq!(pixels.len(), width * height * 4);
            self.paints.fetch_add(1, Ordering::SeqCst);
            true
        }

        fn set_cursor(&mut self, cursor: &CursorHandle) {
            self.cursors.lock().unwrap().push(cursor.clone());
        }
    }

    #[test]
    fn test_widget_painted_and_cursor_switched() {
        let paints = Arc::new(AtomicUsize::new(0));
        let cursors = Arc::new(Mutex::new(Vec::new()));
        let mut v = viewer();
        v.set_widget(Box::new(Widget {
            paints: Arc::clone(&paints),
            cursors: Arc::clone(&cursors),
        }));

        v.configure_surface(10, 10).unwrap();
        assert_eq!(paints.load(Ordering::SeqCst), 1);
        assert!(v.write_to_widget().unwrap());
        assert_eq!(paints.load(Ordering::SeqCst), 2);

        assert!(matches!(
            v.switch_cursor("pan"),
            Err(ViewerError::UnknownCursor(k)) if k == "pan"
        ));
        let hand = CursorHandle::new("hand2");
        v.define_cursor("pan", hand.clone());
        v.switch_cursor("pan").unwrap();
        assert!(v.cursor("pan").is_some_and(|c| c.same(&hand)));
        assert!(cursors.lock().unwrap()[0].same(&hand));
    }

    #[test]
    fn test_raw_array_uses_configured_order() {
        let settings = ViewerSettings {
            rgb_order: crate::entities::surface::ChannelOrder::Bgra,
            ..ViewerSettings::default()
        };
        let mut v = Viewer::new(settings).unwrap();
        v.configure_surface(2, 2).unwrap();
        let image = solid([10, 20, 30, 255]);
        v.set_image(&image).unwrap();

        let raw = v.get_image_as_array().unwrap();
        assert_eq!(raw.len(), 2 * 2 * 4);
        assert_eq!(&raw[..4], &[30, 20, 10, 255]);
    }

    #[test]
    fn test_encode_png_after_configure() {
        let mut v = viewer();
        v.configure_surface(16, 16).unwrap();
        let bytes = v.get_rgb_image_as_bytes(OutputFormat::Png, 90).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
        assert_eq!(bytes, v.get_rgb_image_as_bytes(OutputFormat::Png, 90).unwrap());
    }
}
