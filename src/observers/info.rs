//! Info panel model - per-channel text fields kept in sync with viewers.
//!
//! One panel can watch several viewers, each under its own channel name.
//! The name is bound as the `chname` keyword at subscribe time, so the five
//! handlers are shared and attaching the same viewer twice is a no-op.

use std::sync::{Arc, Mutex};

use indexmap::IndexMap;
use log::debug;

use crate::core::args::{Arg, CallbackArgs, KwArgs};
use crate::core::event_bus::{Callback, HandlerResult};
use crate::entities::view_state::zoom_label;
use crate::error::Result;
use crate::viewer::Viewer;
use crate::viewer_events as ev;

/// Text shown for one channel. Every field is display-ready.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelInfo {
    pub name: String,
    pub dimensions: String,
    pub min: String,
    pub max: String,
    pub zoom: String,
    pub cut_low: String,
    pub cut_high: String,
    /// Autocuts mode
    pub cut_new: String,
    /// Autozoom mode
    pub zoom_new: String,
}

type Channels = Arc<Mutex<IndexMap<String, ChannelInfo>>>;

struct Handlers {
    image_set: Callback<Viewer>,
    cut_set: Callback<Viewer>,
    zoom_set: Callback<Viewer>,
    autocuts: Callback<Viewer>,
    autozoom: Callback<Viewer>,
}

pub struct InfoPanel {
    channels: Channels,
    handlers: Handlers,
}

impl Default for InfoPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl InfoPanel {
    pub fn new() -> Self {
        let channels: Channels = Arc::new(Mutex::new(IndexMap::new()));
        let handlers = Handlers {
            image_set: field_handler(&channels, |info, viewer, _| {
                fill_from_viewer(info, viewer);
                Ok(())
            }),
            cut_set: field_handler(&channels, |info, _, args| {
                let low = args.float(0).ok_or_else(|| anyhow::anyhow!("cut-set without low"))?;
                let high = args.float(1).ok_or_else(|| anyhow::anyhow!("cut-set without high"))?;
                info.cut_low = format!("{:.2}", low);
                info.cut_high = format!("{:.2}", high);
                Ok(())
            }),
            zoom_set: field_handler(&channels, |info, _, args| {
                let label = args.str(0).ok_or_else(|| anyhow::anyhow!("zoom-set without label"))?;
                info.zoom = label.to_string();
                Ok(())
            }),
            autocuts: field_handler(&channels, |info, _, args| {
                info.cut_new = args.str(0).unwrap_or_default().to_string();
                Ok(())
            }),
            autozoom: field_handler(&channels, |info, _, args| {
                info.zoom_new = args.str(0).unwrap_or_default().to_string();
                Ok(())
            }),
        };
        Self { channels, handlers }
    }

    /// Start tracking `viewer` under `chname`, seeding fields from its state.
    pub fn attach(&self, chname: &str, viewer: &Viewer) -> Result<()> {
        {
            let mut channels = self.channels.lock().unwrap_or_else(|e| e.into_inner());
            let info = channels.entry(chname.to_string()).or_default();
            fill_from_viewer(info, viewer);
        }

        let mut kwargs = KwArgs::new();
        kwargs.insert("chname".to_string(), Arg::from(chname));

        let bus = viewer.bus();
        let h = &self.handlers;
        for (channel, cb) in [
            (ev::IMAGE_SET, &h.image_set),
            (ev::CUT_SET, &h.cut_set),
            (ev::ZOOM_SET, &h.zoom_set),
            (ev::AUTOCUTS, &h.autocuts),
            (ev::AUTOZOOM, &h.autozoom),
        ] {
            bus.subscribe(channel, cb, vec![], kwargs.clone())?;
        }
        debug!("info panel attached to '{}'", chname);
        Ok(())
    }

    /// Forget `chname`. Handlers still registered for it become no-ops.
    pub fn detach(&self, chname: &str) -> bool {
        self.channels
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .shift_remove(chname)
            .is_some()
    }

    pub fn info(&self, chname: &str) -> Option<ChannelInfo> {
        self.channels
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(chname)
            .cloned()
    }

    pub fn channel_names(&self) -> Vec<String> {
        self.channels
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect()
    }
}

/// Handler that looks up the bound channel and applies `update` to its fields.
fn field_handler<F>(channels: &Channels, update: F) -> Callback<Viewer>
where
    F: Fn(&mut ChannelInfo, &Viewer, &CallbackArgs) -> anyhow::Result<()> + Send + Sync + 'static,
{
    let channels = Arc::clone(channels);
    Callback::new(move |viewer: &Viewer, args: &CallbackArgs| -> HandlerResult {
        let chname = args
            .kwarg("chname")
            .and_then(Arg::as_str)
            .ok_or_else(|| anyhow::anyhow!("info handler called without chname"))?;

        let mut channels = channels.lock().unwrap_or_else(|e| e.into_inner());
        let Some(info) = channels.get_mut(chname) else {
            return Ok(false);
        };
        update(info, viewer, args)?;
        Ok(true)
    })
}

fn fill_from_viewer(info: &mut ChannelInfo, viewer: &Viewer) {
    let state = viewer.state();
    let (low, high) = state.cut_levels();

    match state.image() {
        Some(image) => {
            let (w, h) = image.dimensions();
            info.name = image.name().to_string();
            info.dimensions = format!("{} x {}", w, h);
            let (min, max) = match image.minmax() {
                Some((lo, hi)) => (lo.to_string(), hi.to_string()),
                None => (String::new(), String::new()),
            };
            info.min = min;
            info.max = max;
        }
        None => {
            info.name.clear();
            info.dimensions.clear();
            info.min.clear();
            info.max.clear();
        }
    }
    info.zoom = zoom_label(state.scale_factor());
    info.cut_low = format!("{:.2}", low);
    info.cut_high = format!("{:.2}", high);
    info.cut_new = state.autocuts().to_string();
    info.zoom_new = state.autozoom().to_string();
}
