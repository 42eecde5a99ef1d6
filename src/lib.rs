//! fitsview - image viewer core
//!
//! Re-exports all modules for use by binary targets.

// Core plumbing (callback bus, args, timers)
pub mod core;

// View model, compositing, output
pub mod entities;
pub mod error;
pub mod output;
pub mod viewer;
pub mod viewer_events;

// Observers and the command-line front end
pub mod cli;
pub mod observers;

// Re-export commonly used types from core
pub use crate::core::args::{Arg, CallbackArgs, KwArgs};
pub use crate::core::event_bus::{Callback, EventBus, HandlerResult, Outcome};
pub use crate::core::timer::{DeadlineTimer, MessageTimer};

// Re-export entities
pub use entities::{
    ChannelOrder, CursorHandle, ImageSource, RasterImage, RgbArray, Surface, SurfaceCompositor,
    ViewState, ViewerSettings,
};
pub use error::{Result, ViewerError};
pub use output::{HostWidget, OutputFormat};
pub use viewer::Viewer;
