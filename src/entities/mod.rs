//! Entities - view state, pixel buffers and the compositor
//!
//! Pure data plus the algorithms that paint it. Nothing here publishes
//! events; [`Viewer`](crate::viewer::Viewer) pairs mutations with the bus.

pub mod compositor;
pub mod raster;
pub mod settings;
pub mod surface;
pub mod text;
pub mod view_state;

pub use compositor::{Overlays, SurfaceCompositor};
pub use raster::RasterImage;
pub use settings::ViewerSettings;
pub use surface::{ChannelOrder, RgbArray, Surface};
pub use view_state::{zoom_label, CursorHandle, ImageSource, OnscreenMessage, ViewState};
