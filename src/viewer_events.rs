//! Channels published by [`Viewer`](crate::viewer::Viewer).
//!
//! Every handler receives the publishing viewer first, then the positional
//! arguments listed here, then whatever it bound at subscribe time.

/// A new image was set. Args: `(name: Str)`.
pub const IMAGE_SET: &str = "image-set";

/// Cut levels changed. Args: `(low: Float, high: Float)`.
pub const CUT_SET: &str = "cut-set";

/// Scale changed. Args: `(zoom_label: Str, scale_factor: Float)`.
pub const ZOOM_SET: &str = "zoom-set";

/// Autocuts mode label changed. Args: `(mode: Str)`.
pub const AUTOCUTS: &str = "autocuts";

/// Autozoom mode label changed. Args: `(mode: Str)`.
pub const AUTOZOOM: &str = "autozoom";

/// Window size configured. Args: `(size: Size)`.
pub const CONFIGURE: &str = "configure";

/// Pan position changed. Args: `(x: Float, y: Float)`.
pub const PAN_SET: &str = "pan-set";

/// Pan marker toggled. Args: `(shown: Bool)`.
pub const PAN_MARKER_SET: &str = "pan-marker-set";

/// Everything a viewer enables at construction.
pub const ALL: &[&str] = &[
    IMAGE_SET,
    CUT_SET,
    ZOOM_SET,
    AUTOCUTS,
    AUTOZOOM,
    CONFIGURE,
    PAN_SET,
    PAN_MARKER_SET,
];
