use clap::Parser;
use std::path::PathBuf;

// Build version with encoder info
const VERSION_INFO: &str = const_format::concatcp!(
    env!("CARGO_PKG_VERSION"), "\n",
    "Output: PNG, JPEG, TIFF, TGA\n",
    "Target: ", std::env::consts::ARCH, "-", std::env::consts::OS
);

/// Render an image through the viewer pipeline and write the composited frame
#[derive(Parser, Debug)]
#[command(author, version = VERSION_INFO, about, long_about = None)]
pub struct Args {
    /// Input image (PNG, JPEG, TIFF, TGA); displayed as a grey data plane
    #[arg(value_name = "FILE")]
    pub input: PathBuf,

    /// Output file (format taken from the extension unless --format is given)
    #[arg(short = 'o', long = "output", value_name = "OUT")]
    pub output: Option<PathBuf>,

    /// Output format: png, jpeg, tiff, tga
    #[arg(short = 'f', long = "format", value_name = "FMT")]
    pub format: Option<String>,

    /// JPEG quality (0-100)
    #[arg(short = 'q', long = "quality", value_name = "Q", default_value_t = 90)]
    pub quality: u8,

    /// Cut levels
    #[arg(long = "cuts", value_names = ["LOW", "HIGH"], num_args = 2, allow_negative_numbers = true)]
    pub cuts: Option<Vec<f64>>,

    /// Zoom factor applied to both axes
    #[arg(short = 'z', long = "zoom", value_name = "SCALE")]
    pub zoom: Option<f64>,

    /// Window size (defaults to the image size)
    #[arg(long = "size", value_names = ["W", "H"], num_args = 2)]
    pub size: Option<Vec<usize>>,

    /// Draw the pan-position crosshair
    #[arg(short = 'm', long = "pan-marker")]
    pub pan_marker: bool,

    /// On-screen message
    #[arg(long = "message", value_name = "TEXT")]
    pub message: Option<String>,

    /// Viewer settings JSON file
    #[arg(short = 's', long = "settings", value_name = "JSON")]
    pub settings: Option<PathBuf>,

    /// Write raw packed pixels (settings rgb_order) instead of an encoded image
    #[arg(long = "raw")]
    pub raw: bool,

    /// Log to file instead of stderr
    #[arg(short = 'l', long = "log", value_name = "LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Increase logging verbosity (default: warn, -v: info, -vv: debug, -vvv+: trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbosity: u8,
}
