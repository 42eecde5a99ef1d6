use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::Parser;
use log::{debug, info};

use fitsview::cli::Args;
use fitsview::observers::InfoPanel;
use fitsview::output::OutputFormat;
use fitsview::{ImageSource, RasterImage, Viewer, ViewerSettings};

fn init_logging(args: &Args) -> anyhow::Result<()> {
    // 0 (default) = warn, 1 (-v) = info, 2 (-vv) = debug, 3+ (-vvv) = trace
    let log_level = match args.verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    if let Some(log_path) = &args.log_file {
        let file = std::fs::File::create(log_path)
            .with_context(|| format!("Failed to create log file {}", log_path.display()))?;

        env_logger::Builder::new()
            .filter_level(log_level)
            .filter_module("cosmic_text", log::LevelFilter::Warn)
            .format_timestamp_millis()
            .target(env_logger::Target::Pipe(Box::new(file)))
            .init();

        info!("Logging to file: {} (level: {:?})", log_path.display(), log_level);
    } else {
        // Console logging (respects RUST_LOG if set)
        let default_level = match args.verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };

        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
            .filter_module("cosmic_text", log::LevelFilter::Warn)
            .format_timestamp_millis()
            .init();
    }
    Ok(())
}

fn load_settings(path: Option<&Path>) -> anyhow::Result<ViewerSettings> {
    let Some(path) = path else {
        return Ok(ViewerSettings::default());
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings {}", path.display()))?;
    let settings = ViewerSettings::from_json(&json)
        .with_context(|| format!("Invalid settings {}", path.display()))?;
    debug!("Loaded settings from {}", path.display());
    Ok(settings)
}

fn default_output(input: &Path, raw: bool) -> PathBuf {
    let ext = if raw { "rgba" } else { "png" };
    input.with_extension(format!("view.{}", ext))
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(&args)?;
    debug!("Command-line args: {:?}", args);

    let settings = load_settings(args.settings.as_deref())?;
    let mut viewer = Viewer::new(settings).context("Failed to create viewer")?;

    let panel = InfoPanel::new();
    panel.attach("Image", &viewer)?;

    let image: Arc<dyn ImageSource> = Arc::new(
        RasterImage::open(&args.input)?.with_outside_color(viewer.settings().bg_color),
    );

    let (width, height) = match args.size.as_deref() {
        Some([w, h]) => (*w, *h),
        Some(other) => bail!("--size takes two values, got {}", other.len()),
        None => image.dimensions(),
    };
    viewer.configure_surface(width, height)?;
    viewer.set_image(&image)?;

    if let Some(cuts) = args.cuts.as_deref() {
        let [low, high] = cuts else {
            bail!("--cuts takes two values, got {}", cuts.len());
        };
        viewer.set_cut_levels(*low, *high)?;
    } else if let Some((low, high)) = image.minmax() {
        viewer.set_autocuts_mode("minmax");
        viewer.set_cut_levels(low, high)?;
    }

    if let Some(zoom) = args.zoom {
        viewer.set_scale(zoom, zoom)?;
    }
    if args.pan_marker {
        viewer.toggle_pan_marker(true)?;
    }
    if let Some(text) = &args.message {
        viewer.show_message(text, None)?;
    }

    if let Some(info) = panel.info("Image") {
        println!("{:<12}{}", "Name:", info.name);
        println!("{:<12}{}", "Dimensions:", info.dimensions);
        println!("{:<12}{} .. {}", "Range:", info.min, info.max);
        println!("{:<12}{} .. {} ({})", "Cuts:", info.cut_low, info.cut_high, info.cut_new);
        println!("{:<12}{} ({})", "Zoom:", info.zoom, info.zoom_new);
    }

    let out = args
        .output
        .clone()
        .unwrap_or_else(|| default_output(&args.input, args.raw));

    if args.raw {
        let bytes = viewer.get_image_as_array()?;
        std::fs::write(&out, &bytes).with_context(|| format!("Failed to write {}", out.display()))?;
        info!(
            "Wrote {} raw bytes ({}) to {}",
            bytes.len(),
            viewer.settings().rgb_order,
            out.display()
        );
    } else {
        let format = match &args.format {
            Some(name) => Some(name.parse::<OutputFormat>()?),
            None => None,
        };
        viewer.save_rgb_image_as_file(&out, format, args.quality)?;
    }
    println!("{:<12}{}", "Output:", out.display());
    Ok(())
}
