use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use log::{LevelFilter, info, warn};
use scanview::camera::centered_framing;
use scanview::overlay::PixelCanvas;
use scanview::tools::{binary_stats, collect_images, grayscale_stats, load_rgba, save_image};
use scanview::utils::binarization::{Binarizer, GlobalHistogramBinarizer, HybridBinarizer};
use scanview::{
    BarcodeEncoder, BarcodeFormat, DecodeConfig, DecodeMode, DecodePipeline, EncodeHints,
    ErrorCorrection, LuminanceSource, ManualPreview, OverlayConfig, OverlayRenderer, PixelFrame,
    PreviewSize, ResultPoint, ScanCallback, ScanIndicator, ScanResult, ScanSession,
};

#[derive(Parser)]
#[command(name = "scanview", version, about = "QR encode/decode and viewfinder overlay tools")]
struct Cli {
    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render text as a QR code PNG
    Encode {
        #[arg(long)]
        text: String,
        #[arg(long)]
        out: PathBuf,
        #[arg(long, default_value_t = 150)]
        size: u32,
        #[arg(long, default_value_t = 1)]
        margin: u32,
        /// Error-correction level: L, M, Q or H
        #[arg(long, default_value = "H")]
        ec: String,
        /// Image composited in the centre at 1/5 of the code width
        #[arg(long)]
        logo: Option<PathBuf>,
    },
    /// Decode an image, or every image under a directory
    Decode {
        #[arg(long)]
        image: PathBuf,
        /// Print luminance and binarization statistics
        #[arg(long)]
        stats: bool,
    },
    /// Render viewfinder overlay frames on top of an image
    Overlay {
        #[arg(long)]
        image: PathBuf,
        #[arg(long)]
        out_dir: PathBuf,
        #[arg(long, default_value_t = 8)]
        frames: u32,
        /// Time between frames in milliseconds
        #[arg(long, default_value_t = 100)]
        interval_ms: u64,
        /// sweep or pulse; defaults to SCANVIEW_INDICATOR or sweep
        #[arg(long)]
        indicator: Option<String>,
        /// Decode the image and freeze on the result after the first frame
        #[arg(long)]
        freeze: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .parse_default_env()
        .init();

    let outcome = match cli.command {
        Command::Encode {
            text,
            out,
            size,
            margin,
            ec,
            logo,
        } => encode_cmd(&text, &out, size, margin, &ec, logo.as_deref()),
        Command::Decode { image, stats } => decode_cmd(&image, stats),
        Command::Overlay {
            image,
            out_dir,
            frames,
            interval_ms,
            indicator,
            freeze,
        } => overlay_cmd(&image, &out_dir, frames, interval_ms, indicator.as_deref(), freeze),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn encode_cmd(
    text: &str,
    out: &Path,
    size: u32,
    margin: u32,
    ec: &str,
    logo: Option<&Path>,
) -> scanview::Result<()> {
    let ec_level = ErrorCorrection::from_letter(ec)
        .ok_or_else(|| scanview::ScanError::Config(format!("unknown EC level {ec:?}")))?;
    let hints = EncodeHints {
        error_correction: ec_level,
        ..EncodeHints::with_margin(margin)
    };
    let encoder = BarcodeEncoder::new();
    let mut image = encoder.encode_bitmap(text, BarcodeFormat::QrCode, size, size, &hints)?;
    if let Some(logo_path) = logo {
        let logo = load_rgba(logo_path)?;
        image = scanview::encoder::add_logo(image, &logo);
    }
    save_image(&image, out)?;
    println!("Wrote {}x{} code to {}", size, size, out.display());
    Ok(())
}

fn decode_cmd(path: &Path, stats: bool) -> scanview::Result<()> {
    let pipeline = DecodePipeline::with_config(&DecodeConfig::from_env());
    let images = collect_images(path);
    if images.is_empty() {
        warn!("no images found at {}", path.display());
    }

    let mut decoded = 0usize;
    let start = Instant::now();
    for image_path in &images {
        let image = match load_rgba(image_path) {
            Ok(image) => image,
            Err(err) => {
                eprintln!("Failed to load image {}: {}", image_path.display(), err);
                continue;
            }
        };
        let frame = PixelFrame::from_image(&image);
        if stats {
            print_stats(&LuminanceSource::from_frame(&frame));
        }
        match pipeline.decode(&frame) {
            Some(result) => {
                decoded += 1;
                println!(
                    "{}: {} (binarizer={:?})",
                    image_path.display(),
                    result.text,
                    result.binarizer
                );
            }
            None => println!("{}: no code found", image_path.display()),
        }
    }

    if images.len() > 1 {
        let rate = decoded as f64 / images.len() as f64 * 100.0;
        println!(
            "Decoded {}/{} images ({:.1}%) in {:.2?}",
            decoded,
            images.len(),
            rate,
            start.elapsed()
        );
    }
    Ok(())
}

fn print_stats(source: &LuminanceSource) {
    let gray = grayscale_stats(source);
    println!(
        "  Luminance range: {}-{}, average: {}",
        gray.min, gray.max, gray.avg
    );
    let binarizers: [&dyn Binarizer; 2] = [&HybridBinarizer, &GlobalHistogramBinarizer];
    for binarizer in binarizers {
        match binarizer.binarize(source) {
            Some(binary) => {
                let stats = binary_stats(&binary);
                println!(
                    "  {:?}: black_pixels={} total={} black_ratio={:.2}%",
                    binarizer.kind(),
                    stats.black_pixels,
                    stats.total_pixels,
                    stats.black_ratio * 100.0
                );
            }
            None => println!("  {:?}: no usable threshold", binarizer.kind()),
        }
    }
}

/// Prints results as they arrive
struct PrintCallback;

impl ScanCallback for PrintCallback {
    fn on_result(&mut self, result: &ScanResult) {
        println!("Decoded: {}", result.text);
    }

    fn on_possible_result_points(&mut self, points: &[ResultPoint]) {
        info!("{} candidate points", points.len());
    }
}

fn overlay_cmd(
    image_path: &Path,
    out_dir: &Path,
    frames: u32,
    interval_ms: u64,
    indicator: Option<&str>,
    freeze: bool,
) -> scanview::Result<()> {
    let background = load_rgba(image_path)?;
    let (width, height) = background.dimensions();

    let mut config = OverlayConfig::from_env()?;
    if let Some(name) = indicator {
        let style = ScanIndicator::from_name(name)
            .ok_or_else(|| scanview::ScanError::Config(format!("unknown indicator style {name:?}")))?;
        config = config.with_indicator(style);
    }

    let preview = Arc::new(ManualPreview::new());
    let mut renderer = OverlayRenderer::new(config)?;
    renderer.attach(preview.clone());
    let size = PreviewSize::new(width, height);
    preview.set_geometry(size, centered_framing(size, 0.1));
    preview.start();

    let mut session = ScanSession::new(DecodePipeline::new(), PrintCallback)
        .with_overlay(renderer.handle())
        .with_mode(DecodeMode::Single)
        .with_freeze_on_result(freeze);

    std::fs::create_dir_all(out_dir)?;

    let start = Instant::now();
    for index in 0..frames {
        let now = start + Duration::from_millis(interval_ms * index as u64);
        let mut canvas = PixelCanvas::from_image(background.clone());
        let request = renderer.render(&mut canvas, now);
        if let Some(request) = request {
            renderer.on_frame(request.token());
        }
        let out = out_dir.join(format!("frame_{index:03}.png"));
        save_image(canvas.image(), &out)?;
        info!("wrote {} ({:?})", out.display(), renderer.state());

        if index == 0 {
            session.process_frame(&PixelFrame::from_image(&background));
        }
    }
    println!("Wrote {} frames to {}", frames, out_dir.display());
    Ok(())
}
