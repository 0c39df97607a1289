use crate::{
    format_bytes, format_duration, presets_help, Config, ImageFormat, ScreenshotOptions,
    ScreenshotResult, ScreenshotService, SizePreset,
};
use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "html-shot")]
#[command(about = "Render a local HTML file to a PNG or JPEG screenshot")]
#[command(version)]
#[command(arg_required_else_help = true)]
#[command(after_help = after_help())]
pub struct Cli {
    #[arg(value_name = "HTML_FILE", help = "Path to the HTML file to screenshot")]
    pub html_file: PathBuf,

    #[arg(
        value_name = "OUT_FILE",
        help = "Output filename (default: basename.format)"
    )]
    pub out_file: Option<PathBuf>,

    #[arg(long, value_name = "PRESET", help = "Use a size preset (see below)")]
    pub size: Option<SizePreset>,

    #[arg(
        long,
        value_name = "WIDTH",
        value_parser = clap::value_parser!(u32).range(1..),
        help = "Viewport width in pixels (default: 1280)"
    )]
    pub width: Option<u32>,

    #[arg(
        long,
        value_name = "HEIGHT",
        value_parser = clap::value_parser!(u32).range(1..),
        help = "Viewport height in pixels (default: 720)"
    )]
    pub height: Option<u32>,

    #[arg(
        long,
        value_name = "FORMAT",
        help = "Image format: png, jpg, jpeg (default: png, or OUT_FILE's extension)"
    )]
    pub format: Option<ImageFormat>,

    #[arg(
        long,
        value_name = "DIR",
        help = "Output directory (default: current directory)"
    )]
    pub outdir: Option<PathBuf>,

    #[arg(
        long,
        value_name = "QUALITY",
        value_parser = clap::value_parser!(u8).range(1..=100),
        help = "JPEG quality 1-100 (default: 85)"
    )]
    pub quality: Option<u8>,

    #[arg(
        long,
        value_name = "FACTOR",
        help = "Device scale factor (default: 2 for retina output)"
    )]
    pub scale: Option<f64>,

    #[arg(long, help = "Capture the whole scrollable page instead of the viewport")]
    pub full_page: bool,

    #[arg(
        long,
        value_name = "MS",
        help = "Extra wait in milliseconds after the page is idle"
    )]
    pub wait: Option<u64>,

    #[arg(long, value_name = "FILE", help = "Configuration file path (JSON)")]
    pub config: Option<PathBuf>,

    #[arg(long, value_name = "SECS", help = "Render timeout in seconds")]
    pub timeout: Option<u64>,

    #[arg(long, value_name = "PATH", help = "Chrome executable path")]
    pub chrome_path: Option<String>,

    #[arg(short, long, help = "Enable verbose logging")]
    pub verbose: bool,
}

impl Cli {
    pub fn screenshot_options(&self) -> ScreenshotOptions {
        ScreenshotOptions {
            width: self.width,
            height: self.height,
            size: self.size,
            format: self.format,
            outdir: self.outdir.clone(),
            quality: self.quality,
            device_scale_factor: self.scale,
            full_page: self.full_page,
            wait: self.wait.map(Duration::from_millis),
        }
    }
}

fn after_help() -> String {
    format!(
        "Size Presets:
{}

Note: --width and --height override --size preset values

Examples:
  html-shot page.html --size github
  html-shot page.html --size og --format jpg
  html-shot page.html output.png
  html-shot page.html --format jpg --width 1920 --height 1080
  html-shot page.html screenshot.png --outdir ./screenshots",
        presets_help()
    )
}

/// Load the JSON config file if one was given, then apply CLI overrides
pub async fn load_config(args: &Cli) -> anyhow::Result<Config> {
    let mut config = if let Some(config_path) = &args.config {
        let config_content = fs::read_to_string(config_path)
            .await
            .with_context(|| format!("Failed to read config file {}", config_path.display()))?;
        serde_json::from_str(&config_content)
            .with_context(|| format!("Invalid config file {}", config_path.display()))?
    } else {
        Config::default()
    };

    if let Some(timeout) = args.timeout {
        config.render_timeout = Duration::from_secs(timeout);
    }

    if let Some(chrome_path) = &args.chrome_path {
        config.chrome_path = Some(chrome_path.clone());
    }

    config.validate()?;

    debug!("Configuration loaded: {:?}", config);
    Ok(config)
}

pub struct CliRunner {
    pub service: ScreenshotService,
}

impl CliRunner {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let service = ScreenshotService::new(config)?;
        Ok(Self { service })
    }

    pub fn with_service(service: ScreenshotService) -> Self {
        Self { service }
    }

    pub async fn run(&self, args: &Cli) -> anyhow::Result<ScreenshotResult> {
        info!("Rendering {}", args.html_file.display());

        let result = self
            .service
            .generate(
                &args.html_file,
                args.out_file.as_deref(),
                &args.screenshot_options(),
            )
            .await?;

        print_summary(&result);
        Ok(result)
    }
}

fn print_summary(result: &ScreenshotResult) {
    println!("✅ Screenshot details:");
    println!("  Format: {}", result.format);
    println!(
        "  Viewport: {} @{}x",
        result.viewport, result.device_scale_factor
    );
    if let Some(pixels) = result.pixel_size {
        println!("  Image: {pixels} px");
    }
    println!("  Size: {}", format_bytes(result.file_size));
    println!("  Duration: {}", format_duration(result.duration));
}

pub fn setup_logging(verbose: bool) -> anyhow::Result<()> {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))?;

    Ok(())
}
