//! Configuration management with serde serialization/deserialization
//!
//! This module holds the persistent defaults (`Config`), the per-invocation
//! option record (`ScreenshotOptions`) and the logic that merges the two into
//! the values handed to the browser (`ResolvedOptions`).

use crate::{ScreenshotError, Size, SizePreset};
use chromiumoxide::browser::BrowserConfig;
use chromiumoxide::handler::viewport::Viewport as ChromeViewport;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Defaults applied when an invocation leaves a value unset
///
/// Loaded from a JSON file with `--config`; any field missing from the file
/// keeps its default.
///
/// # Examples
///
/// ```rust
/// use html_shot::{Config, ImageFormat};
///
/// let config = Config {
///     default_format: ImageFormat::Jpeg,
///     jpeg_quality: 70,
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Viewport width in pixels when neither `--width` nor `--size` is given (default: 1280)
    pub default_width: u32,

    /// Viewport height in pixels when neither `--height` nor `--size` is given (default: 720)
    pub default_height: u32,

    /// Output format when `--format` is not given (default: PNG)
    pub default_format: ImageFormat,

    /// JPEG quality, 1-100 (default: 85)
    pub jpeg_quality: u8,

    /// Device pixel ratio of the emulated screen (default: 2.0)
    ///
    /// The written image is `width * factor` by `height * factor` pixels.
    pub device_scale_factor: f64,

    /// Upper bound for launching, loading and capturing (default: 30 seconds)
    pub render_timeout: Duration,

    /// Wait until the page has had no network activity before capturing (default: true)
    pub wait_for_network_idle: bool,

    /// Path to Chrome/Chromium executable (default: auto-detect)
    pub chrome_path: Option<String>,

    /// Custom User-Agent string (default: Chrome default)
    pub user_agent: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_width: 1280,
            default_height: 720,
            default_format: ImageFormat::Png,
            jpeg_quality: 85,
            device_scale_factor: 2.0,
            render_timeout: Duration::from_secs(30),
            wait_for_network_idle: true,
            chrome_path: None,
            user_agent: None,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ScreenshotError> {
        validate_size(Size::new(self.default_width, self.default_height))?;
        validate_quality(self.jpeg_quality)?;
        validate_scale(self.device_scale_factor)?;

        if self.render_timeout.is_zero() {
            return Err(ScreenshotError::ConfigurationError(
                "Render timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn default_size(&self) -> Size {
        Size::new(self.default_width, self.default_height)
    }
}

fn validate_size(size: Size) -> Result<(), ScreenshotError> {
    if size.width == 0 || size.height == 0 {
        return Err(ScreenshotError::ConfigurationError(format!(
            "Viewport dimensions must be greater than 0, got {size}"
        )));
    }
    Ok(())
}

fn validate_quality(quality: u8) -> Result<(), ScreenshotError> {
    if !(1..=100).contains(&quality) {
        return Err(ScreenshotError::ConfigurationError(format!(
            "JPEG quality must be between 1 and 100, got {quality}"
        )));
    }
    Ok(())
}

fn validate_scale(factor: f64) -> Result<(), ScreenshotError> {
    if !factor.is_finite() || factor <= 0.0 {
        return Err(ScreenshotError::ConfigurationError(format!(
            "Device scale factor must be a positive number, got {factor}"
        )));
    }
    Ok(())
}

/// Supported output image formats
///
/// `Jpg` and `Jpeg` produce identical images; they differ only in the
/// extension used for the default output file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Jpg,
    Jpeg,
}

impl ImageFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpg => "jpg",
            ImageFormat::Jpeg => "jpeg",
        }
    }

    pub fn is_jpeg(&self) -> bool {
        matches!(self, ImageFormat::Jpg | ImageFormat::Jpeg)
    }

    /// Infer a format from a file extension, ignoring case
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?;
        extension.parse().ok()
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ImageFormat {
    type Err = ScreenshotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let format = s.to_lowercase();
        match format.as_str() {
            "png" => Ok(ImageFormat::Png),
            "jpg" => Ok(ImageFormat::Jpg),
            "jpeg" => Ok(ImageFormat::Jpeg),
            _ => Err(ScreenshotError::InvalidFormat(format)),
        }
    }
}

/// Options for a single screenshot, every field optional
///
/// Unset fields fall back to the preset (for dimensions) and then to `Config`.
#[derive(Debug, Clone, Default)]
pub struct ScreenshotOptions {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub size: Option<SizePreset>,
    pub format: Option<ImageFormat>,
    pub outdir: Option<PathBuf>,
    pub quality: Option<u8>,
    pub device_scale_factor: Option<f64>,
    pub full_page: bool,
    pub wait: Option<Duration>,
}

/// Options after defaults, presets and overrides have been applied
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedOptions {
    pub viewport: Size,
    pub format: ImageFormat,
    pub quality: u8,
    pub device_scale_factor: f64,
    pub full_page: bool,
    pub wait: Option<Duration>,
}

impl ResolvedOptions {
    /// Merge `options` over `config`
    ///
    /// Explicit width and height each override the preset independently, so
    /// `--size og --height 800` yields 1200x800.
    pub fn resolve(options: &ScreenshotOptions, config: &Config) -> Result<Self, ScreenshotError> {
        let base = options
            .size
            .map(|preset| preset.size())
            .unwrap_or_else(|| config.default_size());

        let viewport = Size::new(
            options.width.unwrap_or(base.width),
            options.height.unwrap_or(base.height),
        );
        let quality = options.quality.unwrap_or(config.jpeg_quality);
        let device_scale_factor = options
            .device_scale_factor
            .unwrap_or(config.device_scale_factor);

        validate_size(viewport)?;
        validate_quality(quality)?;
        validate_scale(device_scale_factor)?;

        Ok(Self {
            viewport,
            format: options.format.unwrap_or(config.default_format),
            quality,
            device_scale_factor,
            full_page: options.full_page,
            wait: options.wait,
        })
    }

    /// JPEG quality to send to the browser; PNG captures take none
    pub fn capture_quality(&self) -> Option<u8> {
        self.format.is_jpeg().then_some(self.quality)
    }

    /// Size of the written image in device pixels, for viewport captures
    pub fn pixel_size(&self) -> Size {
        Size::new(
            (self.viewport.width as f64 * self.device_scale_factor).round() as u32,
            (self.viewport.height as f64 * self.device_scale_factor).round() as u32,
        )
    }
}

/// Generate Chrome command-line arguments for a headless capture
///
/// # Examples
///
/// ```rust
/// use html_shot::{Config, get_chrome_args};
///
/// let args = get_chrome_args(&Config::default());
/// assert!(args.contains(&"--hide-scrollbars".to_string()));
/// ```
pub fn get_chrome_args(config: &Config) -> Vec<String> {
    let mut args = vec![
        "--headless".to_string(),
        "--no-sandbox".to_string(),
        "--disable-dev-shm-usage".to_string(),
        "--disable-gpu".to_string(),
        "--hide-scrollbars".to_string(),
        "--allow-file-access-from-files".to_string(),
        "--disable-extensions".to_string(),
        "--disable-default-apps".to_string(),
        "--disable-sync".to_string(),
        "--no-first-run".to_string(),
        "--disable-background-timer-throttling".to_string(),
        "--disable-renderer-backgrounding".to_string(),
        "--disable-features=TranslateUI".to_string(),
        "--font-render-hinting=none".to_string(),
    ];

    if let Some(user_agent) = &config.user_agent {
        args.push(format!("--user-agent={user_agent}"));
    }

    args
}

/// Emulated screen for a resolved capture
pub fn chrome_viewport(resolved: &ResolvedOptions) -> ChromeViewport {
    ChromeViewport {
        width: resolved.viewport.width,
        height: resolved.viewport.height,
        device_scale_factor: Some(resolved.device_scale_factor),
        emulating_mobile: false,
        is_landscape: resolved.viewport.width > resolved.viewport.height,
        has_touch: false,
    }
}

pub fn create_browser_config(
    config: &Config,
    resolved: &ResolvedOptions,
    user_data_dir: &Path,
) -> Result<BrowserConfig, ScreenshotError> {
    let mut builder = BrowserConfig::builder()
        .window_size(resolved.viewport.width, resolved.viewport.height)
        .viewport(chrome_viewport(resolved))
        .user_data_dir(user_data_dir)
        .request_timeout(config.render_timeout)
        .args(get_chrome_args(config));

    if let Some(chrome_path) = &config.chrome_path {
        builder = builder.chrome_executable(chrome_path);
    }

    builder.build().map_err(ScreenshotError::BrowserLaunchFailed)
}
