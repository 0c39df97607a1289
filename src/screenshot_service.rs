//! Main screenshot service orchestrating the capture pipeline
//!
//! This module provides the primary `ScreenshotService`: it resolves options
//! and paths, hands the page to a `Renderer`, and writes the image to disk.

use crate::{
    absolute_path, default_output_name, format_bytes, resolve_output_path, ChromeRenderer, Config,
    ImageFormat, RenderJob, Renderer, ResolvedOptions, ScreenshotError, ScreenshotOptions, Size,
};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::fs;
use tracing::{debug, info, warn};

/// Outcome of a successful capture
#[derive(Debug, Clone)]
pub struct ScreenshotResult {
    /// Absolute path of the written image
    pub output_path: PathBuf,
    pub format: ImageFormat,
    pub viewport: Size,
    pub device_scale_factor: f64,
    /// Dimensions read back from the encoded image, when they could be decoded
    pub pixel_size: Option<Size>,
    pub file_size: usize,
    pub duration: Duration,
}

/// Screenshot service for local HTML files
///
/// # Examples
///
/// ```rust,no_run
/// use html_shot::{Config, ScreenshotOptions, ScreenshotService, SizePreset};
/// use std::path::Path;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let service = ScreenshotService::new(Config::default())?;
///     let options = ScreenshotOptions {
///         size: Some(SizePreset::Og),
///         ..Default::default()
///     };
///     let result = service.generate(Path::new("card.html"), None, &options).await?;
///     println!("Wrote {}", result.output_path.display());
///     Ok(())
/// }
/// ```
pub struct ScreenshotService {
    config: Config,
    renderer: Arc<dyn Renderer>,
}

impl ScreenshotService {
    pub fn new(config: Config) -> Result<Self, ScreenshotError> {
        config.validate()?;
        let renderer = Arc::new(ChromeRenderer::new(config.clone()));
        Ok(Self { config, renderer })
    }

    pub fn with_renderer(config: Config, renderer: Arc<dyn Renderer>) -> Self {
        Self { config, renderer }
    }

    pub async fn generate(
        &self,
        html_file: &Path,
        output_file: Option<&Path>,
        options: &ScreenshotOptions,
    ) -> Result<ScreenshotResult, ScreenshotError> {
        let start_time = Instant::now();
        let cwd = std::env::current_dir()?;

        let mut options = options.clone();
        if options.format.is_none() {
            options.format = output_file.and_then(ImageFormat::from_path);
        }
        let resolved = ResolvedOptions::resolve(&options, &self.config)?;

        let html_path = absolute_path(&cwd, html_file);
        if !fs::try_exists(&html_path).await.unwrap_or(false) {
            return Err(ScreenshotError::HtmlFileNotFound(html_path));
        }

        let output_name = match output_file {
            Some(name) => name.to_path_buf(),
            None => PathBuf::from(default_output_name(html_file, resolved.format)),
        };
        let output_path = resolve_output_path(&cwd, options.outdir.as_deref(), &output_name);

        info!(
            "Generating {} ({})...",
            output_name.display(),
            resolved.viewport
        );
        if !resolved.format.is_jpeg() && options.quality.is_some() {
            debug!("Quality only applies to JPEG output; ignoring it for {}", resolved.format);
        }

        let job = RenderJob::new(html_path, resolved.clone())?;
        let data = self.renderer.render(&job).await?;
        if data.is_empty() {
            return Err(ScreenshotError::CaptureFailed("browser returned an empty image".to_string()));
        }

        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&output_path, &data).await?;

        let pixel_size = read_dimensions(&data);
        debug!(
            "Wrote {} to {}",
            format_bytes(data.len()),
            output_path.display()
        );
        if let Some(actual) = pixel_size {
            let expected = resolved.pixel_size();
            if !resolved.full_page && actual != expected {
                warn!("Captured image is {} px, expected {} px", actual, expected);
            }
        }
        info!("Generated: {}", output_path.display());

        Ok(ScreenshotResult {
            output_path,
            format: resolved.format,
            viewport: resolved.viewport,
            device_scale_factor: resolved.device_scale_factor,
            pixel_size,
            file_size: data.len(),
            duration: start_time.elapsed(),
        })
    }
}

/// Render `html_file` with default configuration and return the written path
pub async fn generate_screenshot(
    html_file: impl AsRef<Path>,
    output_file: Option<&Path>,
    options: ScreenshotOptions,
) -> Result<PathBuf, ScreenshotError> {
    let service = ScreenshotService::new(Config::default())?;
    let result = service
        .generate(html_file.as_ref(), output_file, &options)
        .await?;
    Ok(result.output_path)
}

fn read_dimensions(data: &[u8]) -> Option<Size> {
    let reader = match image::io::Reader::new(Cursor::new(data)).with_guessed_format() {
        Ok(reader) => reader,
        Err(e) => {
            warn!("Could not inspect captured image: {}", e);
            return None;
        }
    };

    match reader.into_dimensions() {
        Ok((width, height)) => Some(Size::new(width, height)),
        Err(e) => {
            warn!("Could not read captured image dimensions: {}", e);
            None
        }
    }
}
