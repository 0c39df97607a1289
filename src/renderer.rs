//! Turning a local HTML file into encoded image bytes
//!
//! `Renderer` is the seam between path/option handling and the browser.
//! `ChromeRenderer` is the real implementation; tests substitute a mock.

use crate::{BrowserSession, Config, ImageFormat, ResolvedOptions, ScreenshotError, Size};
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, EventLifecycleEvent, GetLayoutMetricsParams, NavigateParams,
    Viewport as ClipViewport,
};
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use std::path::PathBuf;
use tokio::time::{sleep, timeout};
use tracing::{debug, info};
use url::Url;

/// Everything the browser needs to know about one capture
#[derive(Debug, Clone)]
pub struct RenderJob {
    /// Absolute path of the HTML file
    pub html_path: PathBuf,
    pub file_url: Url,
    pub resolved: ResolvedOptions,
}

impl RenderJob {
    pub fn new(html_path: PathBuf, resolved: ResolvedOptions) -> Result<Self, ScreenshotError> {
        let file_url = Url::from_file_path(&html_path).map_err(|_| {
            ScreenshotError::NavigationFailed(format!(
                "cannot build a file URL for {}",
                html_path.display()
            ))
        })?;

        Ok(Self {
            html_path,
            file_url,
            resolved,
        })
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Load the job's page and return the encoded screenshot
    async fn render(&self, job: &RenderJob) -> Result<Vec<u8>, ScreenshotError>;
}

/// Renders with a freshly launched headless Chrome per job
pub struct ChromeRenderer {
    config: Config,
}

impl ChromeRenderer {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    async fn capture(&self, session: &BrowserSession, job: &RenderJob) -> Result<Vec<u8>, ScreenshotError> {
        let page = session.new_page().await?;
        let resolved = &job.resolved;

        set_device_metrics(&page, resolved.viewport, resolved.device_scale_factor).await?;

        info!("Loading {}...", job.html_path.display());
        self.navigate(&page, &job.file_url).await?;

        if let Some(wait) = resolved.wait {
            debug!("Waiting {:?} before capture", wait);
            sleep(wait).await;
        }

        info!("Taking screenshot...");
        let mut params = ScreenshotParams::builder().format(capture_format(resolved.format));
        if let Some(quality) = resolved.capture_quality() {
            params = params.quality(quality);
        }

        // chromiumoxide's own full_page mode resets the scale factor to 1, so
        // the page is grown to its content size here and clipped instead
        if resolved.full_page {
            let layout = page.execute(GetLayoutMetricsParams::default()).await?.result;
            let extent = content_extent(
                layout.css_content_size.width,
                layout.css_content_size.height,
                resolved.viewport,
            );
            debug!("Full page content is {}", extent);

            set_device_metrics(&page, extent, resolved.device_scale_factor).await?;
            params = params.capture_beyond_viewport(true).clip(ClipViewport {
                x: 0.0,
                y: 0.0,
                width: extent.width as f64,
                height: extent.height as f64,
                scale: 1.0,
            });
        }

        let data = page
            .screenshot(params.build())
            .await
            .map_err(|e| ScreenshotError::CaptureFailed(e.to_string()))?;

        if let Err(e) = page.close().await {
            debug!("Failed to close page: {}", e);
        }
        Ok(data)
    }

    /// Navigate and wait for the navigation's `networkIdle` (or `load`) lifecycle event
    async fn navigate(&self, page: &Page, url: &Url) -> Result<(), ScreenshotError> {
        // Subscribe first so the event cannot fire before we listen
        let mut lifecycle = page.event_listener::<EventLifecycleEvent>().await?;

        let navigation = page
            .execute(NavigateParams::new(url.as_str()))
            .await
            .map_err(|e| ScreenshotError::NavigationFailed(e.to_string()))?;

        if let Some(error_text) = &navigation.result.error_text {
            return Err(ScreenshotError::NavigationFailed(format!("{url}: {error_text}")));
        }

        let loader_id = navigation.result.loader_id.clone();
        let target_event = if self.config.wait_for_network_idle {
            "networkIdle"
        } else {
            "load"
        };

        while let Some(event) = lifecycle.next().await {
            let same_navigation = loader_id
                .as_ref()
                .map_or(true, |id| *id == event.loader_id);

            if same_navigation && event.name == target_event {
                debug!("Reached {} for {}", target_event, url);
                return Ok(());
            }
        }

        Err(ScreenshotError::NavigationFailed(
            "browser closed before the page finished loading".to_string(),
        ))
    }
}

#[async_trait]
impl Renderer for ChromeRenderer {
    async fn render(&self, job: &RenderJob) -> Result<Vec<u8>, ScreenshotError> {
        let mut session: Option<BrowserSession> = None;

        // Launch is inside the deadline too: a Chrome that never comes up
        // must not outlive --timeout
        let work = async {
            let launched = session.insert(BrowserSession::launch(&self.config, &job.resolved).await?);
            self.capture(launched, job).await
        };

        let result = match timeout(self.config.render_timeout, work).await {
            Ok(result) => result,
            Err(_) => Err(ScreenshotError::Timeout(self.config.render_timeout)),
        };

        if let Some(session) = session {
            session.close().await;
        }
        result
    }
}

async fn set_device_metrics(page: &Page, size: Size, device_scale_factor: f64) -> Result<(), ScreenshotError> {
    let metrics = SetDeviceMetricsOverrideParams::builder()
        .width(size.width)
        .height(size.height)
        .device_scale_factor(device_scale_factor)
        .mobile(false)
        .build()
        .map_err(ScreenshotError::PageError)?;
    page.execute(metrics).await?;
    Ok(())
}

/// CSS size of the whole document, never smaller than the viewport
fn content_extent(content_width: f64, content_height: f64, viewport: Size) -> Size {
    Size::new(
        (content_width.ceil() as u32).max(viewport.width),
        (content_height.ceil() as u32).max(viewport.height),
    )
}

fn capture_format(format: ImageFormat) -> CaptureScreenshotFormat {
    match format {
        ImageFormat::Png => CaptureScreenshotFormat::Png,
        ImageFormat::Jpg | ImageFormat::Jpeg => CaptureScreenshotFormat::Jpeg,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ScreenshotOptions;
    use std::time::{Duration, Instant};

    fn resolved() -> ResolvedOptions {
        ResolvedOptions::resolve(&ScreenshotOptions::default(), &Config::default()).unwrap()
    }

    #[test]
    fn test_render_job_file_url() {
        let path = std::env::temp_dir().join("page with space.html");
        let job = RenderJob::new(path.clone(), resolved()).unwrap();
        assert_eq!(job.file_url.scheme(), "file");
        assert!(job.file_url.as_str().ends_with("page%20with%20space.html"));
        assert_eq!(job.file_url.to_file_path().unwrap(), path);
        assert_eq!(job.resolved.viewport, Size::new(1280, 720));
    }

    #[test]
    fn test_render_job_rejects_relative_path() {
        assert!(RenderJob::new(PathBuf::from("page.html"), resolved()).is_err());
    }

    #[test]
    fn test_capture_format() {
        assert!(matches!(capture_format(ImageFormat::Png), CaptureScreenshotFormat::Png));
        assert!(matches!(capture_format(ImageFormat::Jpg), CaptureScreenshotFormat::Jpeg));
        assert!(matches!(capture_format(ImageFormat::Jpeg), CaptureScreenshotFormat::Jpeg));
    }

    #[test]
    fn test_content_extent_never_shrinks_below_viewport() {
        let viewport = Size::new(1280, 720);
        assert_eq!(content_extent(1280.0, 2400.4, viewport), Size::new(1280, 2401));
        assert_eq!(content_extent(300.0, 200.0, viewport), viewport);
        assert_eq!(content_extent(1500.2, 720.0, viewport), Size::new(1501, 720));
    }

    // A "browser" that never prints its DevTools endpoint: launch hangs
    // until the render deadline cuts it off
    #[cfg(unix)]
    #[tokio::test]
    async fn test_render_timeout_bounds_browser_launch() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::TempDir::new().unwrap();
        let fake_chrome = dir.path().join("fake-chrome");
        std::fs::write(&fake_chrome, "#!/bin/sh\nsleep 30\n").unwrap();
        std::fs::set_permissions(&fake_chrome, std::fs::Permissions::from_mode(0o755)).unwrap();

        let config = Config {
            render_timeout: Duration::from_millis(500),
            chrome_path: Some(fake_chrome.to_string_lossy().into_owned()),
            ..Default::default()
        };
        let renderer = ChromeRenderer::new(config);
        let job = RenderJob::new(dir.path().join("page.html"), resolved()).unwrap();

        let started = Instant::now();
        let err = renderer.render(&job).await.unwrap_err();

        assert!(matches!(err, ScreenshotError::Timeout(d) if d == Duration::from_millis(500)));
        assert!(started.elapsed() < Duration::from_secs(10));
    }
}
