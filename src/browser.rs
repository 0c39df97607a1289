//! Lifecycle of the headless Chrome instance used for one capture
//!
//! A `BrowserSession` owns the launched browser, the background task that
//! drives its DevTools connection, and a throwaway profile directory.

use crate::{create_browser_config, Config, ResolvedOptions, ScreenshotError};
use chromiumoxide::browser::Browser;
use chromiumoxide::error::CdpError;
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::path::PathBuf;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<Result<(), CdpError>>,
    user_data_dir: PathBuf,
}

impl BrowserSession {
    pub async fn launch(config: &Config, resolved: &ResolvedOptions) -> Result<Self, ScreenshotError> {
        let user_data_dir = std::env::temp_dir().join(format!(
            "html-shot-{}-{}",
            std::process::id(),
            uuid::Uuid::new_v4()
        ));
        tokio::fs::create_dir_all(&user_data_dir).await.map_err(|e| {
            ScreenshotError::BrowserLaunchFailed(format!("Failed to create user data dir: {e}"))
        })?;

        let browser_config = create_browser_config(config, resolved, &user_data_dir)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| ScreenshotError::BrowserLaunchFailed(e.to_string()))?;

        // The handler is a Stream and must be polled for any command to complete
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::error!("Handler error: {}", e);
                    return Err(e);
                }
            }
            debug!("Handler stream ended");
            Ok(())
        });

        debug!("Browser launched with profile {}", user_data_dir.display());

        Ok(Self {
            browser,
            handler,
            user_data_dir,
        })
    }

    pub async fn new_page(&self) -> Result<Page, ScreenshotError> {
        if self.handler.is_finished() {
            return Err(ScreenshotError::BrowserLaunchFailed(
                "browser connection closed before page creation".to_string(),
            ));
        }

        self.browser
            .new_page("about:blank")
            .await
            .map_err(|e| ScreenshotError::PageError(e.to_string()))
    }

    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!("Failed to close browser cleanly: {}", e);
        }
        let _ = self.browser.wait().await;
        self.handler.abort();

        if let Err(e) = tokio::fs::remove_dir_all(&self.user_data_dir).await {
            debug!(
                "Could not remove profile {}: {}",
                self.user_data_dir.display(),
                e
            );
        }
    }
}
