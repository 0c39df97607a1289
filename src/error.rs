use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ScreenshotError {
    #[error("HTML file not found: {}", .0.display())]
    HtmlFileNotFound(PathBuf),

    #[error("Invalid size preset: {name}. Valid options: {valid}")]
    InvalidSizePreset { name: String, valid: String },

    #[error("Invalid format: {0}. Use png, jpg, or jpeg.")]
    InvalidFormat(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Browser launch failed: {0}")]
    BrowserLaunchFailed(String),

    #[error("Page error: {0}")]
    PageError(String),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("Screenshot capture failed: {0}")]
    CaptureFailed(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl ScreenshotError {
    /// Errors caused by what the user typed rather than by the browser or the system.
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            ScreenshotError::HtmlFileNotFound(_)
                | ScreenshotError::InvalidSizePreset { .. }
                | ScreenshotError::InvalidFormat(_)
                | ScreenshotError::ConfigurationError(_)
        )
    }
}

impl From<std::io::Error> for ScreenshotError {
    fn from(err: std::io::Error) -> Self {
        ScreenshotError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for ScreenshotError {
    fn from(err: serde_json::Error) -> Self {
        ScreenshotError::SerializationError(err.to_string())
    }
}

impl From<chromiumoxide::error::CdpError> for ScreenshotError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        ScreenshotError::PageError(err.to_string())
    }
}
