//! # html-shot
//!
//! Renders a local HTML file to a PNG or JPEG image at a chosen viewport
//! size, using headless Chrome over the DevTools protocol.
//!
//! The viewport comes from explicit `--width`/`--height`, a named preset
//! (`--size og`, `--size github`, ...), or the configured default of
//! 1280x720. Pages are emulated at a device scale factor of 2, so a
//! 1280x720 viewport produces a 2560x1440 image.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use html_shot::{generate_screenshot, ImageFormat, ScreenshotOptions, SizePreset};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let options = ScreenshotOptions {
//!         size: Some(SizePreset::Og),
//!         format: Some(ImageFormat::Jpg),
//!         ..Default::default()
//!     };
//!     let path = generate_screenshot("card.html", None, options).await?;
//!     println!("Screenshot written to {}", path.display());
//!     Ok(())
//! }
//! ```
//!
//! ## CLI Usage
//!
//! ```bash
//! html-shot page.html --size github
//! html-shot page.html screenshot.png --outdir ./screenshots
//! ```

/// Configuration, option records and browser settings
pub mod config;

/// Error types
pub mod error;

/// Named viewport sizes
pub mod presets;

/// Headless Chrome session management
pub mod browser;

/// Page loading and capture
pub mod renderer;

/// Option and path resolution around a render
pub mod screenshot_service;

/// Command-line interface implementation
pub mod cli;

/// Path and formatting helpers
pub mod utils;

#[cfg(test)]
mod tests;

pub use browser::*;
pub use cli::*;
pub use config::*;
pub use error::*;
pub use presets::*;
pub use renderer::*;
pub use screenshot_service::*;
pub use utils::*;
