//! Named viewport sizes for common social cards and devices

use crate::ScreenshotError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Viewport size in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A named size preset
///
/// Presets are selected with `--size NAME`. Names are matched exactly,
/// so `OG` is rejected while `og` is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SizePreset {
    /// Open Graph card
    Og,
    Twitter,
    /// Repository social preview
    Github,
    Linkedin,
    Facebook,
    Instagram,
    Hd,
    Desktop,
    Laptop,
    Tablet,
    Mobile,
}

impl SizePreset {
    /// Every preset, in the order they are listed in help output
    pub const ALL: [SizePreset; 11] = [
        SizePreset::Og,
        SizePreset::Twitter,
        SizePreset::Github,
        SizePreset::Linkedin,
        SizePreset::Facebook,
        SizePreset::Instagram,
        SizePreset::Hd,
        SizePreset::Desktop,
        SizePreset::Laptop,
        SizePreset::Tablet,
        SizePreset::Mobile,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SizePreset::Og => "og",
            SizePreset::Twitter => "twitter",
            SizePreset::Github => "github",
            SizePreset::Linkedin => "linkedin",
            SizePreset::Facebook => "facebook",
            SizePreset::Instagram => "instagram",
            SizePreset::Hd => "hd",
            SizePreset::Desktop => "desktop",
            SizePreset::Laptop => "laptop",
            SizePreset::Tablet => "tablet",
            SizePreset::Mobile => "mobile",
        }
    }

    pub fn size(&self) -> Size {
        match self {
            SizePreset::Og => Size::new(1200, 630),
            SizePreset::Twitter => Size::new(1200, 675),
            SizePreset::Github => Size::new(1280, 640),
            SizePreset::Linkedin => Size::new(1200, 627),
            SizePreset::Facebook => Size::new(1200, 630),
            SizePreset::Instagram => Size::new(1080, 1080),
            SizePreset::Hd => Size::new(1280, 720),
            SizePreset::Desktop => Size::new(1920, 1080),
            SizePreset::Laptop => Size::new(1366, 768),
            SizePreset::Tablet => Size::new(768, 1024),
            SizePreset::Mobile => Size::new(375, 667),
        }
    }

    /// Comma separated list of every preset name
    pub fn valid_names() -> String {
        Self::ALL
            .iter()
            .map(|preset| preset.name())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for SizePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SizePreset {
    type Err = ScreenshotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|preset| preset.name() == s)
            .ok_or_else(|| ScreenshotError::InvalidSizePreset {
                name: s.to_string(),
                valid: Self::valid_names(),
            })
    }
}

/// Preset table as shown in `--help`
pub fn presets_help() -> String {
    SizePreset::ALL
        .iter()
        .map(|preset| format!("    {:<10} {}", preset.name(), preset.size()))
        .collect::<Vec<_>>()
        .join("\n")
}
