use crate::ImageFormat;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

/// Default output file name: the input's base name minus a trailing `.html`,
/// plus the format's extension
///
/// Only the exact lower-case `.html` suffix is stripped, so `page.htm`
/// becomes `page.htm.png`.
pub fn default_output_name(html_file: &Path, format: ImageFormat) -> String {
    let file_name = html_file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = match file_name.strip_suffix(".html") {
        Some(stem) if !stem.is_empty() => stem,
        _ => &file_name,
    };

    format!("{stem}.{}", format.extension())
}

/// Join `path` onto `base` unless it is already absolute, then normalize
///
/// Normalization is lexical: `.` is dropped and `..` removes the previous
/// component. Symlinks are not followed, and `..` never climbs above the root.
pub fn absolute_path(base: &Path, path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };
    normalize_path(&joined)
}

fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Where the image is written: `outdir/name` if an output directory was
/// given, otherwise `cwd/name`
pub fn resolve_output_path(cwd: &Path, outdir: Option<&Path>, output_name: &Path) -> PathBuf {
    let base = match outdir {
        Some(dir) => absolute_path(cwd, dir),
        None => cwd.to_path_buf(),
    };
    absolute_path(&base, output_name)
}

pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    let millis = duration.subsec_millis();

    if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else if seconds > 0 {
        format!("{}.{}s", seconds, millis / 100)
    } else {
        format!("{millis}ms")
    }
}

pub fn format_bytes(bytes: usize) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.2} {}", size, UNITS[unit_index])
    }
}
