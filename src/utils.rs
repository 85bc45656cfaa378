//! Small helpers shared by the pipelines.
//!
//! - String truncation for log previews
//! - Rounding and percentage formatting for the click statistics
//! - File system validation for the data directory

use std::error::Error;
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Truncate a string for logging purposes.
///
/// Long strings are cut to at most `max` bytes (on a char boundary) with an
/// ellipsis and the number of dropped bytes appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Round to two decimals and render with at most two decimals, trailing
/// zeros dropped but at least one decimal kept (`12.5`, `7.0`, `33.33`).
///
/// Rounding works on the exact binary value and breaks ties to even, so
/// `3.125` renders as `3.12`.
pub fn format_round2(value: f64) -> String {
    let mut s = format!("{value:.2}");
    if s.ends_with('0') {
        s.pop();
    }
    s
}

/// [`format_round2`] followed by `%`, as shown on the dashboard.
///
/// ```ignore
/// assert_eq!(format_percentage(12.5), "12.5%");
/// assert_eq!(format_percentage(7.0), "7.0%");
/// assert_eq!(format_percentage(33.3333), "33.33%");
/// ```
pub fn format_percentage(value: f64) -> String {
    format!("{}%", format_round2(value))
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then creates and removes a probe file.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or is not writable
/// (permission denied, read-only filesystem, etc.).
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    // A sync probe keeps the error surface simple
    let probe_path = path.join("..__probe_write__");
    stdfs::File::create(&probe_path)?;
    let _ = stdfs::remove_file(&probe_path);
    info!("Data directory is writable");
    Ok(())
}
