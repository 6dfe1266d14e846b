//! Optional run metadata carried in `#` comment lines.
//!
//! The capture process writes the sampling delay as the very first line
//! (`# Delay:250`) and the elapsed total near the end (`#Total: 42`). The two
//! are located independently. Nothing here can fail the run: a malformed
//! value is logged and reported as unknown.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

/// Marker that starts every comment line.
pub const COMMENT_MARKER: char = '#';

/// Label used wherever a metadata field could not be recovered.
pub const UNKNOWN: &str = "Unknown";

static TOTAL_LINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^# ?Total\b").unwrap());

/// Metadata recovered from a session file's comment lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HeaderMetadata {
    /// Capture delay in milliseconds, kept as written.
    pub delay_ms: Option<String>,
    /// Total capture duration in whole seconds.
    pub total_duration_secs: Option<u64>,
}

impl HeaderMetadata {
    pub fn delay_label(&self) -> String {
        self.delay_ms.clone().unwrap_or_else(|| UNKNOWN.to_string())
    }

    pub fn total_label(&self) -> String {
        self.total_duration_secs
            .map(|t| t.to_string())
            .unwrap_or_else(|| UNKNOWN.to_string())
    }
}

#[derive(Debug, PartialEq, Eq)]
enum MetadataError {
    MissingValue { line: String },
    InvalidTotal { value: String },
}

impl std::fmt::Display for MetadataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetadataError::MissingValue { line } => {
                write!(f, "no value after ':' in {line:?}")
            }
            MetadataError::InvalidTotal { value } => {
                write!(f, "total {value:?} is not a whole number of seconds")
            }
        }
    }
}

/// Extract delay and total from the file's lines. Never fails.
pub fn extract_header(lines: &[&str]) -> HeaderMetadata {
    let delay_ms = match parse_delay(lines.first().copied()) {
        Ok(delay) => delay,
        Err(e) => {
            tracing::warn!(error = %e, "failed to read capture delay, treating as unknown");
            None
        }
    };

    let total_duration_secs = match parse_total(lines) {
        Ok(total) => total,
        Err(e) => {
            tracing::warn!(error = %e, "failed to read capture total, treating as unknown");
            None
        }
    };

    HeaderMetadata {
        delay_ms,
        total_duration_secs,
    }
}

fn parse_delay(first: Option<&str>) -> Result<Option<String>, MetadataError> {
    let line = match first {
        Some(l) => l.trim_start_matches('\u{feff}'),
        None => return Ok(None),
    };
    if !line.starts_with(COMMENT_MARKER) || !line.contains("Delay") {
        return Ok(None);
    }

    let value = line
        .split_once(':')
        .map(|(_, v)| v.trim())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| MetadataError::MissingValue {
            line: line.to_string(),
        })?;
    Ok(Some(value.to_string()))
}

/// Scan from the end; the matching line closest to the end of the file wins.
fn parse_total(lines: &[&str]) -> Result<Option<u64>, MetadataError> {
    let line = match lines.iter().rev().find(|l| TOTAL_LINE.is_match(l)) {
        Some(l) => l,
        None => return Ok(None),
    };

    let value = line
        .split_once(':')
        .map(|(_, v)| v.trim())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| MetadataError::MissingValue {
            line: line.to_string(),
        })?;
    value
        .parse::<u64>()
        .map(Some)
        .map_err(|_| MetadataError::InvalidTotal {
            value: value.to_string(),
        })
}
