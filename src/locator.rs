//! Session file discovery.
//!
//! Session logs live in one directory and are named so that an ascending
//! lexicographic sort of file names is also chronological
//! (`session_007.csv`, `session_2024-05-01T10-00.csv`, ...). The newest
//! session is therefore the last name in sort order.

use std::path::{Path, PathBuf};

/// Result of looking for the newest session in a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Located {
    /// At least one file matched; `path` is the newest of `count` matches.
    Found { path: PathBuf, count: usize },
    /// Nothing matched the pattern. A normal terminal condition, not an error.
    NoSessionsFound,
}

/// Errors from session discovery.
#[derive(Debug)]
pub enum LocateError {
    /// The configured file pattern is not a valid glob.
    Pattern {
        pattern: String,
        source: glob::PatternError,
    },
    /// A directory entry could not be read while walking the matches.
    Io { source: glob::GlobError },
}

impl std::fmt::Display for LocateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LocateError::Pattern { pattern, source } => {
                write!(f, "invalid session pattern {pattern:?}: {source}")
            }
            LocateError::Io { source } => write!(f, "failed to read session entry: {source}"),
        }
    }
}

impl std::error::Error for LocateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LocateError::Pattern { source, .. } => Some(source),
            LocateError::Io { source } => Some(source),
        }
    }
}

/// Pick the candidate whose file name sorts last.
///
/// Pure function over already-matched candidates; returns `None` for an
/// empty slice. Ordering compares file names only, never parent directories.
pub fn select_latest<P: AsRef<Path>>(candidates: &[P]) -> Option<&P> {
    candidates
        .iter()
        .max_by(|a, b| a.as_ref().file_name().cmp(&b.as_ref().file_name()))
}

/// List every regular file in `dir` whose name matches `pattern`, sorted by
/// file name ascending.
pub fn find_sessions(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, LocateError> {
    let full = format!(
        "{}/{}",
        glob::Pattern::escape(&dir.to_string_lossy()),
        pattern
    );
    let entries = glob::glob(&full).map_err(|e| LocateError::Pattern {
        pattern: pattern.to_string(),
        source: e,
    })?;

    let mut sessions = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| LocateError::Io { source: e })?;
        if path.is_file() {
            sessions.push(path);
        }
    }
    sessions.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    tracing::debug!(
        dir = %dir.display(),
        pattern,
        matches = sessions.len(),
        "scanned session directory"
    );
    Ok(sessions)
}

/// Find the newest session file in `dir` matching `pattern`.
pub fn locate_latest(dir: &Path, pattern: &str) -> Result<Located, LocateError> {
    let sessions = find_sessions(dir, pattern)?;
    match select_latest(&sessions) {
        Some(path) => Ok(Located::Found {
            path: path.clone(),
            count: sessions.len(),
        }),
        None => Ok(Located::NoSessionsFound),
    }
}
