//! A session log loaded from disk.
//!
//! The file is opened read-only, read to completion and closed before any
//! parsing happens, so every later stage works on owned text.

use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct SessionLog {
    path: PathBuf,
    content: String,
}

impl SessionLog {
    /// Read the whole session file. I/O failures propagate unchanged.
    pub fn read(path: &Path) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        tracing::debug!(
            file = %path.display(),
            bytes = content.len(),
            "read session file"
        );
        Ok(Self {
            path: path.to_path_buf(),
            content,
        })
    }

    /// Build a log from in-memory text, e.g. for piping through the pipeline.
    #[cfg(test)]
    pub fn from_text(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// All lines of the file, comment lines included.
    pub fn lines(&self) -> Vec<&str> {
        self.content.lines().collect()
    }
}
