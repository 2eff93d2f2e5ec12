use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use engine_logging::engine_debug;
use thiserror::Error;

use crate::persist::{AtomicFileWriter, PersistError};

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("failed to read prompt queue {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to rewrite prompt queue {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: PersistError,
    },
    #[error("prompt queue path {0:?} has no file name")]
    InvalidPath(PathBuf),
}

/// FIFO of prompts stored one per line in a UTF-8 text file.
///
/// Blank lines are not entries. A missing file is an empty queue. The file is
/// only ever changed by [`PromptQueue::commit_remove_first`].
#[derive(Debug, Clone)]
pub struct PromptQueue {
    path: PathBuf,
}

impl PromptQueue {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Head of the queue without modifying the store.
    pub fn peek_first(&self) -> Result<Option<String>, QueueError> {
        let content = self.read()?;
        Ok(content
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(ToOwned::to_owned))
    }

    /// All pending prompts in order.
    pub fn pending(&self) -> Result<Vec<String>, QueueError> {
        let content = self.read()?;
        Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(ToOwned::to_owned)
            .collect())
    }

    /// Removes the first non-blank line and atomically rewrites the store.
    ///
    /// Every other line, blank or not, is kept byte for byte. Returns the
    /// removed prompt, or `None` when there was nothing to remove.
    pub fn commit_remove_first(&self) -> Result<Option<String>, QueueError> {
        let content = self.read()?;

        let mut removed = None;
        let mut remaining = String::with_capacity(content.len());
        for line in content.split_inclusive('\n') {
            if removed.is_none() && !line.trim().is_empty() {
                removed = Some(line.trim().to_string());
                continue;
            }
            remaining.push_str(line);
        }

        if removed.is_none() {
            return Ok(None);
        }

        let (dir, filename) = self.split_path()?;
        AtomicFileWriter::new(dir)
            .write(&filename, remaining.as_bytes())
            .map_err(|source| QueueError::Write {
                path: self.path.clone(),
                source,
            })?;
        engine_debug!("Removed head prompt from {:?}", self.path);
        Ok(removed)
    }

    fn read(&self) -> Result<String, QueueError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(content),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(String::new()),
            Err(source) => Err(QueueError::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn split_path(&self) -> Result<(PathBuf, String), QueueError> {
        let filename = self
            .path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| QueueError::InvalidPath(self.path.clone()))?
            .to_string();
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Ok((dir, filename))
    }
}
