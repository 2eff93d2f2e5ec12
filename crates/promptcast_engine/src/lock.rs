use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use engine_logging::engine_warn;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LockError {
    #[error("another run holds {path:?}; delete it if no run is in progress")]
    Held { path: PathBuf },
    #[error("failed to create lock file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Exclusive marker file around a full run. Removed on drop.
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
}

impl RunLock {
    /// `<queue file>.lock` next to the queue file.
    pub fn path_for(queue_path: &Path) -> PathBuf {
        let mut name = queue_path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".lock");
        queue_path.with_file_name(name)
    }

    pub fn acquire(path: impl Into<PathBuf>) -> Result<Self, LockError> {
        let path = path.into();
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                return Err(LockError::Held { path });
            }
            Err(source) => return Err(LockError::Io { path, source }),
        };
        if let Err(err) = writeln!(file, "{}", std::process::id()) {
            engine_warn!("Failed to record pid in {:?}: {}", path, err);
        }
        Ok(Self { path })
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if let Err(err) = fs::remove_file(&self.path) {
            engine_warn!("Failed to remove lock file {:?}: {}", self.path, err);
        }
    }
}
