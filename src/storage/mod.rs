//! Log store
//!
//! Owns the logs directory and writes one file per request body.
//! Writes are serialized so that same-second collisions resolve
//! deterministically under either collision policy.

pub mod naming;

use chrono::{DateTime, Local};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::config::{CollisionPolicy, StorageConfig};
use crate::error::{RelayError, Result};

pub struct LogStore {
    dir: PathBuf,
    prefix: String,
    collision: CollisionPolicy,
    write_lock: Mutex<()>,
}

impl LogStore {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>, collision: CollisionPolicy) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
            collision,
            write_lock: Mutex::new(()),
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(&config.dir, &config.prefix, config.collision)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The directory is never created here; callers only warn when it is missing
    pub fn dir_exists(&self) -> bool {
        self.dir.is_dir()
    }

    /// Persist `body` under a name derived from the current local time
    pub async fn persist(&self, body: &[u8]) -> Result<PathBuf> {
        self.persist_at(Local::now(), body).await
    }

    pub async fn persist_at(&self, at: DateTime<Local>, body: &[u8]) -> Result<PathBuf> {
        let _guard = self.write_lock.lock().await;

        match self.collision {
            CollisionPolicy::Overwrite => {
                let path = self.dir.join(naming::file_name(&self.prefix, &at, None));
                write_file(&path, body, false).await?;
                Ok(path)
            }
            CollisionPolicy::Suffix => {
                let mut seq = None;
                loop {
                    let path = self.dir.join(naming::file_name(&self.prefix, &at, seq));
                    match write_file(&path, body, true).await {
                        Ok(()) => return Ok(path),
                        Err(RelayError::FilesystemFault { source, .. })
                            if source.kind() == ErrorKind::AlreadyExists =>
                        {
                            seq = Some(seq.map_or(1, |n: u32| n + 1));
                        }
                        Err(e) => return Err(e),
                    }
                }
            }
        }
    }
}

/// Create (or truncate) `path` and write all of `body`.
/// The file handle is dropped, and so closed, on every return path.
async fn write_file(path: &Path, body: &[u8], create_new: bool) -> Result<()> {
    let fault = |source| RelayError::FilesystemFault {
        path: path.to_path_buf(),
        source,
    };

    let mut options = OpenOptions::new();
    options.write(true);
    if create_new {
        options.create_new(true);
    } else {
        options.create(true).truncate(true);
    }

    let mut file = options.open(path).await.map_err(fault)?;
    file.write_all(body).await.map_err(fault)?;
    file.flush().await.map_err(fault)?;
    Ok(())
}
