//! Disk-based cache for fare records.
//!
//! The file holds a JSON array of [`FareRecord`]s. It is append-only: a
//! write reads the whole array, pushes one record and writes the array back.
//! Lookups scan linearly and take the first match, so duplicate entries are
//! harmless on read.

use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tracing::{debug, trace};

use super::error::FareError;
use super::types::{FareKey, FareRecord};

/// Flat-file fare cache.
#[derive(Debug)]
pub struct FareStore {
    path: PathBuf,
    /// Serializes the read-modify-write in [`FareStore::put`].
    write_lock: Mutex<()>,
}

impl FareStore {
    /// Create a store backed by the file at `path`.
    ///
    /// The file does not need to exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Get the cache file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every persisted record, in file order.
    ///
    /// A missing or empty file has no entries. Any other read failure, or
    /// content that is not a list of fare records, is a
    /// [`FareError::CacheRead`].
    pub fn entries(&self) -> Result<Vec<FareRecord>, FareError> {
        let contents = match std::fs::read(&self.path) {
            Ok(contents) => contents,
            Err(e) if is_missing(&e) => {
                debug!(path = %self.path.display(), "no fare cache file yet");
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(FareError::CacheRead {
                    message: format!("failed to read {}: {}", self.path.display(), e),
                });
            }
        };

        if contents.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        let entries: Option<Vec<FareRecord>> =
            serde_json::from_slice(&contents).map_err(|e| FareError::CacheRead {
                message: format!("{}: {}", self.path.display(), e),
            })?;

        Ok(entries.unwrap_or_default())
    }

    /// Look up the first record for a station pair.
    pub fn get(&self, key: &FareKey) -> Result<Option<FareRecord>, FareError> {
        let entries = self.entries()?;
        trace!(entries = entries.len(), %key, "scanning fare cache");
        Ok(entries.into_iter().find(|r| r.matches(key)))
    }

    /// Append a record and write the whole cache back.
    ///
    /// No deduplication is done here; callers check [`FareStore::get`] first.
    /// Creates parent directories if they don't exist.
    pub fn put(&self, record: &FareRecord) -> Result<(), FareError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut entries = self.entries()?;
        entries.push(record.clone());

        let json = serde_json::to_string(&entries).map_err(|e| FareError::CacheWrite {
            message: format!("failed to serialize cache: {}", e),
        })?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| FareError::CacheWrite {
                message: format!("failed to create cache directory: {}", e),
            })?;
        }

        write_atomic(&self.path, json.as_bytes()).map_err(|e| FareError::CacheWrite {
            message: format!("failed to write {}: {}", self.path.display(), e),
        })?;

        debug!(entries = entries.len(), key = %record.key(), "wrote fare cache");
        Ok(())
    }
}

/// The file, or one of its parent directories, does not exist.
fn is_missing(e: &io::Error) -> bool {
    matches!(e.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory)
}

/// Write via a sibling temp file so readers never see a partial array.
fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let temp_path = path.with_extension("tmp");
    let mut file = std::fs::File::create(&temp_path)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    std::fs::rename(&temp_path, path)
}
