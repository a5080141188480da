//! Station directory error types.

use std::path::PathBuf;

/// Errors that can occur when loading or querying the station directory.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StationError {
    /// The station list could not be read or parsed
    #[error("failed to load stations from {}: {message}", path.display())]
    Load { path: PathBuf, message: String },

    /// No station has exactly this name
    #[error("station not found: {name}")]
    NotFound { name: String },
}
