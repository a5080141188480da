//! In-memory station directory.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::StationError;

/// A station as it appears in the station list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Station {
    /// Identifier used by the fare API (e.g. "BL12")
    #[serde(rename = "StationSID")]
    pub identifier: String,

    /// Display name
    #[serde(rename = "StationName")]
    pub name: String,
}

impl Station {
    /// Create a station from an identifier and a display name.
    pub fn new(identifier: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            name: name.into(),
        }
    }
}

/// Read-only station lookup.
///
/// Built once at startup and shared behind an `Arc`. Names are not required
/// to be unique; lookups take the first station in list order.
#[derive(Debug, Clone, Default)]
pub struct StationDirectory {
    stations: Vec<Station>,
}

impl StationDirectory {
    /// Build a directory from an in-memory list.
    pub fn new(stations: Vec<Station>) -> Self {
        Self { stations }
    }

    /// Load the station list from a JSON file.
    ///
    /// The file must contain an array of `{"StationSID", "StationName"}`
    /// objects. Any read or parse failure is reported as
    /// [`StationError::Load`]; no partial directory is ever returned.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StationError> {
        let path = path.as_ref();
        let load_error = |message: String| StationError::Load {
            path: path.to_path_buf(),
            message,
        };

        let contents = std::fs::read_to_string(path).map_err(|e| load_error(e.to_string()))?;
        let stations: Vec<Station> =
            serde_json::from_str(&contents).map_err(|e| load_error(e.to_string()))?;

        debug!(path = %path.display(), count = stations.len(), "loaded station list");
        Ok(Self::new(stations))
    }

    /// Look up a station identifier by exact name.
    pub fn resolve_identifier(&self, name: &str) -> Result<&str, StationError> {
        self.stations
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.identifier.as_str())
            .ok_or_else(|| StationError::NotFound {
                name: name.to_string(),
            })
    }

    /// Stations whose name contains `query`, in directory order.
    ///
    /// An empty query matches every station.
    pub fn search<'a>(&'a self, query: &'a str) -> impl Iterator<Item = &'a Station> + 'a {
        self.stations.iter().filter(move |s| s.name.contains(query))
    }

    /// All stations in directory order.
    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    /// Get the number of stations in the directory.
    pub fn len(&self) -> usize {
        self.stations.len()
    }

    /// Check if the directory is empty.
    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }
}
