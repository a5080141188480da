//! Data transfer objects for web requests and responses.

use serde::{Deserialize, Serialize};

/// Query for a single fare lookup.
#[derive(Debug, Deserialize)]
pub struct MetroDataRequest {
    /// Origin station display name
    #[serde(rename = "startName", default)]
    pub start_name: String,

    /// Destination station display name
    #[serde(rename = "endName", default)]
    pub end_name: String,
}

/// Query for station search.
#[derive(Debug, Deserialize)]
pub struct SearchStationsRequest {
    /// Substring to look for; empty matches every station
    #[serde(default)]
    pub query: String,
}

/// Response for batch fare calculation.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CalculateFareResponse {
    #[serde(rename = "totalFare")]
    pub total_fare: i64,
}

/// Error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,

    /// Stable machine-readable error code
    pub code: String,
}
