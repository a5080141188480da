//! Fare record types.

use std::fmt;
use std::num::ParseIntError;

use serde::{Deserialize, Serialize};

/// Cache key: (origin identifier, destination identifier).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FareKey {
    pub origin_id: String,
    pub destination_id: String,
}

impl FareKey {
    pub fn new(origin_id: impl Into<String>, destination_id: impl Into<String>) -> Self {
        Self {
            origin_id: origin_id.into(),
            destination_id: destination_id.into(),
        }
    }
}

impl fmt::Display for FareKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.origin_id, self.destination_id)
    }
}

/// A single fare as returned by the fare API.
///
/// Field names on the wire follow the fare API, and the same shape is used
/// for the cache file and the `/metrodata` response. Every field is a
/// string, including the amount. Only the station pair is required; any
/// other field the API leaves out reads as an empty string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FareRecord {
    #[serde(rename = "StartSID")]
    pub origin_id: String,

    #[serde(rename = "EndSID")]
    pub destination_id: String,

    #[serde(rename = "StartStationName", default)]
    pub origin_name: String,

    #[serde(rename = "EndStationName", default)]
    pub destination_name: String,

    /// Full fare, decimal digits
    #[serde(rename = "DeductedFare", default)]
    pub fare_amount: String,

    #[serde(rename = "Discount60", default)]
    pub discount_60: String,

    #[serde(rename = "Discount40", default)]
    pub discount_40: String,

    #[serde(rename = "Lang", default)]
    pub language: String,
}

impl FareRecord {
    /// The key this record is cached under.
    pub fn key(&self) -> FareKey {
        FareKey::new(&self.origin_id, &self.destination_id)
    }

    /// Whether this record belongs to the given station pair.
    pub fn matches(&self, key: &FareKey) -> bool {
        self.origin_id == key.origin_id && self.destination_id == key.destination_id
    }

    /// Parse the fare amount.
    ///
    /// A non-numeric amount is an error; there is no default.
    pub fn fare(&self) -> Result<i64, ParseIntError> {
        self.fare_amount.parse()
    }
}

#[cfg(test)]
pub(crate) fn sample_record(origin_id: &str, destination_id: &str, fare: &str) -> FareRecord {
    FareRecord {
        origin_id: origin_id.to_string(),
        destination_id: destination_id.to_string(),
        origin_name: format!("{origin_id} station"),
        destination_name: format!("{destination_id} station"),
        fare_amount: fare.to_string(),
        discount_60: "12".to_string(),
        discount_40: "18".to_string(),
        language: "tw".to_string(),
    }
}
