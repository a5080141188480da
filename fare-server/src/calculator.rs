//! Batch fare calculation.
//!
//! Sums the cost of a list of planned trips. A trip costs its one-way fare,
//! doubled for a round trip, times the number of repeats. The batch is
//! all-or-nothing: the first failing item aborts the whole calculation.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::fares::{FareError, FareKey, FareLookup, FareSource};
use crate::stations::{StationDirectory, StationError};

/// One planned trip in a fare calculation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FareLineItem {
    /// Origin station display name
    #[serde(rename = "startStationName", default)]
    pub origin_name: String,

    /// Destination station display name
    #[serde(rename = "endStationName", default)]
    pub destination_name: String,

    /// Whether the trip is a return journey
    #[serde(rename = "isRoundTrip", default)]
    pub round_trip: bool,

    /// Number of times the trip is made. 0 means "not given" and counts as 1.
    #[serde(rename = "Trips", default)]
    pub repeat_count: u32,
}

impl FareLineItem {
    /// A single one-way trip.
    pub fn new(origin_name: impl Into<String>, destination_name: impl Into<String>) -> Self {
        Self {
            origin_name: origin_name.into(),
            destination_name: destination_name.into(),
            round_trip: false,
            repeat_count: 1,
        }
    }

    /// Mark the trip as a round trip.
    pub fn round_trip(mut self) -> Self {
        self.round_trip = true;
        self
    }

    /// Set the number of repeats.
    pub fn with_repeat_count(mut self, repeat_count: u32) -> Self {
        self.repeat_count = repeat_count;
        self
    }

    /// Factor applied to the one-way fare.
    pub fn multiplier(&self) -> i64 {
        let legs = if self.round_trip { 2 } else { 1 };
        legs * i64::from(self.repeat_count.max(1))
    }
}

/// Errors that abort a fare calculation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CalculateError {
    /// A station name did not resolve
    #[error(transparent)]
    Station(#[from] StationError),

    /// The fare lookup failed
    #[error(transparent)]
    Fare(#[from] FareError),

    /// The fare record carried a non-numeric amount
    #[error("invalid fare amount {value:?} for {key}: {message}")]
    FareParse {
        key: FareKey,
        value: String,
        message: String,
    },

    /// The total does not fit in an i64
    #[error("fare total overflowed at item {item}")]
    Overflow { item: usize },
}

/// Computes totals over batches of trips.
pub struct FareCalculator<'a, S> {
    stations: &'a StationDirectory,
    fares: &'a FareLookup<S>,
}

impl<'a, S: FareSource> FareCalculator<'a, S> {
    /// Create a new calculator.
    pub fn new(stations: &'a StationDirectory, fares: &'a FareLookup<S>) -> Self {
        Self { stations, fares }
    }

    /// Total cost of every item, or the first error encountered.
    pub async fn calculate_total(&self, items: &[FareLineItem]) -> Result<i64, CalculateError> {
        let mut total: i64 = 0;

        for (index, item) in items.iter().enumerate() {
            let item_no = index + 1;
            debug!(
                item = item_no,
                origin = %item.origin_name,
                destination = %item.destination_name,
                round_trip = item.round_trip,
                repeat_count = item.repeat_count,
                "pricing trip"
            );

            let cost = self.item_cost(item_no, item).await?;
            total = total
                .checked_add(cost)
                .ok_or(CalculateError::Overflow { item: item_no })?;

            debug!(item = item_no, cost, total, "priced trip");
        }

        Ok(total)
    }

    async fn item_cost(&self, item_no: usize, item: &FareLineItem) -> Result<i64, CalculateError> {
        let origin_id = self.stations.resolve_identifier(&item.origin_name)?;
        let destination_id = self.stations.resolve_identifier(&item.destination_name)?;
        let key = FareKey::new(origin_id, destination_id);

        let record = self.fares.resolve_fare(&key).await?;
        let fare = record.fare().map_err(|e| CalculateError::FareParse {
            key,
            value: record.fare_amount.clone(),
            message: e.to_string(),
        })?;

        fare.checked_mul(item.multiplier())
            .ok_or(CalculateError::Overflow { item: item_no })
    }
}
