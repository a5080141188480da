//! Fare lookup: remote fare API client, on-disk fare cache, and the
//! fetch-or-cache orchestrator that ties them together.
//!
//! Every successfully fetched record is appended to a JSON file and served
//! from there on later requests for the same station pair.

mod client;
mod error;
mod lookup;
mod store;
mod types;

pub use client::{FareClient, FareClientConfig, FareSource};
pub use error::FareError;
pub use lookup::FareLookup;
pub use store::FareStore;
pub use types::{FareKey, FareRecord};

#[cfg(test)]
pub(crate) use types::sample_record;
