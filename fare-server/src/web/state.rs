//! Application state for the web layer.

use std::sync::Arc;

use crate::fares::{FareClient, FareLookup};
use crate::stations::StationDirectory;

/// Shared application state.
///
/// Contains all the services needed to handle requests.
pub struct AppState<S = FareClient> {
    /// Station name lookup, loaded at startup
    pub stations: Arc<StationDirectory>,

    /// Cached fare lookup
    pub fares: Arc<FareLookup<S>>,
}

impl<S> AppState<S> {
    /// Create a new app state.
    pub fn new(stations: StationDirectory, fares: FareLookup<S>) -> Self {
        Self {
            stations: Arc::new(stations),
            fares: Arc::new(fares),
        }
    }
}

// Manual impl: derive would require `S: Clone`.
impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            stations: self.stations.clone(),
            fares: self.fares.clone(),
        }
    }
}
