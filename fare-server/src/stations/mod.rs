//! Station directory.
//!
//! Provides station name → identifier lookup and substring search over a
//! static station list loaded once at startup.

mod directory;
mod error;

pub use directory::{Station, StationDirectory};
pub use error::StationError;
