//! Web layer for the fare server.
//!
//! Provides HTTP endpoints for station search, single fare lookup and batch
//! fare calculation.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
