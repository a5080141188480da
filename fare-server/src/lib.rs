//! Metro fare server.
//!
//! A small HTTP façade that resolves station names to identifiers, looks up
//! fares from a remote fare API with an on-disk cache in front of it, and
//! totals the cost of a batch of planned trips.

pub mod calculator;
pub mod config;
pub mod fares;
pub mod stations;
pub mod web;
