//! Defines the data structures and models used throughout the application.
//!
//! This includes structures representing rows read from the source CSV,
//! enriched readings used for internal processing, and the result types
//! returned by analysis queries for display.

mod reading;
mod summary;

pub use reading::*;
pub use summary::*;
