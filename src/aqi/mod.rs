//! AQI derivation and health-risk classification.
//!
//! Pure numeric functions with no I/O and no shared state; every other
//! component builds on the values computed here.

mod engine;

pub use engine::*;
