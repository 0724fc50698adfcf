//! M95 part types and database
//!
//! This module describes the geometry of known M95 parts so a device can
//! be configured by name, and (with `std`) loads additional parts from RON.

mod types;

#[cfg(feature = "std")]
mod database;

pub use types::*;

#[cfg(feature = "std")]
pub use database::*;
