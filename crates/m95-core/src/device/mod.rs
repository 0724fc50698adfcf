//! EEPROM device facade
//!
//! This module provides `M95Eeprom`, the public entry point that composes
//! the bus session, address encoding, command frames, page-split writes
//! and status polling into byte-range operations.

mod config;
mod continuous;
mod eeprom;

pub use config::DeviceConfig;
#[cfg(feature = "std")]
pub use config::{parse_options, parse_options_with, ConfigError};
pub use continuous::ContinuousReader;
pub use eeprom::M95Eeprom;
