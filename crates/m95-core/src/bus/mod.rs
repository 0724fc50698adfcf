//! Bus transport abstraction
//!
//! This module defines the `SpiBus` trait the driver is written against,
//! the scoped `BusSession`/`ChipSelect` guards that guarantee the bus is
//! released on every exit path, and a bitbang adapter for GPIO-only
//! targets.

pub mod bitbang;
mod session;
mod traits;

pub use bitbang::{Bitbang, BitbangPins};
pub use session::{BusSession, ChipSelect};
pub(crate) use session::{exchange_read, exchange_skip};
pub use traits::*;
