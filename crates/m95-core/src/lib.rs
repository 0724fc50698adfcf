//! m95-core - Driver for M95-family SPI EEPROMs
//!
//! This crate talks to serial EEPROMs of the ST M95 family (and the many
//! pin- and command-compatible parts from other vendors). It turns byte
//! range reads and writes into the chip's command protocol, splits writes
//! on page boundaries, waits for each page to commit, and offers a
//! continuous-read mode for streaming long sequential reads.
//!
//! The crate is `no_std`. The bus itself is provided by the caller through
//! the [`bus::SpiBus`] trait.
//!
//! # Features
//!
//! - `std` - Enable standard library support (includes `alloc`), the RON
//!   part database and option-string parsing
//! - `alloc` - Enable heap allocation
//!
//! # Example
//!
//! ```ignore
//! use m95_core::{chip, DeviceConfig, M95Eeprom};
//!
//! fn dump<B: m95_core::bus::SpiBus>(bus: B) -> m95_core::Result<()> {
//!     let part = chip::find_part("M95256").unwrap();
//!     let mut eeprom = M95Eeprom::new(bus, DeviceConfig::for_part(0, part));
//!     eeprom.begin();
//!
//!     if !eeprom.exists()? {
//!         return Ok(());
//!     }
//!
//!     eeprom.write(0x20, b"hello")?;
//!     let mut buf = [0u8; 5];
//!     eeprom.read(0x20, &mut buf)?;
//!     Ok(())
//! }
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod bus;
pub mod chip;
pub mod device;
pub mod error;
pub mod protocol;
pub mod spi;

pub use device::{ContinuousReader, DeviceConfig, M95Eeprom};
pub use protocol::PollPolicy;
pub use error::{Error, Result};
