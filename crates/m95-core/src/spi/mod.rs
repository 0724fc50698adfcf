//! SPI types and command structures
//!
//! This module provides the address encoding shared by every command, the
//! command frame type, the M95 instruction set and the status register
//! layout.

mod address;
mod command;
pub mod opcodes;
mod status;

pub use address::{AddressWidth, EncodedAddress};
pub use command::SpiCommand;
pub use opcodes::*;
pub use status::{BlockProtection, StatusRegister};
