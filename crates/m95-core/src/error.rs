//! Error types for m95-core
//!
//! This module provides a no_std compatible error type that is shared by
//! every layer of the driver, from the address encoder up to the device
//! facade.

use core::fmt;

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    // Configuration errors
    /// The configured number of address bytes is not 1, 2 or 3
    InvalidAddressWidth(u8),
    /// The configured page size is zero
    InvalidPageSize,

    // Operation errors
    /// The write-in-progress bit did not clear within the poll budget
    WriteTimeout,
    /// Address range extends beyond the configured device size
    AddressOutOfBounds,

    // Feature errors
    /// The part has no identification page
    NoIdPage,

    // Continuous read misuse
    /// A continuous-read operation was called without an open session
    NotInContinuousRead,
    /// A continuous-read session is already holding the bus
    ContinuousReadActive,

    // Bus errors
    /// The bus transport failed to exchange a byte
    SpiTransferFailed,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidAddressWidth(width) => {
                write!(f, "unsupported address width: {} bytes", width)
            }
            Self::InvalidPageSize => write!(f, "page size must be non-zero"),
            Self::WriteTimeout => write!(f, "write did not complete in time"),
            Self::AddressOutOfBounds => write!(f, "address out of bounds"),
            Self::NoIdPage => write!(f, "device has no identification page"),
            Self::NotInContinuousRead => write!(f, "no continuous read in progress"),
            Self::ContinuousReadActive => write!(f, "continuous read in progress"),
            Self::SpiTransferFailed => write!(f, "SPI transfer failed"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
