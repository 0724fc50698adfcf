//! Device configuration

use crate::bus::{BusSettings, DEFAULT_CLOCK_HZ};
use crate::chip::{Geometry, Part};
use crate::error::{Error, Result};
use crate::protocol::PollPolicy;
use crate::spi::AddressWidth;

/// Configuration for one EEPROM on the bus
///
/// The address width is stored as a raw byte count and only validated when
/// an operation needs to encode an address; an unsupported width then
/// fails with [`Error::InvalidAddressWidth`] before anything is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceConfig {
    /// Chip-select line the part is wired to
    pub cs: u8,
    /// Write page size in bytes
    pub page_size: u32,
    /// Address bytes sent after READ/WRITE (1, 2 or 3)
    pub address_bytes: u8,
    /// Whether the part has an identification page
    pub id_page: bool,
    /// SPI clock in Hz (default: 10 MHz)
    pub clock_hz: u32,
    /// Array size in bytes, if known; enables range checks
    pub size: Option<u32>,
    /// Write completion polling budget
    pub poll: PollPolicy,
}

impl DeviceConfig {
    /// Create a configuration with 2 address bytes and no identification page
    pub const fn new(cs: u8, page_size: u32) -> Self {
        Self {
            cs,
            page_size,
            address_bytes: 2,
            id_page: false,
            clock_hz: DEFAULT_CLOCK_HZ,
            size: None,
            poll: PollPolicy::DEFAULT,
        }
    }

    /// Create a configuration from a part geometry
    pub fn for_geometry(cs: u8, geometry: &Geometry) -> Self {
        Self {
            cs,
            page_size: geometry.page_size,
            address_bytes: geometry.address_bytes,
            id_page: geometry.id_page,
            clock_hz: core::cmp::min(DEFAULT_CLOCK_HZ, geometry.max_clock_hz),
            size: Some(geometry.total_size),
            poll: PollPolicy::DEFAULT,
        }
    }

    /// Create a configuration for a built-in part
    pub fn for_part(cs: u8, part: &Part) -> Self {
        Self::for_geometry(cs, &part.geometry)
    }

    /// Set the number of address bytes
    pub const fn with_address_bytes(mut self, address_bytes: u8) -> Self {
        self.address_bytes = address_bytes;
        self
    }

    /// Declare whether the part has an identification page
    pub const fn with_id_page(mut self, id_page: bool) -> Self {
        self.id_page = id_page;
        self
    }

    /// Set the SPI clock in Hz
    pub const fn with_clock(mut self, clock_hz: u32) -> Self {
        self.clock_hz = clock_hz;
        self
    }

    /// Set the array size in bytes
    pub const fn with_size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    /// Set the write completion polling budget
    pub const fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    /// Validated address width
    pub fn address_width(&self) -> Result<AddressWidth> {
        AddressWidth::from_bytes(self.address_bytes)
    }

    /// Bus settings requested for every session with this part
    pub fn bus_settings(&self) -> BusSettings {
        BusSettings::M95.with_clock(self.clock_hz)
    }

    /// Check that `len` bytes at `addr` fit in the array, if its size is known
    pub fn check_range(&self, addr: u32, len: usize) -> Result<()> {
        match self.size {
            // Use u64 arithmetic to avoid truncation when len > u32::MAX
            Some(size) if addr as u64 + len as u64 > size as u64 => Err(Error::AddressOutOfBounds),
            _ => Ok(()),
        }
    }
}

#[cfg(feature = "std")]
pub use options::{parse_options, parse_options_with, ConfigError};

#[cfg(feature = "std")]
mod options {
    use super::DeviceConfig;
    use crate::chip::PartDatabase;
    use std::string::{String, ToString};
    use thiserror::Error;

    /// Errors from option-string parsing
    #[derive(Debug, Error)]
    pub enum ConfigError {
        /// Value could not be parsed
        #[error("Invalid {key} value: {value}")]
        InvalidValue {
            /// Option name
            key: String,
            /// Offending value
            value: String,
        },
        /// Part name not found in the database
        #[error("Unknown part: {0}")]
        UnknownPart(String),
        /// Neither `part` nor `page_size` given
        #[error("No geometry specified. Use part=<name> or page_size=<bytes>")]
        NoGeometry,
    }

    fn parse<T: core::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
        value.parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        })
    }

    fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
        match value {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidValue {
                key: key.to_string(),
                value: value.to_string(),
            }),
        }
    }

    /// Build a configuration from `key=value` options using the built-in parts
    ///
    /// Recognised keys: `cs`, `part`, `page_size`, `address_bytes`,
    /// `id_page`, `spispeed` (kHz), `size` (bytes). Explicit keys override
    /// the geometry taken from `part`.
    pub fn parse_options(options: &[(&str, &str)]) -> Result<DeviceConfig, ConfigError> {
        parse_options_with(options, &PartDatabase::new())
    }

    /// Like [`parse_options`], resolving `part` against `db`
    pub fn parse_options_with(
        options: &[(&str, &str)],
        db: &PartDatabase,
    ) -> Result<DeviceConfig, ConfigError> {
        let mut cs = 0u8;
        if let Some((key, value)) = options.iter().find(|(k, _)| *k == "cs") {
            cs = parse(key, value)?;
        }

        let mut config = match options.iter().find(|(k, _)| *k == "part") {
            Some((_, name)) => {
                let entry = db
                    .find(name)
                    .ok_or_else(|| ConfigError::UnknownPart(name.to_string()))?;
                DeviceConfig::for_geometry(cs, &entry.geometry)
            }
            None => {
                let (key, value) = options
                    .iter()
                    .find(|(k, _)| *k == "page_size")
                    .ok_or(ConfigError::NoGeometry)?;
                DeviceConfig::new(cs, parse(key, value)?)
            }
        };

        for (key, value) in options {
            match *key {
                "cs" | "part" => {}
                "page_size" => config.page_size = parse(key, value)?,
                "address_bytes" => config.address_bytes = parse(key, value)?,
                "id_page" => config.id_page = parse_bool(key, value)?,
                "spispeed" => {
                    let speed_khz: u32 = parse(key, value)?;
                    config.clock_hz = speed_khz.checked_mul(1000).ok_or_else(|| {
                        ConfigError::InvalidValue {
                            key: key.to_string(),
                            value: value.to_string(),
                        }
                    })?;
                }
                "size" => config.size = Some(parse(key, value)?),
                _ => {
                    log::warn!("m95: Unknown option: {}={}", key, value);
                }
            }
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chip::find_part;

    #[test]
    fn test_defaults() {
        let config = DeviceConfig::new(4, 32);
        assert_eq!(config.address_bytes, 2);
        assert!(!config.id_page);
        assert_eq!(config.address_width(), Ok(AddressWidth::TwoByte));
        assert_eq!(config.bus_settings(), BusSettings::M95);
    }

    #[test]
    fn test_invalid_width_surfaces_lazily() {
        let config = DeviceConfig::new(0, 32).with_address_bytes(4);
        assert_eq!(config.address_width(), Err(Error::InvalidAddressWidth(4)));
    }

    #[test]
    fn test_for_part() {
        let config = DeviceConfig::for_part(1, find_part("M95M02-D").unwrap());
        assert_eq!(config.page_size, 256);
        assert_eq!(config.address_bytes, 3);
        assert!(config.id_page);
        assert_eq!(config.clock_hz, 5_000_000);
        assert_eq!(config.size, Some(256 * 1024));
    }

    #[test]
    fn test_check_range() {
        let config = DeviceConfig::new(0, 16).with_size(256);
        assert!(config.check_range(0, 256).is_ok());
        assert!(config.check_range(255, 1).is_ok());
        assert_eq!(config.check_range(250, 7), Err(Error::AddressOutOfBounds));
        assert!(DeviceConfig::new(0, 16).check_range(u32::MAX, 1).is_ok());
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_parse_options() {
        let config = parse_options(&[("part", "M95512"), ("cs", "2"), ("spispeed", "2000")]).unwrap();
        assert_eq!(config.cs, 2);
        assert_eq!(config.page_size, 128);
        assert_eq!(config.clock_hz, 2_000_000);

        let config =
            parse_options(&[("page_size", "32"), ("address_bytes", "1"), ("id_page", "yes")]).unwrap();
        assert_eq!(config.page_size, 32);
        assert_eq!(config.address_bytes, 1);
        assert!(config.id_page);

        assert!(matches!(parse_options(&[("cs", "1")]), Err(ConfigError::NoGeometry)));
        assert!(matches!(
            parse_options(&[("part", "M99999")]),
            Err(ConfigError::UnknownPart(_))
        ));
        assert!(matches!(
            parse_options(&[("page_size", "big")]),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
