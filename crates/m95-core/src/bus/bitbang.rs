//! Bitbang SPI bus
//!
//! This module provides a `SpiBus` implementation on top of four GPIO
//! lines, for boards where the EEPROM is not wired to a hardware SPI
//! controller.
//!
//! ## Architecture
//!
//! 1. **BitbangPins** is the minimal set of pin operations a platform has
//!    to supply (chip select, clock, MOSI, MISO and delays)
//! 2. **Bitbang** turns those into full-duplex byte exchanges honouring
//!    the bit order and SPI mode requested by each bus session
//!
//! Clock timing is whatever `half_period_delay` produces; the requested
//! clock rate is only passed through to `BitbangPins::set_clock`.

use super::{BitOrder, BusSettings, SpiBus, SpiMode};
use crate::error::Result;

/// Trait for low-level bitbang pin operations
pub trait BitbangPins {
    /// Set chip select (CS is active low, so `active=true` means CS=0)
    fn set_cs(&mut self, cs: u8, active: bool);

    /// Set clock line value
    fn set_sck(&mut self, high: bool);

    /// Set MOSI line value
    fn set_mosi(&mut self, high: bool);

    /// Get MISO line value
    fn get_miso(&self) -> bool;

    /// Delay for half a clock period
    fn half_period_delay(&self);

    /// Delay for the specified number of microseconds
    fn delay_us(&mut self, us: u32);

    /// Optional: adapt `half_period_delay` to the requested clock
    fn set_clock(&mut self, _clock_hz: u32) {}

    /// Optional: Set SCK and MOSI atomically (optimization)
    ///
    /// Default implementation calls `set_sck` then `set_mosi`.
    fn set_sck_set_mosi(&mut self, sck: bool, mosi: bool) {
        self.set_sck(sck);
        self.set_mosi(mosi);
    }

    /// Optional: Set SCK and get MISO atomically (optimization)
    ///
    /// Default implementation calls `set_sck` then `get_miso`.
    fn set_sck_get_miso(&mut self, sck: bool) -> bool {
        self.set_sck(sck);
        self.get_miso()
    }

    /// Optional: Request exclusive bus access
    fn request_bus(&mut self) {}

    /// Optional: Release bus access
    fn release_bus(&mut self) {}

    /// Optional: configure the chip-select pin as an output
    fn claim_cs(&mut self, _cs: u8) {}

    /// Optional: return the chip-select pin to an input
    fn release_cs(&mut self, _cs: u8) {}
}

/// `SpiBus` driven by software-controlled pins
pub struct Bitbang<P: BitbangPins> {
    pins: P,
    bit_order: BitOrder,
    mode: SpiMode,
}

impl<P: BitbangPins> Bitbang<P> {
    /// Wrap a set of pins
    pub fn new(pins: P) -> Self {
        Self {
            pins,
            bit_order: BitOrder::MsbFirst,
            mode: SpiMode::Mode0,
        }
    }

    /// Get a reference to the pins
    pub fn pins(&self) -> &P {
        &self.pins
    }

    /// Give the pins back
    pub fn into_pins(self) -> P {
        self.pins
    }

    fn transfer_bit(&mut self, out: bool) -> bool {
        let idle = self.mode.cpol();
        if self.mode.cpha() {
            // Shift on the leading edge, sample on the trailing edge
            self.pins.set_sck_set_mosi(!idle, out);
            self.pins.half_period_delay();
            let bit = self.pins.set_sck_get_miso(idle);
            self.pins.half_period_delay();
            bit
        } else {
            // Data valid before the leading edge, sample on it
            self.pins.set_sck_set_mosi(idle, out);
            self.pins.half_period_delay();
            let bit = self.pins.set_sck_get_miso(!idle);
            self.pins.half_period_delay();
            bit
        }
    }
}

impl<P: BitbangPins> SpiBus for Bitbang<P> {
    fn begin_transaction(&mut self, settings: &BusSettings) {
        self.pins.request_bus();
        self.bit_order = settings.bit_order;
        self.mode = settings.mode;
        self.pins.set_clock(settings.clock_hz);
        self.pins.set_sck(self.mode.cpol());
    }

    fn end_transaction(&mut self) {
        self.pins.release_bus();
    }

    fn select(&mut self, cs: u8) {
        self.pins.set_cs(cs, true);
    }

    fn deselect(&mut self, cs: u8) {
        self.pins.set_cs(cs, false);
    }

    fn transfer(&mut self, byte: u8) -> Result<u8> {
        let mut input = 0u8;
        for i in 0..8 {
            let shift = match self.bit_order {
                BitOrder::MsbFirst => 7 - i,
                BitOrder::LsbFirst => i,
            };
            if self.transfer_bit((byte >> shift) & 1 != 0) {
                input |= 1 << shift;
            }
        }
        self.pins.set_sck(self.mode.cpol());
        Ok(input)
    }

    fn delay_us(&mut self, us: u32) {
        self.pins.delay_us(us);
    }

    fn claim_cs(&mut self, cs: u8) {
        self.pins.claim_cs(cs);
    }

    fn release_cs(&mut self, cs: u8) {
        self.pins.release_cs(cs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// MISO wired to MOSI, clock edges counted
    #[derive(Default)]
    struct Loopback {
        mosi: bool,
        sck: bool,
        rising_edges: u32,
        cs_active: bool,
        requested: bool,
    }

    impl BitbangPins for Loopback {
        fn set_cs(&mut self, _cs: u8, active: bool) {
            self.cs_active = active;
        }

        fn set_sck(&mut self, high: bool) {
            if high && !self.sck {
                self.rising_edges += 1;
            }
            self.sck = high;
        }

        fn set_mosi(&mut self, high: bool) {
            self.mosi = high;
        }

        fn get_miso(&self) -> bool {
            self.mosi
        }

        fn half_period_delay(&self) {}

        fn delay_us(&mut self, _us: u32) {}

        fn request_bus(&mut self) {
            self.requested = true;
        }

        fn release_bus(&mut self) {
            self.requested = false;
        }
    }

    #[test]
    fn test_loopback_mode0() {
        let mut bus = Bitbang::new(Loopback::default());
        bus.begin_transaction(&BusSettings::M95);
        assert!(bus.pins().requested);

        bus.select(0);
        assert!(bus.pins().cs_active);
        for byte in [0x00, 0xA5, 0x5A, 0xFF, 0x01, 0x80] {
            assert_eq!(bus.transfer(byte).unwrap(), byte);
        }
        bus.deselect(0);
        bus.end_transaction();

        let pins = bus.into_pins();
        assert_eq!(pins.rising_edges, 6 * 8);
        assert!(!pins.sck);
        assert!(!pins.cs_active);
        assert!(!pins.requested);
    }

    #[test]
    fn test_loopback_lsb_first_mode3() {
        let mut bus = Bitbang::new(Loopback::default());
        let settings = BusSettings {
            bit_order: BitOrder::LsbFirst,
            mode: SpiMode::Mode3,
            ..BusSettings::M95
        };
        bus.begin_transaction(&settings);
        assert!(bus.pins().sck);
        assert_eq!(bus.transfer(0x3C).unwrap(), 0x3C);
        assert!(bus.pins().sck);
        bus.end_transaction();
    }
}
