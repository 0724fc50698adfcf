//! Bus trait definitions

use crate::error::Result;

/// Bit order on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BitOrder {
    /// Most significant bit first
    #[default]
    MsbFirst,
    /// Least significant bit first
    LsbFirst,
}

/// SPI clock polarity/phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SpiMode {
    /// CPOL=0, CPHA=0: clock idles low, sample on the leading edge
    #[default]
    Mode0,
    /// CPOL=0, CPHA=1
    Mode1,
    /// CPOL=1, CPHA=0
    Mode2,
    /// CPOL=1, CPHA=1
    Mode3,
}

impl SpiMode {
    /// Clock level while idle
    pub const fn cpol(&self) -> bool {
        matches!(self, Self::Mode2 | Self::Mode3)
    }

    /// True if data is sampled on the trailing edge
    pub const fn cpha(&self) -> bool {
        matches!(self, Self::Mode1 | Self::Mode3)
    }
}

/// Protocol parameters requested when a bus session begins
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BusSettings {
    /// SPI clock in Hz, must not exceed the part's rating
    pub clock_hz: u32,
    /// Bit order
    pub bit_order: BitOrder,
    /// Clock polarity/phase
    pub mode: SpiMode,
}

/// Default SPI clock speed in Hz (10 MHz)
pub const DEFAULT_CLOCK_HZ: u32 = 10_000_000;

impl BusSettings {
    /// Settings every M95 part accepts: 10 MHz, MSB first, mode 0
    pub const M95: Self = Self {
        clock_hz: DEFAULT_CLOCK_HZ,
        bit_order: BitOrder::MsbFirst,
        mode: SpiMode::Mode0,
    };

    /// Set the SPI clock in Hz
    pub const fn with_clock(mut self, clock_hz: u32) -> Self {
        self.clock_hz = clock_hz;
        self
    }
}

impl Default for BusSettings {
    fn default() -> Self {
        Self::M95
    }
}

/// SPI bus transport
///
/// This is everything the driver needs from the platform: exclusive bus
/// sessions, chip-select control, single-byte full-duplex exchange and a
/// blocking delay.
///
/// The driver always brackets its traffic as
/// `begin_transaction` → (`select` → `transfer`* → `deselect`)* →
/// `end_transaction`, and never calls `transfer` outside a selected frame.
///
/// ## Example
///
/// ```ignore
/// impl SpiBus for ArduinoSpi {
///     fn begin_transaction(&mut self, settings: &BusSettings) {
///         self.spi.begin_transaction(settings.clock_hz, settings.mode);
///     }
///
///     fn end_transaction(&mut self) {
///         self.spi.end_transaction();
///     }
///
///     fn select(&mut self, cs: u8) {
///         self.pins.write(cs, Level::Low);
///     }
///
///     fn deselect(&mut self, cs: u8) {
///         self.pins.write(cs, Level::High);
///     }
///
///     fn transfer(&mut self, byte: u8) -> Result<u8> {
///         Ok(self.spi.transfer(byte))
///     }
///
///     fn delay_us(&mut self, us: u32) {
///         self.timer.delay_us(us);
///     }
/// }
/// ```
pub trait SpiBus {
    /// Acquire the bus exclusively and apply `settings`
    fn begin_transaction(&mut self, settings: &BusSettings);

    /// Release the bus acquired by `begin_transaction`
    fn end_transaction(&mut self);

    /// Assert chip select `cs` (drive it low)
    fn select(&mut self, cs: u8);

    /// Deassert chip select `cs` (drive it high)
    fn deselect(&mut self, cs: u8);

    /// Exchange one byte, returning the byte clocked in
    fn transfer(&mut self, byte: u8) -> Result<u8>;

    /// Delay for the specified number of microseconds
    fn delay_us(&mut self, us: u32);

    /// Delay for the specified number of milliseconds
    fn delay_ms(&mut self, ms: u32) {
        for _ in 0..ms {
            self.delay_us(1000);
        }
    }

    /// Optional: configure the chip-select line as an output
    fn claim_cs(&mut self, _cs: u8) {}

    /// Optional: return the chip-select line to its reset state
    fn release_cs(&mut self, _cs: u8) {}
}

impl<T: SpiBus + ?Sized> SpiBus for &mut T {
    fn begin_transaction(&mut self, settings: &BusSettings) {
        (**self).begin_transaction(settings)
    }

    fn end_transaction(&mut self) {
        (**self).end_transaction()
    }

    fn select(&mut self, cs: u8) {
        (**self).select(cs)
    }

    fn deselect(&mut self, cs: u8) {
        (**self).deselect(cs)
    }

    fn transfer(&mut self, byte: u8) -> Result<u8> {
        (**self).transfer(byte)
    }

    fn delay_us(&mut self, us: u32) {
        (**self).delay_us(us)
    }

    fn delay_ms(&mut self, ms: u32) {
        (**self).delay_ms(ms)
    }

    fn claim_cs(&mut self, cs: u8) {
        (**self).claim_cs(cs)
    }

    fn release_cs(&mut self, cs: u8) {
        (**self).release_cs(cs)
    }
}

// Boxed buses allow picking a transport at runtime
#[cfg(feature = "alloc")]
impl<T: SpiBus + ?Sized> SpiBus for alloc::boxed::Box<T> {
    fn begin_transaction(&mut self, settings: &BusSettings) {
        (**self).begin_transaction(settings)
    }

    fn end_transaction(&mut self) {
        (**self).end_transaction()
    }

    fn select(&mut self, cs: u8) {
        (**self).select(cs)
    }

    fn deselect(&mut self, cs: u8) {
        (**self).deselect(cs)
    }

    fn transfer(&mut self, byte: u8) -> Result<u8> {
        (**self).transfer(byte)
    }

    fn delay_us(&mut self, us: u32) {
        (**self).delay_us(us)
    }

    fn delay_ms(&mut self, ms: u32) {
        (**self).delay_ms(ms)
    }

    fn claim_cs(&mut self, cs: u8) {
        (**self).claim_cs(cs)
    }

    fn release_cs(&mut self, cs: u8) {
        (**self).release_cs(cs)
    }
}
