//! Scoped bus acquisition
//!
//! `BusSession` holds the bus between `begin_transaction` and
//! `end_transaction`; `ChipSelect` holds one chip-select frame. Both
//! release on drop, so an early `?` return never leaves the bus acquired
//! or the chip selected.

use super::{BusSettings, SpiBus};
use crate::error::Result;
use crate::spi::opcodes;

/// An exclusive bus session for one chip
pub struct BusSession<'a, B: SpiBus + ?Sized> {
    bus: &'a mut B,
    cs: u8,
}

impl<'a, B: SpiBus + ?Sized> BusSession<'a, B> {
    /// Acquire the bus with `settings` for chip select `cs`
    pub fn begin(bus: &'a mut B, cs: u8, settings: &BusSettings) -> Self {
        bus.begin_transaction(settings);
        Self { bus, cs }
    }

    /// Chip select this session talks to
    pub fn cs(&self) -> u8 {
        self.cs
    }

    /// Assert chip select for one command frame
    pub fn select(&mut self) -> ChipSelect<'_, B> {
        self.bus.select(self.cs);
        ChipSelect {
            bus: &mut *self.bus,
            cs: self.cs,
        }
    }

    /// Delay for the specified number of microseconds
    pub fn delay_us(&mut self, us: u32) {
        self.bus.delay_us(us);
    }

    /// Delay for the specified number of milliseconds
    pub fn delay_ms(&mut self, ms: u32) {
        self.bus.delay_ms(ms);
    }

    /// Keep the bus acquired after this guard goes away
    ///
    /// The caller takes over the duty of calling `end_transaction`.
    pub(crate) fn hold(self) {
        core::mem::forget(self);
    }
}

impl<B: SpiBus + ?Sized> Drop for BusSession<'_, B> {
    fn drop(&mut self) {
        self.bus.end_transaction();
    }
}

/// One asserted chip-select frame
pub struct ChipSelect<'s, B: SpiBus + ?Sized> {
    bus: &'s mut B,
    cs: u8,
}

impl<B: SpiBus + ?Sized> ChipSelect<'_, B> {
    /// Exchange a single byte
    pub fn transfer(&mut self, byte: u8) -> Result<u8> {
        self.bus.transfer(byte)
    }

    /// Clock out `data`, discarding what comes back
    pub fn write(&mut self, data: &[u8]) -> Result<()> {
        for &byte in data {
            self.bus.transfer(byte)?;
        }
        Ok(())
    }

    /// Clock in `buf.len()` bytes
    pub fn read(&mut self, buf: &mut [u8]) -> Result<()> {
        exchange_read(&mut *self.bus, buf)
    }

    /// Keep chip select asserted after this guard goes away
    ///
    /// The caller takes over the duty of calling `deselect`.
    pub(crate) fn hold(self) {
        core::mem::forget(self);
    }
}

impl<B: SpiBus + ?Sized> Drop for ChipSelect<'_, B> {
    fn drop(&mut self) {
        self.bus.deselect(self.cs);
    }
}

/// Clock in `buf.len()` bytes on an already selected chip
pub(crate) fn exchange_read<B: SpiBus + ?Sized>(bus: &mut B, buf: &mut [u8]) -> Result<()> {
    for byte in buf.iter_mut() {
        *byte = bus.transfer(opcodes::DUMMY)?;
    }
    Ok(())
}

/// Clock `count` dummy bytes on an already selected chip
pub(crate) fn exchange_skip<B: SpiBus + ?Sized>(bus: &mut B, count: u32) -> Result<()> {
    for _ in 0..count {
        bus.transfer(opcodes::DUMMY)?;
    }
    Ok(())
}
