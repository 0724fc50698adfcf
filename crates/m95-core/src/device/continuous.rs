//! Continuous read mode
//!
//! A READ instruction keeps streaming successive bytes for as long as chip
//! select stays asserted. Continuous mode exploits that: it sends the
//! instruction once and then hands out data in as many pieces as the
//! caller likes, holding the bus the whole time.

use super::eeprom::M95Eeprom;
use crate::bus::{self, BusSession, SpiBus};
use crate::error::{Error, Result};
use crate::spi::opcodes;

/// Cursor of an open continuous read
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(super) struct ContinuousRead {
    cursor: u32,
    open: bool,
}

impl ContinuousRead {
    fn opened_at(address: u32) -> Self {
        Self {
            cursor: address,
            open: true,
        }
    }

    pub(super) fn is_open(&self) -> bool {
        self.open
    }

    fn location(&self) -> Result<u32> {
        if !self.open {
            return Err(Error::NotInContinuousRead);
        }
        Ok(self.cursor)
    }

    fn advance(&mut self, count: u32) {
        self.cursor = self.cursor.wrapping_add(count);
    }
}

impl<B: SpiBus> M95Eeprom<B> {
    /// Start a continuous read at `addr`
    ///
    /// The bus stays acquired and the chip selected until
    /// [`end_continuous_read`](Self::end_continuous_read).
    pub fn start_continuous_read(&mut self, addr: u32) -> Result<()> {
        self.ensure_idle()?;
        // Validate before touching the bus so a bad width leaves nothing open
        let width = self.config.address_width()?;
        self.config.check_range(addr, 0)?;

        log::debug!("m95: continuous read from 0x{:06X}", addr);
        let mut session =
            BusSession::begin(&mut self.bus, self.config.cs, &self.config.bus_settings());
        let mut cs = session.select();
        cs.transfer(opcodes::READ)?;
        cs.write(width.encode(addr).as_bytes())?;
        cs.hold();
        session.hold();

        self.continuous = ContinuousRead::opened_at(addr);
        Ok(())
    }

    /// Read the next `buf.len()` bytes of the continuous read
    ///
    /// A transfer error ends the continuous read, since the part may have
    /// clocked out part of the buffer.
    pub fn read_continuous(&mut self, buf: &mut [u8]) -> Result<()> {
        let cursor = self.continuous.location()?;
        self.config.check_range(cursor, buf.len())?;
        if let Err(e) = bus::exchange_read(&mut self.bus, buf) {
            self.abort_continuous(e);
            return Err(e);
        }
        self.continuous.advance(buf.len() as u32);
        Ok(())
    }

    /// Skip the next `count` bytes of the continuous read
    pub fn skip_continuous(&mut self, count: u32) -> Result<()> {
        let cursor = self.continuous.location()?;
        self.config.check_range(cursor, count as usize)?;
        if let Err(e) = bus::exchange_skip(&mut self.bus, count) {
            self.abort_continuous(e);
            return Err(e);
        }
        self.continuous.advance(count);
        Ok(())
    }

    /// Address of the next byte the continuous read will return
    pub fn current_location(&self) -> Result<u32> {
        self.continuous.location()
    }

    /// End the continuous read and release the bus
    pub fn end_continuous_read(&mut self) -> Result<()> {
        self.continuous.location()?;
        self.close_continuous();
        Ok(())
    }

    /// Start a continuous read that ends when the returned reader drops
    pub fn continuous_reader(&mut self, addr: u32) -> Result<ContinuousReader<'_, B>> {
        self.start_continuous_read(addr)?;
        Ok(ContinuousReader { device: self })
    }

    fn abort_continuous(&mut self, error: Error) {
        log::warn!(
            "m95: continuous read at 0x{:06X} aborted: {}",
            self.continuous.cursor,
            error
        );
        self.close_continuous();
    }

    pub(super) fn close_continuous(&mut self) {
        if self.continuous.is_open() {
            log::debug!(
                "m95: continuous read ended at 0x{:06X}",
                self.continuous.cursor
            );
            self.bus.deselect(self.config.cs);
            self.bus.end_transaction();
            self.continuous = ContinuousRead::default();
        }
    }
}

/// Scoped continuous read
///
/// Created by [`M95Eeprom::continuous_reader`]. Dropping it deselects the
/// chip and releases the bus.
pub struct ContinuousReader<'d, B: SpiBus> {
    device: &'d mut M95Eeprom<B>,
}

impl<B: SpiBus> ContinuousReader<'_, B> {
    /// Read the next `buf.len()` bytes
    pub fn read(&mut self, buf: &mut [u8]) -> Result<()> {
        self.device.read_continuous(buf)
    }

    /// Skip the next `count` bytes
    pub fn skip(&mut self, count: u32) -> Result<()> {
        self.device.skip_continuous(count)
    }

    /// Address of the next byte
    pub fn location(&self) -> u32 {
        self.device.continuous.cursor
    }
}

impl<B: SpiBus> Drop for ContinuousReader<'_, B> {
    fn drop(&mut self) {
        self.device.close_continuous();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closed_cursor_is_misuse() {
        let state = ContinuousRead::default();
        assert_eq!(state.location(), Err(Error::NotInContinuousRead));
    }

    #[test]
    fn test_cursor_advances() {
        let mut state = ContinuousRead::opened_at(0x100);
        state.advance(16);
        state.advance(4);
        assert_eq!(state.location(), Ok(0x114));
    }
}
