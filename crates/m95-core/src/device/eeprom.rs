//! M95 EEPROM device

use super::config::DeviceConfig;
use super::continuous::ContinuousRead;
use crate::bus::{BusSession, SpiBus};
use crate::error::{Error, Result};
use crate::protocol::m95 as protocol;
use crate::spi::{opcodes, BlockProtection, SpiCommand, StatusRegister};

/// Delay between WREN and the status read in `exists()`
const PROBE_SETTLE_US: u32 = 10;

/// An M95 EEPROM on a SPI bus
///
/// Every operation acquires the bus for its own duration and releases it
/// before returning, whatever the outcome. The exception is the
/// continuous-read mode, which keeps the bus and the chip selected across
/// calls until [`end_continuous_read`](Self::end_continuous_read); while it
/// is open every other operation fails with
/// [`Error::ContinuousReadActive`].
///
/// # Example
///
/// ```ignore
/// use m95_core::{DeviceConfig, M95Eeprom};
///
/// fn store_serial<B: m95_core::bus::SpiBus>(bus: B, serial: &[u8]) -> m95_core::Result<()> {
///     let config = DeviceConfig::new(0, 64).with_id_page(true);
///     let mut eeprom = M95Eeprom::new(bus, config);
///     eeprom.begin();
///
///     eeprom.write_id_page(serial)?;
///     eeprom.lock_id_page()
/// }
/// ```
pub struct M95Eeprom<B: SpiBus> {
    pub(super) bus: B,
    pub(super) config: DeviceConfig,
    pub(super) continuous: ContinuousRead,
}

impl<B: SpiBus> M95Eeprom<B> {
    /// Create a new device on `bus`
    pub fn new(bus: B, config: DeviceConfig) -> Self {
        Self {
            bus,
            config,
            continuous: ContinuousRead::default(),
        }
    }

    /// Claim the chip-select line and park it deasserted
    pub fn begin(&mut self) {
        self.bus.claim_cs(self.config.cs);
        self.bus.deselect(self.config.cs);
    }

    /// Deassert and release the chip-select line
    ///
    /// Closes a continuous read left open.
    pub fn end(&mut self) {
        self.close_continuous();
        self.bus.deselect(self.config.cs);
        self.bus.release_cs(self.config.cs);
    }

    /// Get the configuration
    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Write page size in bytes
    pub fn page_size(&self) -> u32 {
        self.config.page_size
    }

    /// Get a reference to the underlying bus
    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Get a mutable reference to the underlying bus
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    pub(super) fn ensure_idle(&self) -> Result<()> {
        if self.continuous.is_open() {
            return Err(Error::ContinuousReadActive);
        }
        Ok(())
    }

    fn session(&mut self) -> BusSession<'_, B> {
        BusSession::begin(&mut self.bus, self.config.cs, &self.config.bus_settings())
    }

    fn require_id_page(&self) -> Result<()> {
        if !self.config.id_page {
            return Err(Error::NoIdPage);
        }
        Ok(())
    }

    // The lock lives at 0x400; a narrower address would alias ID-page data
    fn check_lock_address(&self) -> Result<()> {
        let width = self.config.address_width()?;
        if width.max_address() < opcodes::ID_PAGE_LOCK_ADDR {
            return Err(Error::InvalidAddressWidth(width.bytes()));
        }
        Ok(())
    }

    fn check_id_page_range(&self, offset: u32, len: usize) -> Result<()> {
        if offset as u64 + len as u64 > self.config.page_size as u64 {
            return Err(Error::AddressOutOfBounds);
        }
        Ok(())
    }

    // =========================================================================
    // Memory array
    // =========================================================================

    /// Read `buf.len()` bytes starting at `addr`
    ///
    /// Reads are not page limited; the whole buffer is one READ frame.
    pub fn read(&mut self, addr: u32, buf: &mut [u8]) -> Result<()> {
        self.config.check_range(addr, buf.len())?;
        self.read_array(opcodes::READ, addr, buf)
    }

    /// Write `data` starting at `addr`
    ///
    /// The write is split on page boundaries; each piece is enabled,
    /// programmed and polled to completion before the next one starts.
    pub fn write(&mut self, addr: u32, data: &[u8]) -> Result<()> {
        self.config.check_range(addr, data.len())?;
        self.write_array(opcodes::WRITE, addr, data).map(|_| ())
    }

    fn read_array(&mut self, opcode: u8, addr: u32, buf: &mut [u8]) -> Result<()> {
        self.ensure_idle()?;
        let width = self.config.address_width()?;
        if buf.is_empty() {
            return Ok(());
        }

        log::debug!(
            "m95: read 0x{:02X} at 0x{:06X}, {} byte(s)",
            opcode,
            addr,
            buf.len()
        );
        let mut session = self.session();
        let mut cmd = SpiCommand::read(opcode, width.encode(addr), buf);
        protocol::execute(&mut session, &mut cmd)
    }

    fn write_array(&mut self, opcode: u8, addr: u32, data: &[u8]) -> Result<usize> {
        self.ensure_idle()?;
        let width = self.config.address_width()?;
        if self.config.page_size == 0 {
            return Err(Error::InvalidPageSize);
        }
        if data.is_empty() {
            return Ok(0);
        }

        log::debug!(
            "m95: write 0x{:02X} at 0x{:06X}, {} byte(s)",
            opcode,
            addr,
            data.len()
        );
        let page_size = self.config.page_size;
        let poll = self.config.poll;
        let mut session = self.session();
        protocol::write_paged(&mut session, opcode, width, page_size, addr, data, &poll)
    }

    // =========================================================================
    // Probing and status
    // =========================================================================

    /// Check whether a part answers on this chip select
    ///
    /// Sets the write enable latch and reads it back. A floating bus reads
    /// 0xFF and counts as absent. When the part is present the latch is
    /// cleared again before returning, so repeated probes leave it off.
    pub fn exists(&mut self) -> Result<bool> {
        self.ensure_idle()?;
        let mut session = self.session();

        protocol::write_enable(&mut session)?;
        session.delay_us(PROBE_SETTLE_US);
        let status = protocol::read_status(&mut session)?;

        if status.bits() != 0xFF && status.write_enabled() {
            protocol::write_disable(&mut session)?;
            log::debug!("m95: part present, status 0x{:02X}", status.bits());
            return Ok(true);
        }

        log::warn!("m95: no part answered (status 0x{:02X})", status.bits());
        Ok(false)
    }

    /// Read the status register
    pub fn status_register(&mut self) -> Result<StatusRegister> {
        self.ensure_idle()?;
        let mut session = self.session();
        protocol::read_status(&mut session)
    }

    /// Wait until no write cycle is in progress
    pub fn wait_ready(&mut self) -> Result<()> {
        self.ensure_idle()?;
        let poll = self.config.poll;
        let mut session = self.session();
        protocol::wait_ready(&mut session, &poll)
    }

    /// Write the status register and wait for the write cycle
    ///
    /// Only BP1, BP0 and SRWD are writable on M95 parts.
    pub fn write_status_register(&mut self, value: u8) -> Result<()> {
        self.ensure_idle()?;
        log::debug!("m95: write status 0x{:02X}", value);
        let poll = self.config.poll;
        let mut session = self.session();
        protocol::write_status(&mut session, value, &poll)
    }

    /// Current block protection
    pub fn block_protection(&mut self) -> Result<BlockProtection> {
        Ok(self.status_register()?.block_protection())
    }

    /// Change the block protection, keeping SRWD as it is
    pub fn set_block_protection(&mut self, protection: BlockProtection) -> Result<()> {
        let status = self.status_register()?;
        let value = (status & StatusRegister::SRWD).bits() | protection.status_bits();
        self.write_status_register(value)
    }

    // =========================================================================
    // Identification page
    // =========================================================================

    /// Read the start of the identification page
    pub fn read_id_page(&mut self, buf: &mut [u8]) -> Result<()> {
        self.read_id_page_at(0, buf)
    }

    /// Write the start of the identification page
    pub fn write_id_page(&mut self, data: &[u8]) -> Result<()> {
        self.write_id_page_at(0, data)
    }

    /// Read from the identification page starting at `offset`
    pub fn read_id_page_at(&mut self, offset: u32, buf: &mut [u8]) -> Result<()> {
        self.require_id_page()?;
        self.check_id_page_range(offset, buf.len())?;
        self.read_array(opcodes::RDID_PAGE, offset, buf)
    }

    /// Write to the identification page starting at `offset`
    ///
    /// A locked page ignores the write; the call still succeeds because
    /// the part reports nothing back.
    pub fn write_id_page_at(&mut self, offset: u32, data: &[u8]) -> Result<()> {
        self.require_id_page()?;
        self.check_id_page_range(offset, data.len())?;
        self.write_array(opcodes::WRID_PAGE, offset, data).map(|_| ())
    }

    /// Permanently lock the identification page
    ///
    /// This cannot be undone. Fails with [`Error::InvalidAddressWidth`]
    /// when the configured width cannot carry the lock address.
    pub fn lock_id_page(&mut self) -> Result<()> {
        self.require_id_page()?;
        self.check_lock_address()?;
        log::debug!("m95: locking identification page");
        self.write_array(
            opcodes::WRID_PAGE,
            opcodes::ID_PAGE_LOCK_ADDR,
            &[opcodes::ID_PAGE_LOCK_VALUE],
        )
        .map(|_| ())
    }

    /// Check whether the identification page is locked
    pub fn id_page_locked(&mut self) -> Result<bool> {
        self.require_id_page()?;
        self.check_lock_address()?;
        let mut buf = [0u8; 1];
        self.read_array(opcodes::RDID_PAGE, opcodes::ID_PAGE_LOCK_ADDR, &mut buf)?;
        Ok(buf[0] != 0)
    }
}

impl<B: SpiBus> Drop for M95Eeprom<B> {
    fn drop(&mut self) {
        self.close_continuous();
    }
}
