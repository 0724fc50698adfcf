//! m95-dummy - In-memory M95 EEPROM emulator for testing
//!
//! This crate provides a `SpiBus` implementation that behaves like an M95
//! EEPROM sitting on the other end of the wires. It decodes the byte stream
//! of each chip-select frame, keeps the memory array, the status register
//! and the identification page in memory, and records what went over the
//! bus so tests can assert on the exact command sequence.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "alloc")]
use alloc::vec;
#[cfg(feature = "alloc")]
use alloc::vec::Vec;

use m95_core::bus::{BusSettings, SpiBus};
use m95_core::error::{Error, Result};
use m95_core::spi::{opcodes, StatusRegister};

/// Status bits that WRSR can change
const WRITABLE_STATUS: u8 = opcodes::SR_BP0 | opcodes::SR_BP1 | opcodes::SR_SRWD;

/// How long an internal write cycle keeps WIP set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteCycle {
    /// WIP reads back set for this many status reads, then clears
    Polls(u32),
    /// WIP never clears
    Forever,
}

/// Configuration for the dummy EEPROM
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// Chip select the part answers on
    pub cs: u8,
    /// Array size in bytes
    pub size: usize,
    /// Write page size in bytes
    pub page_size: usize,
    /// Address bytes the part expects after READ/WRITE
    pub address_bytes: u8,
    /// Whether the part has an identification page
    pub id_page: bool,
    /// Duration of the internal write cycle
    pub write_cycle: WriteCycle,
    /// When false the bus floats and every byte reads back 0xFF
    pub present: bool,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            cs: 0,
            size: 32 * 1024, // M95256-D
            page_size: 64,
            address_bytes: 2,
            id_page: true,
            write_cycle: WriteCycle::Polls(2),
            present: true,
        }
    }
}

/// One chip-select frame as seen on the wires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRecord {
    /// First byte of the frame
    pub opcode: u8,
    /// Decoded address, for commands that carry one
    pub address: Option<u32>,
    /// Bytes exchanged after the opcode and address
    pub len: usize,
}

/// Frame being clocked
#[cfg(feature = "alloc")]
#[derive(Debug, Default)]
struct Frame {
    opcode: Option<u8>,
    address: u32,
    address_len: u8,
    data_len: usize,
    payload: Vec<u8>,
    ignored: bool,
}

/// Dummy M95 EEPROM
///
/// Emulates an M95 part in memory for testing purposes.
#[cfg(feature = "alloc")]
pub struct DummyEeprom {
    config: DummyConfig,
    data: Vec<u8>,
    id_data: Vec<u8>,
    id_locked: bool,
    status: u8,
    write_enabled: bool,
    busy: Option<WriteCycle>,
    frame: Option<Frame>,
    frames: Vec<FrameRecord>,
    in_transaction: bool,
    settings: Option<BusSettings>,
    sessions: usize,
    open_sessions: isize,
    transfers: u64,
    fail_after: Option<u64>,
    delay_us: u64,
}

#[cfg(feature = "alloc")]
impl DummyEeprom {
    /// Create a new dummy EEPROM with the given configuration
    pub fn new(config: DummyConfig) -> Self {
        let data = vec![0xFF; config.size];
        let id_data = vec![0xFF; config.page_size];
        Self {
            config,
            data,
            id_data,
            id_locked: false,
            status: 0,
            write_enabled: false,
            busy: None,
            frame: None,
            frames: Vec::new(),
            in_transaction: false,
            settings: None,
            sessions: 0,
            open_sessions: 0,
            transfers: 0,
            fail_after: None,
            delay_us: 0,
        }
    }

    /// Create a new dummy EEPROM with default configuration (M95256-D)
    pub fn new_default() -> Self {
        Self::new(DummyConfig::default())
    }

    /// Create a dummy EEPROM with pre-filled data
    pub fn with_data(config: DummyConfig, initial_data: &[u8]) -> Self {
        let mut eeprom = Self::new(config);
        let len = core::cmp::min(initial_data.len(), eeprom.data.len());
        eeprom.data[..len].copy_from_slice(&initial_data[..len]);
        eeprom
    }

    /// Get a reference to the memory array
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get a mutable reference to the memory array
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Get the identification page contents
    pub fn id_page(&self) -> &[u8] {
        &self.id_data
    }

    /// Whether the identification page has been locked
    pub fn id_page_locked(&self) -> bool {
        self.id_locked
    }

    /// Get the configuration
    pub fn config(&self) -> &DummyConfig {
        &self.config
    }

    /// Current status register, without affecting the write cycle
    pub fn status(&self) -> StatusRegister {
        let mut status = StatusRegister::from_bits_retain(self.status);
        status.set(StatusRegister::WEL, self.write_enabled);
        status.set(StatusRegister::WIP, self.busy.is_some());
        status
    }

    /// Every completed chip-select frame, oldest first
    pub fn frames(&self) -> &[FrameRecord] {
        &self.frames
    }

    /// Completed frames with the given opcode
    pub fn frames_with(&self, opcode: u8) -> impl Iterator<Item = &FrameRecord> {
        self.frames.iter().filter(move |f| f.opcode == opcode)
    }

    /// Forget the recorded frames and counters
    pub fn clear_log(&mut self) {
        self.frames.clear();
        self.sessions = 0;
        self.transfers = 0;
        self.delay_us = 0;
    }

    /// Number of bus sessions begun
    pub fn sessions(&self) -> usize {
        self.sessions
    }

    /// Sessions begun minus sessions ended
    pub fn open_sessions(&self) -> isize {
        self.open_sessions
    }

    /// Whether chip select is currently asserted
    pub fn is_selected(&self) -> bool {
        self.frame.is_some()
    }

    /// Number of bytes exchanged
    pub fn transfers(&self) -> u64 {
        self.transfers
    }

    /// Total time spent in `delay_us`/`delay_ms`
    pub fn delayed_us(&self) -> u64 {
        self.delay_us
    }

    /// Settings passed to the last `begin_transaction`
    pub fn last_settings(&self) -> Option<BusSettings> {
        self.settings
    }

    /// Make every transfer after the next `count` ones fail
    pub fn fail_after(&mut self, count: u64) {
        self.fail_after = Some(self.transfers + count);
    }

    /// Stop failing transfers
    pub fn clear_fault(&mut self) {
        self.fail_after = None;
    }

    fn takes_address(&self, opcode: u8) -> bool {
        match opcode {
            opcodes::READ | opcodes::WRITE => true,
            opcodes::RDID_PAGE | opcodes::WRID_PAGE => self.config.id_page,
            _ => false,
        }
    }

    fn read_status_byte(&mut self) -> u8 {
        let status = self.status().bits();
        self.busy = match self.busy {
            Some(WriteCycle::Polls(n)) if n > 1 => Some(WriteCycle::Polls(n - 1)),
            Some(WriteCycle::Polls(_)) => None,
            other => other,
        };
        status
    }

    fn start_write_cycle(&mut self) {
        self.write_enabled = false;
        self.busy = match self.config.write_cycle {
            WriteCycle::Polls(0) => None,
            cycle => Some(cycle),
        };
    }

    fn clock(&mut self, frame: &mut Frame, byte: u8) -> u8 {
        let Some(opcode) = frame.opcode else {
            frame.opcode = Some(byte);
            // A part busy writing only answers RDSR
            frame.ignored = self.busy.is_some() && byte != opcodes::RDSR;
            return 0xFF;
        };

        if self.takes_address(opcode) && frame.address_len < self.config.address_bytes {
            frame.address = (frame.address << 8) | byte as u32;
            frame.address_len += 1;
            return 0xFF;
        }

        let index = frame.data_len;
        frame.data_len += 1;
        if frame.ignored {
            return 0xFF;
        }

        match opcode {
            opcodes::RDSR => self.read_status_byte(),
            opcodes::READ => {
                let addr = (frame.address as usize + index) % self.data.len();
                self.data[addr]
            }
            opcodes::RDID_PAGE if self.config.id_page => {
                if frame.address & opcodes::ID_PAGE_LOCK_ADDR != 0 {
                    self.id_locked as u8
                } else {
                    let addr = (frame.address as usize + index) % self.id_data.len();
                    self.id_data[addr]
                }
            }
            opcodes::WRITE | opcodes::WRSR | opcodes::WRID_PAGE => {
                frame.payload.push(byte);
                0xFF
            }
            _ => 0xFF,
        }
    }

    fn finish(&mut self, frame: Frame) {
        let Some(opcode) = frame.opcode else {
            return;
        };
        let has_address =
            self.takes_address(opcode) && frame.address_len == self.config.address_bytes;
        self.frames.push(FrameRecord {
            opcode,
            address: has_address.then_some(frame.address),
            len: frame.data_len,
        });

        if frame.ignored {
            log::debug!("dummy: ignoring 0x{:02X} during write cycle", opcode);
            return;
        }

        match opcode {
            opcodes::WREN => self.write_enabled = true,
            opcodes::WRDI => self.write_enabled = false,
            opcodes::RDSR | opcodes::READ | opcodes::RDID_PAGE => {}
            opcodes::WRSR => {
                if self.write_enabled && !frame.payload.is_empty() {
                    self.status = frame.payload[0] & WRITABLE_STATUS;
                    self.start_write_cycle();
                }
            }
            opcodes::WRITE => {
                if self.write_enabled && has_address && !frame.payload.is_empty() {
                    self.program_array(frame.address, &frame.payload);
                }
            }
            opcodes::WRID_PAGE if self.config.id_page => {
                if self.write_enabled && has_address && !frame.payload.is_empty() {
                    self.program_id_page(frame.address, &frame.payload);
                }
            }
            _ => log::warn!("dummy: unsupported opcode 0x{:02X}", opcode),
        }
    }

    fn program_array(&mut self, addr: u32, payload: &[u8]) {
        let size = self.data.len();
        let page_size = self.config.page_size;
        let addr = addr as usize % size;

        let protection = StatusRegister::from_bits_retain(self.status).block_protection();
        if let Some(start) = protection.protected_from(size as u32) {
            if addr >= start as usize {
                log::debug!("dummy: write to protected address 0x{:06X} ignored", addr);
                self.write_enabled = false;
                return;
            }
        }

        // Bytes past the end of the page wrap around to its start
        let base = addr - addr % page_size;
        let offset = addr % page_size;
        for (i, &byte) in payload.iter().enumerate() {
            self.data[base + (offset + i) % page_size] = byte;
        }
        self.start_write_cycle();
    }

    fn program_id_page(&mut self, addr: u32, payload: &[u8]) {
        if addr & opcodes::ID_PAGE_LOCK_ADDR != 0 {
            if payload[0] & opcodes::ID_PAGE_LOCK_VALUE != 0 {
                log::debug!("dummy: identification page locked");
                self.id_locked = true;
            }
            self.start_write_cycle();
            return;
        }

        if self.id_locked {
            log::debug!("dummy: write to locked identification page ignored");
            self.write_enabled = false;
            return;
        }

        let page_size = self.id_data.len();
        let offset = addr as usize % page_size;
        for (i, &byte) in payload.iter().enumerate() {
            self.id_data[(offset + i) % page_size] = byte;
        }
        self.start_write_cycle();
    }
}

#[cfg(feature = "alloc")]
impl SpiBus for DummyEeprom {
    fn begin_transaction(&mut self, settings: &BusSettings) {
        if self.in_transaction {
            log::warn!("dummy: begin_transaction while a session is open");
        }
        self.in_transaction = true;
        self.settings = Some(*settings);
        self.sessions += 1;
        self.open_sessions += 1;
    }

    fn end_transaction(&mut self) {
        if self.frame.is_some() {
            log::warn!("dummy: session ended with chip select asserted");
        }
        self.in_transaction = false;
        self.open_sessions -= 1;
    }

    fn select(&mut self, cs: u8) {
        if cs != self.config.cs {
            return;
        }
        self.frame = Some(Frame::default());
    }

    fn deselect(&mut self, cs: u8) {
        if cs != self.config.cs {
            return;
        }
        if let Some(frame) = self.frame.take() {
            if self.config.present {
                self.finish(frame);
            }
        }
    }

    fn transfer(&mut self, byte: u8) -> Result<u8> {
        self.transfers += 1;
        if matches!(self.fail_after, Some(limit) if self.transfers > limit) {
            return Err(Error::SpiTransferFailed);
        }

        let Some(mut frame) = self.frame.take() else {
            log::warn!("dummy: transfer without chip select");
            return Ok(0xFF);
        };
        let out = if self.config.present {
            self.clock(&mut frame, byte)
        } else {
            0xFF
        };
        self.frame = Some(frame);
        Ok(out)
    }

    fn delay_us(&mut self, us: u32) {
        // No delay needed for in-memory operations
        self.delay_us += us as u64;
    }
}
