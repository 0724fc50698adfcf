//! M95 protocol implementation
//!
//! Every function here runs inside a [`BusSession`] the caller already
//! holds, so a whole logical operation (write enable, program, poll) is
//! a single bus acquisition.
//!
//! ## Page writes
//!
//! A write instruction only ever lands inside one page; bytes past the end
//! of the page wrap around to its start. [`write_paged`] therefore splits a
//! request on page boundaries and runs each piece as
//! WREN → WRITE → poll RDSR, since the chip clears WEL after every write
//! cycle.

use crate::bus::{BusSession, SpiBus};
use crate::error::{Error, Result};
use crate::spi::{opcodes, AddressWidth, SpiCommand, StatusRegister};

/// Status polling budget for write completion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PollPolicy {
    /// Number of status reads before giving up (zero still reads once)
    pub attempts: u32,
    /// Delay between two status reads, in microseconds
    pub interval_us: u32,
}

impl PollPolicy {
    /// 50 polls, 1 ms apart; comfortably above the 5 ms write cycle
    pub const DEFAULT: Self = Self {
        attempts: 50,
        interval_us: 1_000,
    };

    /// Create a policy
    pub const fn new(attempts: u32, interval_us: u32) -> Self {
        Self {
            attempts,
            interval_us,
        }
    }

    /// Upper bound on the time spent polling, in microseconds
    pub const fn budget_us(&self) -> u64 {
        self.attempts as u64 * self.interval_us as u64
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Execute a single command frame
///
/// Asserts chip select, clocks out the opcode, the address (if any) and
/// `write_data`, then clocks in `read_buf`. Chip select is released on
/// every exit path.
pub fn execute<B: SpiBus + ?Sized>(
    session: &mut BusSession<'_, B>,
    cmd: &mut SpiCommand<'_>,
) -> Result<()> {
    log::trace!(
        "m95: frame 0x{:02X}{}, {} byte(s)",
        cmd.opcode,
        if cmd.has_address() { " with address" } else { "" },
        cmd.total_bytes()
    );
    let mut cs = session.select();
    cs.transfer(cmd.opcode)?;
    if let Some(address) = &cmd.address {
        cs.write(address.as_bytes())?;
    }
    cs.write(cmd.write_data)?;
    cs.read(cmd.read_buf)
}

/// Read the status register
pub fn read_status<B: SpiBus + ?Sized>(
    session: &mut BusSession<'_, B>,
) -> Result<StatusRegister> {
    let mut buf = [0u8; 1];
    let mut cmd = SpiCommand::read_reg(opcodes::RDSR, &mut buf);
    execute(session, &mut cmd)?;
    Ok(StatusRegister::from_bits_retain(buf[0]))
}

/// Send the Write Enable command
pub fn write_enable<B: SpiBus + ?Sized>(session: &mut BusSession<'_, B>) -> Result<()> {
    let mut cmd = SpiCommand::simple(opcodes::WREN);
    execute(session, &mut cmd)
}

/// Send the Write Disable command
pub fn write_disable<B: SpiBus + ?Sized>(session: &mut BusSession<'_, B>) -> Result<()> {
    let mut cmd = SpiCommand::simple(opcodes::WRDI);
    execute(session, &mut cmd)
}

/// Wait for the WIP (Write In Progress) bit to clear
///
/// Reads the status register up to `policy.attempts` times, sleeping
/// `policy.interval_us` between reads, and returns as soon as WIP reads
/// back clear. Returns `Error::WriteTimeout` once the budget is spent.
///
/// The status is always read at least once, even with zero attempts.
pub fn wait_ready<B: SpiBus + ?Sized>(
    session: &mut BusSession<'_, B>,
    policy: &PollPolicy,
) -> Result<()> {
    let attempts = policy.attempts.max(1);
    for attempt in 0..attempts {
        let status = read_status(session)?;
        if (status.bits() & opcodes::SR_WIP) == 0 {
            log::trace!("m95: write complete after {} poll(s)", attempt + 1);
            return Ok(());
        }
        if attempt + 1 < attempts {
            session.delay_us(policy.interval_us);
        }
    }

    log::warn!(
        "m95: WIP still set after {} polls ({} us)",
        attempts,
        policy.budget_us()
    );
    Err(Error::WriteTimeout)
}

/// Write the status register
///
/// Automatically sends WREN before writing and waits for the write cycle.
pub fn write_status<B: SpiBus + ?Sized>(
    session: &mut BusSession<'_, B>,
    value: u8,
    policy: &PollPolicy,
) -> Result<()> {
    write_enable(session)?;
    let data = [value];
    let mut cmd = SpiCommand::write_reg(opcodes::WRSR, &data);
    execute(session, &mut cmd)?;
    wait_ready(session, policy)
}

/// Program a single page fragment
///
/// The data must not cross a page boundary.
pub fn program_page<B: SpiBus + ?Sized>(
    session: &mut BusSession<'_, B>,
    opcode: u8,
    width: AddressWidth,
    addr: u32,
    data: &[u8],
    policy: &PollPolicy,
) -> Result<()> {
    write_enable(session)?;

    let mut cmd = SpiCommand::write(opcode, width.encode(addr), data);
    execute(session, &mut cmd)?;

    wait_ready(session, policy)
}

/// Write `data` at `addr`, splitting on page boundaries
///
/// Each fragment is a separate write-enable/program/poll cycle. Returns the
/// number of program cycles issued, which is zero for empty data.
pub fn write_paged<B: SpiBus + ?Sized>(
    session: &mut BusSession<'_, B>,
    opcode: u8,
    width: AddressWidth,
    page_size: u32,
    addr: u32,
    data: &[u8],
    policy: &PollPolicy,
) -> Result<usize> {
    let mut cycles = 0;
    for chunk in page_chunks(addr, data.len(), page_size)? {
        log::trace!(
            "m95: program 0x{:02X} at 0x{:06X}, {} byte(s)",
            opcode,
            chunk.address,
            chunk.len
        );
        let fragment = &data[chunk.offset..chunk.offset + chunk.len];
        program_page(session, opcode, width, chunk.address, fragment, policy)?;
        cycles += 1;
    }
    Ok(cycles)
}

/// One page-bounded piece of a write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageChunk {
    /// Device address of the first byte
    pub address: u32,
    /// Offset of the first byte in the caller's buffer
    pub offset: usize,
    /// Number of bytes, never zero and never past the end of the page
    pub len: usize,
}

/// Iterator over the page-bounded pieces of a write
#[derive(Debug, Clone)]
pub struct PageChunks {
    address: u32,
    offset: usize,
    remaining: usize,
    page_size: u32,
}

/// Split `len` bytes starting at `addr` into page-bounded pieces
///
/// Fails with `Error::InvalidPageSize` if `page_size` is zero.
pub fn page_chunks(addr: u32, len: usize, page_size: u32) -> Result<PageChunks> {
    if page_size == 0 {
        return Err(Error::InvalidPageSize);
    }
    Ok(PageChunks {
        address: addr,
        offset: 0,
        remaining: len,
        page_size,
    })
}

impl Iterator for PageChunks {
    type Item = PageChunk;

    fn next(&mut self) -> Option<PageChunk> {
        if self.remaining == 0 {
            return None;
        }

        // Calculate how many bytes until the next page boundary
        let room = (self.page_size - self.address % self.page_size) as usize;
        let len = core::cmp::min(room, self.remaining);
        let chunk = PageChunk {
            address: self.address,
            offset: self.offset,
            len,
        };

        self.address = self.address.wrapping_add(len as u32);
        self.offset += len;
        self.remaining -= len;
        Some(chunk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::BusSettings;

    fn collect(addr: u32, len: usize, page_size: u32) -> ([PageChunk; 8], usize) {
        let mut out = [PageChunk {
            address: 0,
            offset: 0,
            len: 0,
        }; 8];
        let mut n = 0;
        for chunk in page_chunks(addr, len, page_size).unwrap() {
            out[n] = chunk;
            n += 1;
        }
        (out, n)
    }

    #[test]
    fn test_chunks_unaligned_start() {
        let (chunks, n) = collect(20, 40, 32);
        assert_eq!(n, 2);
        assert_eq!(
            chunks[0],
            PageChunk {
                address: 20,
                offset: 0,
                len: 12
            }
        );
        assert_eq!(
            chunks[1],
            PageChunk {
                address: 32,
                offset: 12,
                len: 28
            }
        );
    }

    #[test]
    fn test_chunks_exact_page() {
        let (chunks, n) = collect(64, 64, 64);
        assert_eq!(n, 1);
        assert_eq!(chunks[0].len, 64);

        let (chunks, n) = collect(64, 65, 64);
        assert_eq!(n, 2);
        assert_eq!(chunks[0].len, 64);
        assert_eq!(chunks[1].address, 128);
        assert_eq!(chunks[1].len, 1);
    }

    #[test]
    fn test_chunks_ending_on_boundary() {
        // No zero-length tail when the write stops exactly at a boundary
        let (chunks, n) = collect(10, 22, 16);
        assert_eq!(n, 2);
        assert_eq!(chunks[0].len, 6);
        assert_eq!(chunks[1].address, 16);
        assert_eq!(chunks[1].len, 16);
    }

    #[test]
    fn test_chunks_cover_input() {
        for page_size in [1u32, 16, 32, 64, 256] {
            for addr in [0u32, 1, 15, 31, 100, 255] {
                for len in [0usize, 1, 31, 32, 33, 200] {
                    let mut next_offset = 0;
                    for chunk in page_chunks(addr, len, page_size).unwrap() {
                        assert!(chunk.len > 0);
                        assert_eq!(chunk.offset, next_offset);
                        assert_eq!(chunk.address, addr + chunk.offset as u32);
                        // Never crosses a page boundary
                        let first_page = chunk.address / page_size;
                        let last_page = (chunk.address + chunk.len as u32 - 1) / page_size;
                        assert_eq!(first_page, last_page);
                        next_offset += chunk.len;
                    }
                    assert_eq!(next_offset, len);
                }
            }
        }
    }

    #[test]
    fn test_chunks_zero_page_size() {
        assert!(matches!(
            page_chunks(0, 10, 0),
            Err(Error::InvalidPageSize)
        ));
    }

    /// Bus that reports WIP for a fixed number of status reads
    struct BusyBus {
        busy_reads: u32,
        idle_status: u8,
        status_reads: u32,
        delays: u32,
        last_opcode: Option<u8>,
        frame_pos: usize,
    }

    impl SpiBus for BusyBus {
        fn begin_transaction(&mut self, _settings: &BusSettings) {}

        fn end_transaction(&mut self) {}

        fn select(&mut self, _cs: u8) {
            self.frame_pos = 0;
        }

        fn deselect(&mut self, _cs: u8) {}

        fn transfer(&mut self, byte: u8) -> Result<u8> {
            let pos = self.frame_pos;
            self.frame_pos += 1;
            if pos == 0 {
                self.last_opcode = Some(byte);
                return Ok(0xFF);
            }
            if self.last_opcode == Some(opcodes::RDSR) {
                self.status_reads += 1;
                if self.status_reads <= self.busy_reads {
                    return Ok(opcodes::SR_WIP);
                }
                return Ok(self.idle_status);
            }
            Ok(0xFF)
        }

        fn delay_us(&mut self, _us: u32) {
            self.delays += 1;
        }
    }

    fn busy_bus(busy_reads: u32) -> BusyBus {
        BusyBus {
            busy_reads,
            idle_status: 0,
            status_reads: 0,
            delays: 0,
            last_opcode: None,
            frame_pos: 0,
        }
    }

    #[test]
    fn test_wait_ready_clears() {
        let mut bus = busy_bus(3);
        let mut session = BusSession::begin(&mut bus, 0, &BusSettings::M95);
        wait_ready(&mut session, &PollPolicy::DEFAULT).unwrap();
        drop(session);
        assert_eq!(bus.status_reads, 4);
        assert_eq!(bus.delays, 3);
    }

    #[test]
    fn test_wait_ready_times_out() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut bus = busy_bus(u32::MAX);
        let mut session = BusSession::begin(&mut bus, 0, &BusSettings::M95);
        let policy = PollPolicy::new(5, 100);
        assert_eq!(wait_ready(&mut session, &policy), Err(Error::WriteTimeout));
        drop(session);
        assert_eq!(bus.status_reads, 5);
        assert_eq!(bus.delays, 4);
    }

    #[test]
    fn test_wait_ready_precedence() {
        // A status of 0xFE has every bit but WIP set and must count as ready
        let mut bus = busy_bus(0);
        bus.idle_status = 0xFE;
        let mut session = BusSession::begin(&mut bus, 0, &BusSettings::M95);
        wait_ready(&mut session, &PollPolicy::new(1, 0)).unwrap();
    }

    #[test]
    fn test_wait_ready_zero_attempts_reads_once() {
        let mut bus = busy_bus(0);
        let mut session = BusSession::begin(&mut bus, 0, &BusSettings::M95);
        wait_ready(&mut session, &PollPolicy::new(0, 100)).unwrap();
        drop(session);
        assert_eq!(bus.status_reads, 1);
        assert_eq!(bus.delays, 0);

        let mut bus = busy_bus(1);
        let mut session = BusSession::begin(&mut bus, 0, &BusSettings::M95);
        assert_eq!(
            wait_ready(&mut session, &PollPolicy::new(0, 100)),
            Err(Error::WriteTimeout)
        );
        drop(session);
        assert_eq!(bus.status_reads, 1);
    }
}
