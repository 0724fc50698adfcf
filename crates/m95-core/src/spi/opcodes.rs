//! M95 SPI EEPROM instruction set
//!
//! The opcodes are fixed by the chip family. Parts without an
//! identification page simply do not answer `RDID_PAGE`/`WRID_PAGE`.

// ============================================================================
// Write control
// ============================================================================

/// Write Enable - sets WEL, required before every write instruction
pub const WREN: u8 = 0x06;
/// Write Disable - clears WEL
pub const WRDI: u8 = 0x04;

// ============================================================================
// Status register operations
// ============================================================================

/// Read Status Register
pub const RDSR: u8 = 0x05;
/// Write Status Register
pub const WRSR: u8 = 0x01;

// ============================================================================
// Memory array
// ============================================================================

/// Read from Memory Array
pub const READ: u8 = 0x03;
/// Write to Memory Array
pub const WRITE: u8 = 0x02;

// ============================================================================
// Identification page
// ============================================================================

/// Read Identification Page (also reads the lock status at `ID_PAGE_LOCK_ADDR`)
pub const RDID_PAGE: u8 = 0x83;
/// Write Identification Page (also locks it at `ID_PAGE_LOCK_ADDR`)
pub const WRID_PAGE: u8 = 0x82;

/// Address bit A10 selects the lock status/lock instruction variant
pub const ID_PAGE_LOCK_ADDR: u32 = 1 << 10;
/// Data byte that locks the identification page
pub const ID_PAGE_LOCK_VALUE: u8 = 0x02;

// ============================================================================
// Status register bit definitions
// ============================================================================

/// Status Register: Write In Progress
pub const SR_WIP: u8 = 0x01;
/// Status Register: Write Enable Latch
pub const SR_WEL: u8 = 0x02;
/// Status Register: Block Protect bit 0
pub const SR_BP0: u8 = 0x04;
/// Status Register: Block Protect bit 1
pub const SR_BP1: u8 = 0x08;
/// Status Register: Status Register Write Disable
pub const SR_SRWD: u8 = 0x80;

/// Byte clocked out while reading
pub const DUMMY: u8 = 0xFF;
