//! Status register layout

use super::opcodes;
use bitflags::bitflags;

bitflags! {
    /// Snapshot of the M95 status register
    ///
    /// Bits 4..=6 read as zero on most parts and are kept as-is.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StatusRegister: u8 {
        /// A write cycle is still committing to the array
        const WIP  = opcodes::SR_WIP;
        /// Write enable latch is set
        const WEL  = opcodes::SR_WEL;
        /// Block protect bit 0
        const BP0  = opcodes::SR_BP0;
        /// Block protect bit 1
        const BP1  = opcodes::SR_BP1;
        /// Status register write disable (honoured with /W low)
        const SRWD = opcodes::SR_SRWD;

        const _ = !0;
    }
}

impl StatusRegister {
    /// Returns true while a write is being committed
    pub fn write_in_progress(&self) -> bool {
        self.contains(Self::WIP)
    }

    /// Returns true if the write enable latch is set
    pub fn write_enabled(&self) -> bool {
        self.contains(Self::WEL)
    }

    /// Decode the block protect bits
    pub fn block_protection(&self) -> BlockProtection {
        BlockProtection::from_bits((self.bits() & (opcodes::SR_BP1 | opcodes::SR_BP0)) >> 2)
    }
}

/// Array region protected against writes by BP1:BP0
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlockProtection {
    /// Nothing protected
    #[default]
    None,
    /// Upper quarter of the array
    UpperQuarter,
    /// Upper half of the array
    UpperHalf,
    /// Whole array
    All,
}

impl BlockProtection {
    const fn from_bits(bp: u8) -> Self {
        match bp & 0b11 {
            0b00 => Self::None,
            0b01 => Self::UpperQuarter,
            0b10 => Self::UpperHalf,
            _ => Self::All,
        }
    }

    /// BP1:BP0 positioned as in the status register
    pub const fn status_bits(&self) -> u8 {
        let bp = match self {
            Self::None => 0b00,
            Self::UpperQuarter => 0b01,
            Self::UpperHalf => 0b10,
            Self::All => 0b11,
        };
        bp << 2
    }

    /// Start of the protected region for an array of `size` bytes
    ///
    /// Returns `None` when nothing is protected.
    pub const fn protected_from(&self, size: u32) -> Option<u32> {
        match self {
            Self::None => None,
            Self::UpperQuarter => Some(size - size / 4),
            Self::UpperHalf => Some(size / 2),
            Self::All => Some(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_bits() {
        let status = StatusRegister::from_bits_retain(0x03);
        assert!(status.write_in_progress());
        assert!(status.write_enabled());

        let status = StatusRegister::from_bits_retain(0x02);
        assert!(!status.write_in_progress());
        assert!(status.write_enabled());
    }

    #[test]
    fn test_block_protection_bits() {
        for bp in [
            BlockProtection::None,
            BlockProtection::UpperQuarter,
            BlockProtection::UpperHalf,
            BlockProtection::All,
        ] {
            let status = StatusRegister::from_bits_retain(bp.status_bits() | opcodes::SR_SRWD);
            assert_eq!(status.block_protection(), bp);
        }
    }

    #[test]
    fn test_protected_from() {
        assert_eq!(BlockProtection::None.protected_from(32768), None);
        assert_eq!(BlockProtection::UpperQuarter.protected_from(32768), Some(24576));
        assert_eq!(BlockProtection::UpperHalf.protected_from(32768), Some(16384));
        assert_eq!(BlockProtection::All.protected_from(32768), Some(0));
    }
}
