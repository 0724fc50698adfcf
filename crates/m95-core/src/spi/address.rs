//! Address width types

use crate::error::{Error, Result};

/// Number of address bytes sent after an opcode
///
/// M95 parts use one byte (up to 256 bytes of array), two bytes (up to
/// 64 KiB) or three bytes (up to 16 MiB). The width is a property of the
/// part and has to match it exactly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AddressWidth {
    /// 1-byte (8-bit) address
    OneByte,
    /// 2-byte (16-bit) address
    TwoByte,
    /// 3-byte (24-bit) address
    ThreeByte,
}

impl AddressWidth {
    /// Map a configured byte count onto a width
    ///
    /// Anything other than 1, 2 or 3 is rejected with
    /// [`Error::InvalidAddressWidth`].
    pub const fn from_bytes(bytes: u8) -> Result<Self> {
        match bytes {
            1 => Ok(Self::OneByte),
            2 => Ok(Self::TwoByte),
            3 => Ok(Self::ThreeByte),
            other => Err(Error::InvalidAddressWidth(other)),
        }
    }

    /// Returns the number of address bytes
    pub const fn bytes(&self) -> u8 {
        match self {
            Self::OneByte => 1,
            Self::TwoByte => 2,
            Self::ThreeByte => 3,
        }
    }

    /// Returns the highest address that survives encoding
    pub const fn max_address(&self) -> u32 {
        match self {
            Self::OneByte => 0xFF,
            Self::TwoByte => 0xFFFF,
            Self::ThreeByte => 0xFF_FFFF,
        }
    }

    /// Encode the low bits of `address` big-endian
    ///
    /// Bits above the width are dropped, the same way the chip ignores
    /// them.
    pub fn encode(&self, address: u32) -> EncodedAddress {
        let be = address.to_be_bytes();
        let len = self.bytes() as usize;
        let mut buf = [0u8; 3];
        buf[..len].copy_from_slice(&be[4 - len..]);
        EncodedAddress {
            buf,
            len: len as u8,
        }
    }

    /// Rebuild an address from big-endian bytes
    ///
    /// Only the first `self.bytes()` bytes of `bytes` are used.
    pub fn decode(&self, bytes: &[u8]) -> u32 {
        bytes
            .iter()
            .take(self.bytes() as usize)
            .fold(0u32, |acc, &b| (acc << 8) | b as u32)
    }
}

impl TryFrom<u8> for AddressWidth {
    type Error = Error;

    fn try_from(bytes: u8) -> Result<Self> {
        Self::from_bytes(bytes)
    }
}

/// An address ready to be clocked out after an opcode
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncodedAddress {
    buf: [u8; 3],
    len: u8,
}

impl EncodedAddress {
    /// The address bytes, most significant first
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_bytes() {
        assert_eq!(AddressWidth::from_bytes(1), Ok(AddressWidth::OneByte));
        assert_eq!(AddressWidth::from_bytes(2), Ok(AddressWidth::TwoByte));
        assert_eq!(AddressWidth::from_bytes(3), Ok(AddressWidth::ThreeByte));
        assert_eq!(
            AddressWidth::from_bytes(0),
            Err(Error::InvalidAddressWidth(0))
        );
        assert_eq!(
            AddressWidth::from_bytes(4),
            Err(Error::InvalidAddressWidth(4))
        );
    }

    #[test]
    fn test_encode_big_endian() {
        assert_eq!(AddressWidth::OneByte.encode(0x7A).as_bytes(), &[0x7A]);
        assert_eq!(
            AddressWidth::TwoByte.encode(0x1234).as_bytes(),
            &[0x12, 0x34]
        );
        assert_eq!(
            AddressWidth::ThreeByte.encode(0x01_8000).as_bytes(),
            &[0x01, 0x80, 0x00]
        );
    }

    #[test]
    fn test_encode_truncates_high_bits() {
        assert_eq!(AddressWidth::OneByte.encode(0x1234).as_bytes(), &[0x34]);
        assert_eq!(
            AddressWidth::TwoByte.encode(0xAB_CDEF).as_bytes(),
            &[0xCD, 0xEF]
        );
    }

    #[test]
    fn test_encode_decode_recovers_address() {
        let widths = [
            AddressWidth::OneByte,
            AddressWidth::TwoByte,
            AddressWidth::ThreeByte,
        ];
        for width in widths {
            let max = width.max_address();
            for address in [0, 1, 0x55, max / 3, max - 1, max] {
                let encoded = width.encode(address);
                assert_eq!(encoded.as_bytes().len(), width.bytes() as usize);
                assert_eq!(width.decode(encoded.as_bytes()), address);
            }
        }
    }
}
