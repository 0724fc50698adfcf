//! SPI command structure

use super::EncodedAddress;

/// A single chip-select frame: opcode, optional address, then data
///
/// Designed to avoid allocation - uses slices for data.
/// The lifetime parameter `'a` ties the command to the buffers it references.
pub struct SpiCommand<'a> {
    /// The opcode byte
    pub opcode: u8,

    /// Address, already encoded at the part's width
    pub address: Option<EncodedAddress>,

    /// Data to write after opcode/address
    pub write_data: &'a [u8],

    /// Buffer to read into after opcode/address/write data
    pub read_buf: &'a mut [u8],
}

impl<'a> SpiCommand<'a> {
    /// Create a simple command with no address or data (e.g., WREN, WRDI)
    pub fn simple(opcode: u8) -> Self {
        Self {
            opcode,
            address: None,
            write_data: &[],
            read_buf: &mut [],
        }
    }

    /// Create a read register command with no address (e.g., RDSR)
    pub fn read_reg(opcode: u8, buf: &'a mut [u8]) -> Self {
        Self {
            opcode,
            address: None,
            write_data: &[],
            read_buf: buf,
        }
    }

    /// Create a write register command with no address (e.g., WRSR)
    pub fn write_reg(opcode: u8, data: &'a [u8]) -> Self {
        Self {
            opcode,
            address: None,
            write_data: data,
            read_buf: &mut [],
        }
    }

    /// Create an addressed read command (e.g., READ, RDID_PAGE)
    pub fn read(opcode: u8, address: EncodedAddress, buf: &'a mut [u8]) -> Self {
        Self {
            opcode,
            address: Some(address),
            write_data: &[],
            read_buf: buf,
        }
    }

    /// Create an addressed write command (e.g., WRITE, WRID_PAGE)
    pub fn write(opcode: u8, address: EncodedAddress, data: &'a [u8]) -> Self {
        Self {
            opcode,
            address: Some(address),
            write_data: data,
            read_buf: &mut [],
        }
    }

    /// Returns true if this command has an address phase
    pub fn has_address(&self) -> bool {
        self.address.is_some()
    }

    /// Calculate the total number of bytes exchanged in the frame
    pub fn total_bytes(&self) -> usize {
        let mut total = 1; // opcode
        total += self.address.as_ref().map_or(0, |a| a.as_bytes().len());
        total += self.write_data.len();
        total += self.read_buf.len();
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spi::{opcodes, AddressWidth};

    #[test]
    fn test_total_bytes() {
        assert_eq!(SpiCommand::simple(opcodes::WREN).total_bytes(), 1);

        let mut status = [0u8; 1];
        assert_eq!(SpiCommand::read_reg(opcodes::RDSR, &mut status).total_bytes(), 2);

        let address = AddressWidth::ThreeByte.encode(0x100);
        let data = [0u8; 16];
        let cmd = SpiCommand::write(opcodes::WRITE, address, &data);
        assert!(cmd.has_address());
        assert_eq!(cmd.total_bytes(), 1 + 3 + 16);
    }
}
