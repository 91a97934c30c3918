//! Memory and I/O bus interface.

/// Memory and I/O bus interface.
///
/// CPUs and video chips access memory through this trait. The bus decodes
/// the address and routes the access to whichever device owns it.
pub trait Bus {
    /// Read a byte from the given address.
    ///
    /// Reads may have side effects (clearing a status flag, advancing a
    /// data port), so this takes `&mut self`.
    fn read(&mut self, address: u16) -> u8;

    /// Write a byte to the given address.
    fn write(&mut self, address: u16, value: u8);

    /// Read a little-endian word from `address` and `address + 1`.
    fn read_word(&mut self, address: u16) -> u16 {
        let lo = self.read(address);
        let hi = self.read(address.wrapping_add(1));
        u16::from_le_bytes([lo, hi])
    }
}
