//! 2 KiB internal work RAM.

use emu_core::Device;

/// Size of the console's work RAM.
pub const RAM_SIZE: usize = 0x800;

/// Work RAM, mirrored four times across $0000-$1FFF.
pub struct Ram {
    bytes: [u8; RAM_SIZE],
}

impl Default for Ram {
    fn default() -> Self {
        Self::new()
    }
}

impl Ram {
    #[must_use]
    pub fn new() -> Self {
        Self {
            bytes: [0; RAM_SIZE],
        }
    }

    /// Read without going through the bus.
    #[must_use]
    pub fn peek(&self, address: u16) -> u8 {
        self.bytes[usize::from(address) & (RAM_SIZE - 1)]
    }

    pub fn poke(&mut self, address: u16, value: u8) {
        self.bytes[usize::from(address) & (RAM_SIZE - 1)] = value;
    }
}

impl Device for Ram {
    fn read(&mut self, address: u16) -> Option<u8> {
        Some(self.peek(address))
    }

    fn write(&mut self, address: u16, value: u8) {
        self.poke(address, value);
    }
}
