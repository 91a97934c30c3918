//! iNES file header.
//!
//! ```text
//! 0-3   "NES" $1A
//! 4     PRG ROM size in 16 KiB units
//! 5     CHR ROM size in 8 KiB units (0 = board has 8 KiB CHR RAM)
//! 6     flags 6: mirroring (bit 0), battery (bit 1), trainer (bit 2),
//!       four-screen (bit 3), mapper low nibble (bits 4-7)
//! 7     flags 7: mapper high nibble (bits 4-7)
//! 8-15  ignored
//! ```

use ricoh_ppu_2c02::Mirroring;

use crate::CartridgeError;

/// Length of the fixed header.
pub const HEADER_SIZE: usize = 16;
/// Length of the optional trainer between header and PRG ROM.
pub const TRAINER_SIZE: usize = 512;
/// PRG ROM bank size.
pub const PRG_BANK_SIZE: usize = 16 * 1024;
/// CHR ROM bank size.
pub const CHR_BANK_SIZE: usize = 8 * 1024;

const MAGIC: &[u8; 4] = b"NES\x1a";

/// Parsed iNES header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub prg_banks: u8,
    pub chr_banks: u8,
    pub mapper: u8,
    pub mirroring: Mirroring,
    pub has_battery: bool,
    pub has_trainer: bool,
}

impl Header {
    /// Parse the first 16 bytes of an iNES image.
    pub fn parse(data: &[u8]) -> Result<Self, CartridgeError> {
        if data.len() < HEADER_SIZE {
            return Err(CartridgeError::TooShort { len: data.len() });
        }
        if &data[0..4] != MAGIC {
            return Err(CartridgeError::BadMagic);
        }

        let flags6 = data[6];
        let flags7 = data[7];

        Ok(Self {
            prg_banks: data[4],
            chr_banks: data[5],
            mapper: (flags7 & 0xF0) | (flags6 >> 4),
            mirroring: if flags6 & 0x01 != 0 {
                Mirroring::Vertical
            } else {
                Mirroring::Horizontal
            },
            has_battery: flags6 & 0x02 != 0,
            has_trainer: flags6 & 0x04 != 0,
        })
    }

    #[must_use]
    pub fn prg_size(&self) -> usize {
        usize::from(self.prg_banks) * PRG_BANK_SIZE
    }

    #[must_use]
    pub fn chr_size(&self) -> usize {
        usize::from(self.chr_banks) * CHR_BANK_SIZE
    }

    /// Offset of PRG ROM within the file.
    #[must_use]
    pub fn prg_offset(&self) -> usize {
        if self.has_trainer {
            HEADER_SIZE + TRAINER_SIZE
        } else {
            HEADER_SIZE
        }
    }

    /// Total file length the header describes.
    #[must_use]
    pub fn file_size(&self) -> usize {
        self.prg_offset() + self.prg_size() + self.chr_size()
    }
}
