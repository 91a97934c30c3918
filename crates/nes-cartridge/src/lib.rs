//! NES cartridges: iNES parsing and mapper 0 (NROM).
//!
//! A [`Cartridge`] is shared between two buses. [`PrgDevice`] answers the
//! CPU at $4020-$FFFF and [`ChrDevice`] answers the PPU at $0000-$1FFF.
//! The nametable arrangement is read back with [`Cartridge::mirroring`].
//!
//! Images with any other mapper number still load, but every access to
//! them is logged as an error and reads back as $FF.

mod cartridge;
mod ines;

use thiserror::Error;

pub use cartridge::{Cartridge, ChrDevice, Mapper, Nrom, PrgDevice, SharedCartridge, Unimplemented};
pub use ines::{CHR_BANK_SIZE, HEADER_SIZE, Header, PRG_BANK_SIZE, TRAINER_SIZE};

/// Reasons an iNES image can be rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartridgeError {
    #[error("iNES file too short ({len} bytes, header needs 16)")]
    TooShort { len: usize },

    #[error("invalid iNES magic (expected NES\\x1A)")]
    BadMagic,

    #[error("iNES file truncated: header describes {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("iNES image has no PRG ROM")]
    NoProgramRom,
}
