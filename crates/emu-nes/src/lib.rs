//! Cycle-stepped NES emulator core.
//!
//! Ties a [`mos_6502::Mos6502`], a [`ricoh_ppu_2c02::Ppu`] and an
//! [`nes_cartridge::Cartridge`] together on two address buses. The CPU bus
//! carries 2 KiB of work RAM ($0000-$1FFF), the PPU register window
//! ($2000-$3FFF) and the cartridge ($4020-$FFFF). The PPU's own bus
//! carries pattern tables, nametables and palette.
//!
//! The PPU runs three dots per CPU cycle.

pub mod capture;
mod config;
mod nes;
mod ram;

use emu_core::RegistryError;
use nes_cartridge::CartridgeError;
use thiserror::Error;

pub use config::NesConfig;
pub use nes::{Nes, RunOutcome, StopHandle};
pub use ram::{RAM_SIZE, Ram};

/// Failures while building a system.
#[derive(Debug, Error)]
pub enum NesError {
    #[error(transparent)]
    Cartridge(#[from] CartridgeError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("cannot read {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
