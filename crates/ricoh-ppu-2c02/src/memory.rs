//! Video RAM and the devices that put it on the PPU bus.
//!
//! The PPU address space, as wired on the NES:
//!
//! | Range         | Device                                   |
//! |---------------|------------------------------------------|
//! | $0000-$1FFF   | pattern tables (cartridge CHR)           |
//! | $2000-$3EFF   | [`NametableDevice`], $3000+ mirrors $2000+ |
//! | $3F00-$3FFF   | [`PaletteDevice`], 32 bytes mirrored     |

use std::cell::RefCell;
use std::rc::Rc;

use emu_core::{AddressBus, Device, Mapping, RegistryError};

/// Size of one nametable, including its attribute table.
pub const NAMETABLE_SIZE: usize = 0x400;

/// Assemble and lock the PPU's address space.
///
/// `chr` answers $0000-$1FFF; nametables and palette come from `memory`.
pub fn video_bus(
    memory: &Rc<RefCell<VideoMemory>>,
    chr: impl Device + 'static,
    mirroring: impl Fn() -> Mirroring + 'static,
) -> Result<AddressBus, RegistryError> {
    let mut bus = AddressBus::new("ppu");
    bus.register(Mapping::new("CHR", 0x0000, 0x1FFF, chr))?;
    bus.register(Mapping::new(
        "NAMETABLES",
        0x2000,
        0x3EFF,
        NametableDevice::new(Rc::clone(memory), mirroring),
    ))?;
    bus.register(Mapping::new(
        "PALETTE",
        0x3F00,
        0x3FFF,
        PaletteDevice::new(Rc::clone(memory)),
    ))?;
    bus.lock()?;
    Ok(bus)
}

/// How the four logical nametables share physical memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mirroring {
    /// Tables 0/1 share storage, as do 2/3 (vertical scrolling games).
    Horizontal,
    /// Tables 0/2 share storage, as do 1/3 (horizontal scrolling games).
    Vertical,
}

impl Mirroring {
    /// Physical table backing logical table `table` (0-3).
    #[must_use]
    pub const fn physical_table(self, table: usize) -> usize {
        match self {
            Mirroring::Horizontal => table & 0b10,
            Mirroring::Vertical => table & 0b01,
        }
    }
}

/// Nametable and palette storage.
pub struct VideoMemory {
    nametables: [[u8; NAMETABLE_SIZE]; 4],
    palette: [u8; 32],
}

impl Default for VideoMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoMemory {
    #[must_use]
    pub fn new() -> Self {
        Self {
            nametables: [[0; NAMETABLE_SIZE]; 4],
            palette: [0; 32],
        }
    }

    /// Split a $2000-$3EFF address into (physical table, offset).
    fn locate(address: u16, mirroring: Mirroring) -> (usize, usize) {
        let offset = usize::from(address & 0x0FFF);
        let table = offset / NAMETABLE_SIZE;
        (mirroring.physical_table(table), offset % NAMETABLE_SIZE)
    }

    #[must_use]
    pub fn read_nametable(&self, address: u16, mirroring: Mirroring) -> u8 {
        let (table, offset) = Self::locate(address, mirroring);
        self.nametables[table][offset]
    }

    pub fn write_nametable(&mut self, address: u16, value: u8, mirroring: Mirroring) {
        let (table, offset) = Self::locate(address, mirroring);
        self.nametables[table][offset] = value;
    }

    /// Index into palette RAM. Sprite backdrop entries alias the background ones.
    #[must_use]
    pub fn palette_index(address: u16) -> usize {
        let index = usize::from(address & 0x1F);
        match index {
            0x10 | 0x14 | 0x18 | 0x1C => index - 0x10,
            _ => index,
        }
    }

    #[must_use]
    pub fn read_palette(&self, address: u16) -> u8 {
        self.palette[Self::palette_index(address)]
    }

    pub fn write_palette(&mut self, address: u16, value: u8) {
        self.palette[Self::palette_index(address)] = value;
    }
}

/// Nametable RAM as seen at $2000-$3EFF.
///
/// The mirroring source is polled on every access, so a cartridge may
/// change its arrangement at run time.
pub struct NametableDevice {
    memory: Rc<RefCell<VideoMemory>>,
    mirroring: Box<dyn Fn() -> Mirroring>,
}

impl NametableDevice {
    pub fn new(
        memory: Rc<RefCell<VideoMemory>>,
        mirroring: impl Fn() -> Mirroring + 'static,
    ) -> Self {
        Self {
            memory,
            mirroring: Box::new(mirroring),
        }
    }
}

impl Device for NametableDevice {
    fn read(&mut self, address: u16) -> Option<u8> {
        Some(self.memory.borrow().read_nametable(address, (self.mirroring)()))
    }

    fn write(&mut self, address: u16, value: u8) {
        self.memory
            .borrow_mut()
            .write_nametable(address, value, (self.mirroring)());
    }
}

/// Palette RAM as seen at $3F00-$3FFF.
pub struct PaletteDevice {
    memory: Rc<RefCell<VideoMemory>>,
}

impl PaletteDevice {
    #[must_use]
    pub fn new(memory: Rc<RefCell<VideoMemory>>) -> Self {
        Self { memory }
    }
}

impl Device for PaletteDevice {
    fn read(&mut self, address: u16) -> Option<u8> {
        Some(self.memory.borrow().read_palette(address))
    }

    fn write(&mut self, address: u16, value: u8) {
        self.memory.borrow_mut().write_palette(address, value);
    }
}
