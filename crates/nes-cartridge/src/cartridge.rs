//! Cartridge boards and the bus devices they expose.

use std::cell::RefCell;
use std::rc::Rc;

use emu_core::Device;
use ricoh_ppu_2c02::Mirroring;
use tracing::{error, info};

use crate::CartridgeError;
use crate::ines::{CHR_BANK_SIZE, Header};

/// Address translation between the console and cartridge memory.
///
/// `cpu_read` returns `None` where the board does not drive the data bus.
pub trait Mapper {
    fn cpu_read(&self, addr: u16) -> Option<u8>;
    fn cpu_write(&mut self, addr: u16, value: u8);
    fn chr_read(&self, addr: u16) -> u8;
    fn chr_write(&mut self, addr: u16, value: u8);
    fn mirroring(&self) -> Mirroring;
}

/// PRG RAM size on boards that carry it ($6000-$7FFF).
const PRG_RAM_SIZE: usize = 8 * 1024;

/// NROM (Mapper 0): no bank switching.
///
/// - PRG: 16K mirrored at $8000-$FFFF, or 32K at $8000-$FFFF
/// - PRG RAM: 8K at $6000-$7FFF
/// - CHR: 8K at PPU $0000-$1FFF (RAM if the image has no CHR ROM)
pub struct Nrom {
    prg_rom: Vec<u8>,
    prg_ram: Vec<u8>,
    chr: Vec<u8>,
    chr_is_ram: bool,
    mirroring: Mirroring,
}

impl Nrom {
    #[must_use]
    pub fn new(prg_rom: Vec<u8>, chr_data: Vec<u8>, mirroring: Mirroring) -> Self {
        let chr_is_ram = chr_data.is_empty();
        let chr = if chr_is_ram {
            vec![0u8; CHR_BANK_SIZE]
        } else {
            chr_data
        };
        Self {
            prg_rom,
            prg_ram: vec![0u8; PRG_RAM_SIZE],
            chr,
            chr_is_ram,
            mirroring,
        }
    }
}

impl Mapper for Nrom {
    fn cpu_read(&self, addr: u16) -> Option<u8> {
        match addr {
            0x6000..=0x7FFF => Some(self.prg_ram[usize::from(addr - 0x6000)]),
            // A 16K image appears twice.
            0x8000..=0xFFFF => Some(self.prg_rom[usize::from(addr - 0x8000) % self.prg_rom.len()]),
            _ => None,
        }
    }

    fn cpu_write(&mut self, addr: u16, value: u8) {
        if let 0x6000..=0x7FFF = addr {
            self.prg_ram[usize::from(addr - 0x6000)] = value;
        }
    }

    fn chr_read(&self, addr: u16) -> u8 {
        self.chr[usize::from(addr & 0x1FFF) % self.chr.len()]
    }

    fn chr_write(&mut self, addr: u16, value: u8) {
        if self.chr_is_ram {
            self.chr[usize::from(addr & 0x1FFF)] = value;
        }
    }

    fn mirroring(&self) -> Mirroring {
        self.mirroring
    }
}

/// A board whose mapper is not implemented. Every access is reported and
/// reads as $FF, so a program can keep running (badly) instead of stopping.
pub struct Unimplemented {
    id: u8,
    mirroring: Mirroring,
}

impl Mapper for Unimplemented {
    fn cpu_read(&self, addr: u16) -> Option<u8> {
        error!(mapper = self.id, addr = format_args!("${addr:04X}"), "unimplemented mapper, CPU read");
        Some(0xFF)
    }

    fn cpu_write(&mut self, addr: u16, value: u8) {
        error!(mapper = self.id, addr = format_args!("${addr:04X}"), value, "unimplemented mapper, CPU write");
    }

    fn chr_read(&self, addr: u16) -> u8 {
        error!(mapper = self.id, addr = format_args!("${addr:04X}"), "unimplemented mapper, CHR read");
        0xFF
    }

    fn chr_write(&mut self, addr: u16, value: u8) {
        error!(mapper = self.id, addr = format_args!("${addr:04X}"), value, "unimplemented mapper, CHR write");
    }

    fn mirroring(&self) -> Mirroring {
        self.mirroring
    }
}

/// A loaded cartridge.
pub struct Cartridge {
    header: Header,
    mapper: Box<dyn Mapper>,
}

impl Cartridge {
    /// Load an iNES image.
    pub fn from_ines(data: &[u8]) -> Result<Self, CartridgeError> {
        let header = Header::parse(data)?;
        if header.prg_banks == 0 {
            return Err(CartridgeError::NoProgramRom);
        }
        if data.len() < header.file_size() {
            return Err(CartridgeError::Truncated {
                expected: header.file_size(),
                actual: data.len(),
            });
        }

        let prg_start = header.prg_offset();
        let chr_start = prg_start + header.prg_size();
        let prg_rom = data[prg_start..chr_start].to_vec();
        let chr_data = data[chr_start..chr_start + header.chr_size()].to_vec();

        let mapper: Box<dyn Mapper> = match header.mapper {
            0 => Box::new(Nrom::new(prg_rom, chr_data, header.mirroring)),
            id => {
                error!(mapper = id, "mapper not implemented; cartridge reads will return $FF");
                Box::new(Unimplemented {
                    id,
                    mirroring: header.mirroring,
                })
            }
        };

        info!(
            prg_banks = header.prg_banks,
            chr_banks = header.chr_banks,
            mapper = header.mapper,
            mirroring = ?header.mirroring,
            "cartridge loaded"
        );

        Ok(Self { header, mapper })
    }

    #[must_use]
    pub fn header(&self) -> &Header {
        &self.header
    }

    #[must_use]
    pub fn mapper_id(&self) -> u8 {
        self.header.mapper
    }

    #[must_use]
    pub fn mirroring(&self) -> Mirroring {
        self.mapper.mirroring()
    }

    #[must_use]
    pub fn cpu_read(&self, addr: u16) -> Option<u8> {
        self.mapper.cpu_read(addr)
    }

    pub fn cpu_write(&mut self, addr: u16, value: u8) {
        self.mapper.cpu_write(addr, value);
    }

    #[must_use]
    pub fn chr_read(&self, addr: u16) -> u8 {
        self.mapper.chr_read(addr)
    }

    pub fn chr_write(&mut self, addr: u16, value: u8) {
        self.mapper.chr_write(addr, value);
    }

    /// Wrap for sharing between the two buses.
    #[must_use]
    pub fn into_shared(self) -> SharedCartridge {
        Rc::new(RefCell::new(self))
    }
}

pub type SharedCartridge = Rc<RefCell<Cartridge>>;

/// The cartridge as seen by the CPU at $4020-$FFFF.
pub struct PrgDevice(pub SharedCartridge);

impl Device for PrgDevice {
    fn read(&mut self, address: u16) -> Option<u8> {
        self.0.borrow().cpu_read(address)
    }

    fn write(&mut self, address: u16, value: u8) {
        self.0.borrow_mut().cpu_write(address, value);
    }
}

/// The cartridge as seen by the PPU at $0000-$1FFF.
pub struct ChrDevice(pub SharedCartridge);

impl Device for ChrDevice {
    fn read(&mut self, address: u16) -> Option<u8> {
        Some(self.0.borrow().chr_read(address))
    }

    fn write(&mut self, address: u16, value: u8) {
        self.0.borrow_mut().chr_write(address, value);
    }
}
