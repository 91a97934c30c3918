//! Ricoh 2C02 picture processing unit.
//!
//! The PPU owns its own [`AddressBus`](emu_core::AddressBus) (pattern
//! tables, nametables, palette) and appears on the CPU bus as an eight
//! byte register window mirrored across $2000-$3FFF. Only the background
//! layer is rendered; sprite evaluation and OAM are not emulated.
//!
//! Each [`Ppu::tick`] advances one dot and hands at most one pixel to a
//! [`RenderSink`]. Vertical blank raises an NMI request that the owning
//! system collects with [`Ppu::take_nmi`].

mod memory;
pub mod palette;
mod ppu;
mod registers;
mod render;

pub use memory::{Mirroring, NAMETABLE_SIZE, NametableDevice, PaletteDevice, VideoMemory, video_bus};
pub use palette::MASTER_PALETTE;
pub use ppu::{DOTS_PER_LINE, LAST_LINE, LINES_PER_FRAME, PRE_RENDER_LINE, Ppu, VBLANK_LINE};
pub use registers::{Control, Loopy, Mask, Status};
pub use render::{Framebuffer, RenderSink, SCREEN_HEIGHT, SCREEN_WIDTH};
