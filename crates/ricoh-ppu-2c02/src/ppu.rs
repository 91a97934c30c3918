//! NES PPU (2C02) emulation, background layer.
//!
//! Dot-based rendering. One `tick()` = one PPU dot. Each frame is 341 dots
//! x 262 scanlines, numbered here as the pre-render line followed by the
//! visible ones:
//!
//! ## Scanline layout
//! - -1: pre-render (fetches for line 0, vertical scroll reload)
//! - 0-239: visible scanlines (render pixels)
//! - 240: post-render (idle)
//! - 241-260: `VBlank`, NMI raised at dot 1 of line 241

use emu_core::{AddressBus, Bus, Device, Observable, Value};
use tracing::debug;

use crate::palette::MASTER_PALETTE;
use crate::registers::{Control, Loopy, Mask, Status};
use crate::render::{RenderSink, SCREEN_HEIGHT, SCREEN_WIDTH};

/// Dots per scanline.
pub const DOTS_PER_LINE: u16 = 341;
/// Scanlines per frame.
pub const LINES_PER_FRAME: u16 = 262;
/// The line before the first visible one.
pub const PRE_RENDER_LINE: i16 = -1;
/// Last line of a frame.
pub const LAST_LINE: i16 = 260;
/// Line on which vertical blank begins.
pub const VBLANK_LINE: i16 = 241;

const PALETTE_BASE: u16 = 0x3F00;

/// PPU 2C02.
pub struct Ppu {
    /// PPU address space: pattern tables, nametables, palette.
    bus: AddressBus,

    // Registers
    ctrl: Control,
    mask: Mask,
    status: Status,

    // Loopy scroll/address registers
    v: Loopy,
    t: Loopy,
    fine_x: u8,
    write_latch: bool,

    // Data read buffer ($2007)
    data_buffer: u8,

    // Rendering position
    scanline: i16,
    cycle: u16,
    odd_frame: bool,
    frame_complete: bool,
    frame_count: u64,

    nmi_pending: bool,

    // Background pipeline
    next_tile_id: u8,
    next_tile_attrib: u8,
    next_tile_lo: u8,
    next_tile_hi: u8,
    shift_pattern_lo: u16,
    shift_pattern_hi: u16,
    shift_attrib_lo: u16,
    shift_attrib_hi: u16,
}

impl Ppu {
    /// Create a PPU on the given (locked) video bus, positioned at the
    /// start of the pre-render line.
    #[must_use]
    pub fn new(bus: AddressBus) -> Self {
        Self {
            bus,
            ctrl: Control::default(),
            mask: Mask::default(),
            status: Status::default(),
            v: Loopy::default(),
            t: Loopy::default(),
            fine_x: 0,
            write_latch: false,
            data_buffer: 0,
            scanline: PRE_RENDER_LINE,
            cycle: 0,
            odd_frame: false,
            frame_complete: false,
            frame_count: 0,
            nmi_pending: false,
            next_tile_id: 0,
            next_tile_attrib: 0,
            next_tile_lo: 0,
            next_tile_hi: 0,
            shift_pattern_lo: 0,
            shift_pattern_hi: 0,
            shift_attrib_lo: 0,
            shift_attrib_hi: 0,
        }
    }

    /// Return to power-up state and blank the output.
    ///
    /// Video memory is left alone. Registers, position, the frame counter
    /// and the pipeline are cleared.
    pub fn reset<S: RenderSink + ?Sized>(&mut self, sink: &mut S) {
        self.ctrl = Control::default();
        self.mask = Mask::default();
        self.status = Status::default();
        self.v = Loopy::default();
        self.t = Loopy::default();
        self.fine_x = 0;
        self.write_latch = false;
        self.data_buffer = 0;
        self.scanline = PRE_RENDER_LINE;
        self.cycle = 0;
        self.odd_frame = false;
        self.frame_complete = false;
        self.frame_count = 0;
        self.nmi_pending = false;
        self.next_tile_id = 0;
        self.next_tile_attrib = 0;
        self.next_tile_lo = 0;
        self.next_tile_hi = 0;
        self.shift_pattern_lo = 0;
        self.shift_pattern_hi = 0;
        self.shift_attrib_lo = 0;
        self.shift_attrib_hi = 0;

        let blank = MASTER_PALETTE[0x0F];
        for y in 0..SCREEN_HEIGHT {
            for x in 0..SCREEN_WIDTH {
                sink.set_pixel(x, y, blank);
            }
        }
        debug!("PPU reset");
    }

    /// One PPU dot.
    pub fn tick<S: RenderSink + ?Sized>(&mut self, sink: &mut S) {
        // Odd frames drop (0, 0) while rendering.
        if self.scanline == 0 && self.cycle == 0 && self.odd_frame && self.mask.rendering_enabled()
        {
            self.cycle = 1;
        }

        if self.scanline < 240 {
            self.tick_render_line();
        }

        if self.scanline == VBLANK_LINE && self.cycle == 1 {
            self.status.set_vblank(true);
            if self.ctrl.enable_nmi() {
                self.nmi_pending = true;
            }
        }

        self.output_pixel(sink);
        self.advance();
    }

    /// Pre-render and visible lines.
    fn tick_render_line(&mut self) {
        let cycle = self.cycle;

        if self.scanline == PRE_RENDER_LINE && cycle == 1 {
            self.status.set_vblank(false);
            self.status.set_sprite_zero_hit(false);
            self.status.set_sprite_overflow(false);
        }

        if !self.mask.rendering_enabled() {
            return;
        }

        if (2..=257).contains(&cycle) || (321..=337).contains(&cycle) {
            self.shift_background();
            self.bg_fetch_cycle((cycle - 1) & 0x07);
        }

        if cycle == 256 {
            self.v.increment_y();
        }
        if cycle == 257 {
            self.load_bg_shift_registers();
            self.v.copy_horizontal(self.t);
        }

        // Unused nametable fetches at the end of the line.
        if cycle == 338 || cycle == 340 {
            self.next_tile_id = self.bus.read(self.v.tile_address());
        }

        if self.scanline == PRE_RENDER_LINE && (280..=304).contains(&cycle) {
            self.v.copy_vertical(self.t);
        }
    }

    /// One step of the 8-dot tile fetch.
    fn bg_fetch_cycle(&mut self, phase: u16) {
        match phase {
            0 => {
                self.load_bg_shift_registers();
                self.next_tile_id = self.bus.read(self.v.tile_address());
            }
            2 => {
                let attrib = self.bus.read(self.v.attribute_address());
                self.next_tile_attrib = (attrib >> self.v.attribute_shift()) & 0x03;
            }
            4 => self.next_tile_lo = self.bus.read(self.pattern_address()),
            6 => self.next_tile_hi = self.bus.read(self.pattern_address() + 8),
            7 => self.v.increment_x(),
            _ => {}
        }
    }

    /// Low-plane pattern byte for the latched tile; the high plane is 8 bytes on.
    fn pattern_address(&self) -> u16 {
        self.ctrl.background_table() + u16::from(self.next_tile_id) * 16 + self.v.fine_y()
    }

    fn load_bg_shift_registers(&mut self) {
        self.shift_pattern_lo = (self.shift_pattern_lo & 0xFF00) | u16::from(self.next_tile_lo);
        self.shift_pattern_hi = (self.shift_pattern_hi & 0xFF00) | u16::from(self.next_tile_hi);

        let attrib_lo = if self.next_tile_attrib & 0x01 != 0 { 0xFF } else { 0x00 };
        let attrib_hi = if self.next_tile_attrib & 0x02 != 0 { 0xFF } else { 0x00 };
        self.shift_attrib_lo = (self.shift_attrib_lo & 0xFF00) | attrib_lo;
        self.shift_attrib_hi = (self.shift_attrib_hi & 0xFF00) | attrib_hi;
    }

    fn shift_background(&mut self) {
        if !self.mask.render_background() {
            return;
        }
        self.shift_pattern_lo <<= 1;
        self.shift_pattern_hi <<= 1;
        self.shift_attrib_lo <<= 1;
        self.shift_attrib_hi <<= 1;
    }

    /// Background pixel value (0-3) and palette group (0-3) at screen column `x`.
    fn bg_pixel(&self, x: usize) -> (u8, u8) {
        if !self.mask.render_background() {
            return (0, 0);
        }
        if x < 8 && !self.mask.render_background_left() {
            return (0, 0);
        }

        let bit_select = 0x8000 >> self.fine_x;
        let pixel_lo = u8::from(self.shift_pattern_lo & bit_select != 0);
        let pixel_hi = u8::from(self.shift_pattern_hi & bit_select != 0);
        let palette_lo = u8::from(self.shift_attrib_lo & bit_select != 0);
        let palette_hi = u8::from(self.shift_attrib_hi & bit_select != 0);

        ((pixel_hi << 1) | pixel_lo, (palette_hi << 1) | palette_lo)
    }

    fn output_pixel<S: RenderSink + ?Sized>(&mut self, sink: &mut S) {
        let Ok(y) = usize::try_from(self.scanline) else {
            return;
        };
        let x = usize::from(self.cycle).wrapping_sub(1);
        if x >= SCREEN_WIDTH || y >= SCREEN_HEIGHT {
            return;
        }

        let (pixel, palette) = self.bg_pixel(x);
        // Pixel value 0 is transparent and shows the backdrop at $3F00.
        let entry = if pixel == 0 {
            0
        } else {
            (u16::from(palette) << 2) | u16::from(pixel)
        };
        let mut colour = self.bus.read(PALETTE_BASE | entry) & 0x3F;
        if self.mask.greyscale() {
            colour &= 0x30;
        }
        sink.set_pixel(x, y, MASTER_PALETTE[usize::from(colour)]);
    }

    fn advance(&mut self) {
        self.cycle += 1;
        if self.cycle >= DOTS_PER_LINE {
            self.cycle = 0;
            self.scanline += 1;
            if self.scanline > LAST_LINE {
                self.scanline = PRE_RENDER_LINE;
                self.frame_complete = true;
                self.frame_count += 1;
                self.odd_frame = !self.odd_frame;
            }
        }
    }

    // === Register access (CPU side) ===

    /// CPU read from PPU register ($2000-$2007 mirrored).
    pub fn cpu_read(&mut self, address: u16) -> u8 {
        match address & 0x07 {
            // $2002 - PPUSTATUS
            2 => {
                // Low five bits are stale bus contents.
                let result = (self.status.0 & 0xE0) | (self.data_buffer & 0x1F);
                self.status.set_vblank(false);
                self.write_latch = false;
                result
            }
            // $2007 - PPUDATA
            7 => {
                let addr = self.v.0 & 0x3FFF;
                let result = if addr >= PALETTE_BASE {
                    // Palette reads are not delayed; the buffer picks up the
                    // nametable byte underneath.
                    let colour = self.bus.read(addr);
                    self.data_buffer = self.bus.read(addr & 0x2FFF);
                    colour
                } else {
                    let stale = self.data_buffer;
                    self.data_buffer = self.bus.read(addr);
                    stale
                };
                self.increment_v();
                result
            }
            // Write-only registers; OAM is not emulated
            _ => 0,
        }
    }

    /// CPU write to PPU register ($2000-$2007 mirrored).
    pub fn cpu_write(&mut self, address: u16, value: u8) {
        match address & 0x07 {
            // $2000 - PPUCTRL
            0 => {
                self.ctrl = Control(value);
                self.t.set_nametable(self.ctrl.nametable_select());
            }
            // $2001 - PPUMASK
            1 => self.mask = Mask(value),
            // $2005 - PPUSCROLL
            5 => {
                if self.write_latch {
                    self.t.set_fine_y(u16::from(value & 0x07));
                    self.t.set_coarse_y(u16::from(value >> 3));
                } else {
                    self.fine_x = value & 0x07;
                    self.t.set_coarse_x(u16::from(value >> 3));
                }
                self.write_latch = !self.write_latch;
            }
            // $2006 - PPUADDR
            6 => {
                if self.write_latch {
                    self.t = Loopy((self.t.0 & 0xFF00) | u16::from(value));
                    self.v = self.t;
                } else {
                    self.t = Loopy((self.t.0 & 0x00FF) | (u16::from(value & 0x3F) << 8));
                }
                self.write_latch = !self.write_latch;
            }
            // $2007 - PPUDATA
            7 => {
                self.bus.write(self.v.0 & 0x3FFF, value);
                self.increment_v();
            }
            // $2002 is read-only; $2003/$2004 drive OAM, which is not emulated
            _ => {}
        }
    }

    fn increment_v(&mut self) {
        self.v = Loopy(self.v.0.wrapping_add(self.ctrl.increment()) & 0x7FFF);
    }

    // === Signals ===

    /// Take the pending NMI request. True at most once per vertical blank.
    pub fn take_nmi(&mut self) -> bool {
        std::mem::take(&mut self.nmi_pending)
    }

    #[must_use]
    pub fn nmi_pending(&self) -> bool {
        self.nmi_pending
    }

    /// Take the frame-complete signal, set when the last line wraps.
    pub fn take_frame_complete(&mut self) -> bool {
        std::mem::take(&mut self.frame_complete)
    }

    #[must_use]
    pub fn is_frame_complete(&self) -> bool {
        self.frame_complete
    }

    /// Frames completed since creation.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    // === Inspection ===

    /// Current scanline (-1 to 260).
    #[must_use]
    pub fn scanline(&self) -> i16 {
        self.scanline
    }

    /// Current dot (0 to 340).
    #[must_use]
    pub fn cycle(&self) -> u16 {
        self.cycle
    }

    #[must_use]
    pub fn ctrl(&self) -> Control {
        self.ctrl
    }

    #[must_use]
    pub fn mask(&self) -> Mask {
        self.mask
    }

    #[must_use]
    pub fn status(&self) -> Status {
        self.status
    }

    /// Active VRAM address (`v`).
    #[must_use]
    pub fn vram_address(&self) -> Loopy {
        self.v
    }

    /// Buffered VRAM address (`t`).
    #[must_use]
    pub fn temp_address(&self) -> Loopy {
        self.t
    }

    #[must_use]
    pub fn fine_x(&self) -> u8 {
        self.fine_x
    }

    #[must_use]
    pub fn video_bus(&self) -> &AddressBus {
        &self.bus
    }

    pub fn video_bus_mut(&mut self) -> &mut AddressBus {
        &mut self.bus
    }
}

/// The register window on the CPU bus.
impl Device for Ppu {
    fn read(&mut self, address: u16) -> Option<u8> {
        Some(self.cpu_read(address))
    }

    fn write(&mut self, address: u16, value: u8) {
        self.cpu_write(address, value);
    }
}

impl Observable for Ppu {
    fn query(&self, path: &str) -> Option<Value> {
        if let Some(rest) = path.strip_prefix("bus.") {
            return self.bus.query(rest);
        }
        match path {
            "scanline" => Some(self.scanline.into()),
            "cycle" | "dot" => Some(self.cycle.into()),
            "ctrl" => Some(self.ctrl.0.into()),
            "mask" => Some(self.mask.0.into()),
            "status" => Some(self.status.0.into()),
            "v" => Some(self.v.0.into()),
            "t" => Some(self.t.0.into()),
            "fine_x" => Some(self.fine_x.into()),
            "write_latch" => Some(self.write_latch.into()),
            "data_buffer" => Some(self.data_buffer.into()),
            "vblank" => Some(self.status.vblank().into()),
            "nmi_pending" => Some(self.nmi_pending.into()),
            "frame_complete" => Some(self.frame_complete.into()),
            "frame_count" => Some(self.frame_count.into()),
            "odd_frame" => Some(self.odd_frame.into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "scanline",
            "cycle",
            "ctrl",
            "mask",
            "status",
            "v",
            "t",
            "fine_x",
            "write_latch",
            "data_buffer",
            "vblank",
            "nmi_pending",
            "frame_complete",
            "frame_count",
            "odd_frame",
            "bus.<path>",
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{Mirroring, VideoMemory, video_bus};
    use crate::render::Framebuffer;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct ChrRam(Vec<u8>);

    impl Device for ChrRam {
        fn read(&mut self, address: u16) -> Option<u8> {
            Some(self.0[usize::from(address & 0x1FFF)])
        }

        fn write(&mut self, address: u16, value: u8) {
            self.0[usize::from(address & 0x1FFF)] = value;
        }
    }

    fn make_ppu() -> (Ppu, Rc<RefCell<VideoMemory>>) {
        let memory = Rc::new(RefCell::new(VideoMemory::new()));
        let bus = video_bus(&memory, ChrRam(vec![0; 0x2000]), || Mirroring::Vertical)
            .expect("video bus locks");
        (Ppu::new(bus), memory)
    }

    fn set_address(ppu: &mut Ppu, address: u16) {
        ppu.cpu_write(0x2006, (address >> 8) as u8);
        ppu.cpu_write(0x2006, address as u8);
    }

    #[test]
    fn status_read_returns_stale_low_bits_and_clears() {
        let (mut ppu, _) = make_ppu();
        ppu.status.set_vblank(true);
        ppu.data_buffer = 0x3F;
        ppu.write_latch = true;

        assert_eq!(ppu.cpu_read(0x2002), 0x9F);
        assert!(!ppu.status.vblank());
        assert!(!ppu.write_latch);
        assert_eq!(ppu.cpu_read(0x2002), 0x1F);
    }

    #[test]
    fn ppudata_reads_are_delayed_by_one() {
        let (mut ppu, _) = make_ppu();
        set_address(&mut ppu, 0x2400);
        ppu.cpu_write(0x2007, 0xAA);
        ppu.cpu_write(0x2007, 0xBB);

        set_address(&mut ppu, 0x2400);
        let _stale = ppu.cpu_read(0x2007);
        assert_eq!(ppu.cpu_read(0x2007), 0xAA);
        assert_eq!(ppu.cpu_read(0x2007), 0xBB);
    }

    #[test]
    fn palette_reads_are_immediate_and_refill_buffer() {
        let (mut ppu, memory) = make_ppu();
        memory.borrow_mut().write_nametable(0x2F05, 0x77, Mirroring::Vertical);
        set_address(&mut ppu, 0x3F05);
        ppu.cpu_write(0x2007, 0x21);

        set_address(&mut ppu, 0x3F05);
        assert_eq!(ppu.cpu_read(0x2007), 0x21);
        assert_eq!(ppu.data_buffer, 0x77, "buffer holds the nametable byte at $2F05");
    }

    #[test]
    fn increment_mode_steps_by_32() {
        let (mut ppu, memory) = make_ppu();
        ppu.cpu_write(0x2000, 0x04);
        set_address(&mut ppu, 0x2000);
        ppu.cpu_write(0x2007, 1);
        ppu.cpu_write(0x2007, 2);

        assert_eq!(ppu.vram_address().0, 0x2040);
        let memory = memory.borrow();
        assert_eq!(memory.read_nametable(0x2000, Mirroring::Vertical), 1);
        assert_eq!(memory.read_nametable(0x2020, Mirroring::Vertical), 2);
    }

    #[test]
    fn scroll_writes_fill_t_and_fine_x() {
        let (mut ppu, _) = make_ppu();
        ppu.cpu_write(0x2000, 0x02);
        ppu.cpu_write(0x2005, 0x7D); // coarse X 15, fine X 5
        ppu.cpu_write(0x2005, 0x5E); // coarse Y 11, fine Y 6

        assert_eq!(ppu.fine_x(), 5);
        let t = ppu.temp_address();
        assert_eq!(t.coarse_x(), 15);
        assert_eq!(t.coarse_y(), 11);
        assert_eq!(t.fine_y(), 6);
        assert!(t.nametable_y());
        assert_eq!(t.0, 0x696F);
        assert_eq!(ppu.vram_address().0, 0, "scroll writes leave v alone");
    }

    #[test]
    fn address_writes_copy_into_v_on_second_write() {
        let (mut ppu, _) = make_ppu();
        ppu.cpu_write(0x2006, 0xFF);
        assert_eq!(ppu.vram_address().0, 0);
        assert_eq!(ppu.temp_address().0, 0x3F00, "top bits masked to 14");
        ppu.cpu_write(0x2006, 0x10);
        assert_eq!(ppu.vram_address().0, 0x3F10);
    }

    #[test]
    fn registers_mirror_every_eight_bytes() {
        let (mut ppu, _) = make_ppu();
        ppu.write(0x3FF9, 0x1E);
        assert_eq!(ppu.mask().0, 0x1E);
        ppu.status.set_vblank(true);
        assert_eq!(ppu.read(0x2FFA).map(|s| s & 0x80), Some(0x80));
    }

    #[test]
    fn write_only_registers_read_zero() {
        let (mut ppu, _) = make_ppu();
        ppu.cpu_write(0x2000, 0xFF);
        assert_eq!(ppu.cpu_read(0x2000), 0);
        assert_eq!(ppu.cpu_read(0x2001), 0);
    }

    #[test]
    fn reset_blanks_sink_and_rewinds() {
        let (mut ppu, _) = make_ppu();
        let mut fb = Framebuffer::new();
        fb.clear(0xFFFFFF);
        for _ in 0..1000 {
            ppu.tick(&mut fb);
        }
        ppu.cpu_write(0x2000, 0x80);

        ppu.reset(&mut fb);
        assert_eq!((ppu.scanline(), ppu.cycle()), (PRE_RENDER_LINE, 0));
        assert_eq!(ppu.ctrl().0, 0);
        assert!(fb.pixels().iter().all(|&p| p == 0));
    }

    #[test]
    fn observable_paths() {
        let (ppu, _) = make_ppu();
        assert_eq!(ppu.query("scanline"), Some(Value::I16(-1)));
        assert_eq!(ppu.query("frame_complete"), Some(Value::Bool(false)));
        assert_eq!(ppu.query("bus.owner.0x3F00"), Some(Value::String("PALETTE".into())));
        assert_eq!(ppu.query("sprites"), None);
    }
}
