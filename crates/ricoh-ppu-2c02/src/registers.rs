//! PPU register layouts.
//!
//! `Control` ($2000), `Mask` ($2001) and `Status` ($2002) are single bytes
//! with named bit accessors. `Loopy` is the 15-bit scroll/address layout
//! shared by the active (`v`) and buffered (`t`) address registers:
//!
//! ```text
//! yyy NN YYYYY XXXXX
//! ||| || ||||| +++++-- coarse X (bits 0-4)
//! ||| || +++++-------- coarse Y (bits 5-9)
//! ||| |+-------------- nametable X (bit 10)
//! ||| +--------------- nametable Y (bit 11)
//! +++----------------- fine Y (bits 12-14)
//! ```

macro_rules! bit_register {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($(#[$doc:meta])* $bit:literal => $get:ident, $set:ident;)*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
        pub struct $name(pub u8);

        impl $name {
            $(
                $(#[$doc])*
                #[must_use]
                pub const fn $get(self) -> bool {
                    self.0 & (1 << $bit) != 0
                }

                pub fn $set(&mut self, on: bool) {
                    if on {
                        self.0 |= 1 << $bit;
                    } else {
                        self.0 &= !(1 << $bit);
                    }
                }
            )*
        }
    };
}

bit_register! {
    /// PPUCTRL ($2000).
    Control {
        0 => nametable_x, set_nametable_x;
        1 => nametable_y, set_nametable_y;
        /// VRAM address step: clear adds 1 (across), set adds 32 (down).
        2 => increment_mode, set_increment_mode;
        3 => pattern_sprite, set_pattern_sprite;
        /// Background pattern table: clear is $0000, set is $1000.
        4 => pattern_background, set_pattern_background;
        5 => sprite_size, set_sprite_size;
        6 => slave_mode, set_slave_mode;
        /// Raise NMI at the start of vertical blank.
        7 => enable_nmi, set_enable_nmi;
    }
}

impl Control {
    /// Amount PPUDATA accesses add to `v`.
    #[must_use]
    pub const fn increment(self) -> u16 {
        if self.increment_mode() { 32 } else { 1 }
    }

    /// Nametable select bits (0-3).
    #[must_use]
    pub const fn nametable_select(self) -> u16 {
        (self.0 & 0x03) as u16
    }

    /// Base address of the background pattern table.
    #[must_use]
    pub const fn background_table(self) -> u16 {
        (self.pattern_background() as u16) << 12
    }
}

bit_register! {
    /// PPUMASK ($2001).
    Mask {
        0 => greyscale, set_greyscale;
        /// Show background in the leftmost 8 pixels.
        1 => render_background_left, set_render_background_left;
        2 => render_sprites_left, set_render_sprites_left;
        3 => render_background, set_render_background;
        4 => render_sprites, set_render_sprites;
        5 => emphasise_red, set_emphasise_red;
        6 => emphasise_green, set_emphasise_green;
        7 => emphasise_blue, set_emphasise_blue;
    }
}

impl Mask {
    /// Background or sprites enabled. Scroll counters only move while true.
    #[must_use]
    pub const fn rendering_enabled(self) -> bool {
        self.render_background() || self.render_sprites()
    }
}

bit_register! {
    /// PPUSTATUS ($2002). The low five bits are not driven by the PPU.
    Status {
        5 => sprite_overflow, set_sprite_overflow;
        6 => sprite_zero_hit, set_sprite_zero_hit;
        7 => vblank, set_vblank;
    }
}

/// Scroll/address register (`v` or `t`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Loopy(pub u16);

impl Loopy {
    const COARSE_X: u16 = 0x001F;
    const COARSE_Y: u16 = 0x03E0;
    const NAMETABLE_X: u16 = 0x0400;
    const NAMETABLE_Y: u16 = 0x0800;
    const FINE_Y: u16 = 0x7000;

    /// Bits copied from `t` at the end of each rendered line.
    const HORIZONTAL: u16 = Self::COARSE_X | Self::NAMETABLE_X;
    /// Bits copied from `t` during the pre-render line.
    const VERTICAL: u16 = Self::COARSE_Y | Self::NAMETABLE_Y | Self::FINE_Y;

    #[must_use]
    pub const fn coarse_x(self) -> u16 {
        self.0 & Self::COARSE_X
    }

    pub fn set_coarse_x(&mut self, value: u16) {
        self.0 = (self.0 & !Self::COARSE_X) | (value & 0x1F);
    }

    #[must_use]
    pub const fn coarse_y(self) -> u16 {
        (self.0 & Self::COARSE_Y) >> 5
    }

    pub fn set_coarse_y(&mut self, value: u16) {
        self.0 = (self.0 & !Self::COARSE_Y) | ((value & 0x1F) << 5);
    }

    #[must_use]
    pub const fn nametable_x(self) -> bool {
        self.0 & Self::NAMETABLE_X != 0
    }

    #[must_use]
    pub const fn nametable_y(self) -> bool {
        self.0 & Self::NAMETABLE_Y != 0
    }

    /// Replace both nametable bits with `select` (0-3).
    pub fn set_nametable(&mut self, select: u16) {
        self.0 = (self.0 & !(Self::NAMETABLE_X | Self::NAMETABLE_Y)) | ((select & 0x03) << 10);
    }

    #[must_use]
    pub const fn fine_y(self) -> u16 {
        (self.0 & Self::FINE_Y) >> 12
    }

    pub fn set_fine_y(&mut self, value: u16) {
        self.0 = (self.0 & !Self::FINE_Y) | ((value & 0x07) << 12);
    }

    /// Address of the nametable byte for the current tile.
    #[must_use]
    pub const fn tile_address(self) -> u16 {
        0x2000 | (self.0 & 0x0FFF)
    }

    /// Address of the attribute byte covering the current tile.
    #[must_use]
    pub const fn attribute_address(self) -> u16 {
        0x23C0 | (self.0 & 0x0C00) | ((self.0 >> 4) & 0x38) | ((self.0 >> 2) & 0x07)
    }

    /// Right shift selecting the tile's 2-bit quadrant in its attribute byte.
    #[must_use]
    pub const fn attribute_shift(self) -> u16 {
        ((self.0 >> 4) & 0x04) | (self.0 & 0x02)
    }

    /// Move one tile right, wrapping into the neighbouring nametable.
    pub fn increment_x(&mut self) {
        if self.coarse_x() == 31 {
            self.0 &= !Self::COARSE_X;
            self.0 ^= Self::NAMETABLE_X;
        } else {
            self.0 += 1;
        }
    }

    /// Move one pixel row down.
    ///
    /// Coarse Y 29 is the last tile row: it wraps to 0 and flips the
    /// vertical nametable. Rows 30 and 31 hold attribute data; scrolling
    /// into them wraps 31 to 0 without the flip.
    pub fn increment_y(&mut self) {
        if self.fine_y() < 7 {
            self.0 += 0x1000;
            return;
        }
        self.0 &= !Self::FINE_Y;
        match self.coarse_y() {
            29 => {
                self.set_coarse_y(0);
                self.0 ^= Self::NAMETABLE_Y;
            }
            31 => self.set_coarse_y(0),
            y => self.set_coarse_y(y + 1),
        }
    }

    pub fn copy_horizontal(&mut self, from: Loopy) {
        self.0 = (self.0 & !Self::HORIZONTAL) | (from.0 & Self::HORIZONTAL);
    }

    pub fn copy_vertical(&mut self, from: Loopy) {
        self.0 = (self.0 & !Self::VERTICAL) | (from.0 & Self::VERTICAL);
    }
}
