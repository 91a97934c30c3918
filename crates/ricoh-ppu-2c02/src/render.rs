//! Pixel output.

/// Visible pixels per scanline.
pub const SCREEN_WIDTH: usize = 256;
/// Visible scanlines per frame.
pub const SCREEN_HEIGHT: usize = 240;

/// Receives one colour per visible pixel as the PPU produces it.
///
/// Coordinates are screen space (x 0-255, y 0-239); colours are 0xRRGGBB.
/// The PPU makes no assumption about when the image is presented.
pub trait RenderSink {
    fn set_pixel(&mut self, x: usize, y: usize, colour: u32);
}

/// A 256x240 image held in memory.
#[derive(Clone)]
pub struct Framebuffer {
    pixels: Vec<u32>,
}

impl Default for Framebuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Framebuffer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            pixels: vec![0; SCREEN_WIDTH * SCREEN_HEIGHT],
        }
    }

    /// Row-major pixels, 0xRRGGBB.
    #[must_use]
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    #[must_use]
    pub fn pixel(&self, x: usize, y: usize) -> Option<u32> {
        if x < SCREEN_WIDTH && y < SCREEN_HEIGHT {
            Some(self.pixels[y * SCREEN_WIDTH + x])
        } else {
            None
        }
    }

    pub fn clear(&mut self, colour: u32) {
        self.pixels.fill(colour);
    }
}

impl RenderSink for Framebuffer {
    fn set_pixel(&mut self, x: usize, y: usize, colour: u32) {
        if x < SCREEN_WIDTH && y < SCREEN_HEIGHT {
            self.pixels[y * SCREEN_WIDTH + x] = colour;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_pixels_are_dropped() {
        let mut fb = Framebuffer::new();
        fb.set_pixel(255, 239, 0x123456);
        fb.set_pixel(256, 0, 0xFFFFFF);
        fb.set_pixel(0, 240, 0xFFFFFF);
        assert_eq!(fb.pixel(255, 239), Some(0x123456));
        assert_eq!(fb.pixels().iter().filter(|&&p| p != 0).count(), 1);
        assert_eq!(fb.pixel(256, 0), None);
    }
}
