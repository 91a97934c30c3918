//! Headless capture: PNG screenshots.

use std::fs;
use std::io::BufWriter;
use std::path::Path;

use ricoh_ppu_2c02::{Framebuffer, SCREEN_HEIGHT, SCREEN_WIDTH, palette};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("cannot create {path}")]
    Create {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("PNG encoding failed")]
    Encode(#[from] png::EncodingError),
}

/// Convert 0xRRGGBB pixels to RGBA bytes.
#[must_use]
pub fn to_rgba(framebuffer: &Framebuffer) -> Vec<u8> {
    framebuffer
        .pixels()
        .iter()
        .flat_map(|&pixel| {
            let [r, g, b] = palette::rgb(pixel);
            [r, g, b, 0xFF]
        })
        .collect()
}

/// Save the framebuffer as a 256x240 RGBA PNG.
pub fn save_screenshot(framebuffer: &Framebuffer, path: &Path) -> Result<(), CaptureError> {
    let file = fs::File::create(path).map_err(|source| CaptureError::Create {
        path: path.display().to_string(),
        source,
    })?;

    let mut encoder = png::Encoder::new(
        BufWriter::new(file),
        SCREEN_WIDTH as u32,
        SCREEN_HEIGHT as u32,
    );
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(&to_rgba(framebuffer))?;
    Ok(())
}
