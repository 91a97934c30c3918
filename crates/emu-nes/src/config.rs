//! NES configuration.

use std::fs;
use std::path::Path;

use crate::NesError;

/// NES configuration.
pub struct NesConfig {
    /// iNES file contents.
    pub rom_data: Vec<u8>,
}

impl NesConfig {
    /// Read an iNES file from disk. The image is validated later, by
    /// [`Nes::new`](crate::Nes::new).
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, NesError> {
        let path = path.as_ref();
        let rom_data = fs::read(path).map_err(|source| NesError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self { rom_data })
    }
}
