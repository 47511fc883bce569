//! ROM images for CHIP-8 programs.
//!
//! A ROM is a raw big-endian instruction stream with no header, loaded
//! verbatim at the program base (0x200).

use crate::cpu::memory::{MEMORY_SIZE, PROGRAM_BASE};
use std::path::Path;
use thiserror::Error;

/// Largest image that fits between the program base and the end of memory.
pub const MAX_ROM_SIZE: usize = MEMORY_SIZE - PROGRAM_BASE as usize;

/// Read a ROM image from disk and check that it fits in memory.
pub fn load_rom<P: AsRef<Path>>(path: P) -> Result<Vec<u8>, RomError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)
        .map_err(|e| RomError::IoError(format!("{}: {}", path.display(), e)))?;

    validate(&bytes)?;
    log::debug!("read {} byte ROM from {}", bytes.len(), path.display());
    Ok(bytes)
}

/// Check an in-memory image against the program region.
pub fn validate(image: &[u8]) -> Result<(), RomError> {
    if image.is_empty() {
        return Err(RomError::Empty);
    }
    if image.len() > MAX_ROM_SIZE {
        return Err(RomError::TooLarge {
            size: image.len(),
            max: MAX_ROM_SIZE,
        });
    }
    Ok(())
}

/// Errors that can occur while loading a ROM.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RomError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("ROM image is empty")]
    Empty,

    #[error("ROM size {size} exceeds program space {max}")]
    TooLarge { size: usize, max: usize },
}
