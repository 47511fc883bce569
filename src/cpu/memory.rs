//! CHIP-8 memory subsystem.
//!
//! 4 KiB of flat byte-addressable RAM. The interpreter area below 0x200
//! holds the hexadecimal font; programs are loaded at 0x200.

use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Total addressable memory in bytes (0x000-0xFFF).
pub const MEMORY_SIZE: usize = 4096;

/// Where programs are loaded and where execution starts.
pub const PROGRAM_BASE: u16 = 0x200;

/// Where the hexadecimal font lives.
pub const FONT_BASE: u16 = 0x000;

/// Bytes per font glyph.
pub const GLYPH_BYTES: u16 = 5;

/// The standard 4x5 hexadecimal glyphs, 0 through F.
pub const FONT: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

/// CHIP-8 memory: 4096 bytes, zeroed on creation.
///
/// A deserialized image of any other length is rejected.
#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct Memory {
    bytes: Vec<u8>,
}

impl Memory {
    /// Create a new memory with all bytes zeroed.
    pub fn new() -> Self {
        Self {
            bytes: vec![0; MEMORY_SIZE],
        }
    }

    /// Read one byte.
    pub fn read(&self, addr: u16) -> Result<u8, MemoryError> {
        self.bytes
            .get(addr as usize)
            .copied()
            .ok_or(MemoryError::OutOfBounds { addr, len: 1 })
    }

    /// Write one byte.
    pub fn write(&mut self, addr: u16, value: u8) -> Result<(), MemoryError> {
        let cell = self.bytes
            .get_mut(addr as usize)
            .ok_or(MemoryError::OutOfBounds { addr, len: 1 })?;
        *cell = value;
        Ok(())
    }

    /// Read a big-endian instruction word at `addr` and `addr + 1`.
    pub fn read_word(&self, addr: u16) -> Result<u16, MemoryError> {
        let pair = self.slice(addr, 2)?;
        Ok(u16::from_be_bytes([pair[0], pair[1]]))
    }

    /// Borrow `len` bytes starting at `addr`.
    ///
    /// The whole range is checked up front, so callers never see a
    /// partially valid slice.
    pub fn slice(&self, addr: u16, len: usize) -> Result<&[u8], MemoryError> {
        let range = self.range(addr, len)?;
        Ok(&self.bytes[range])
    }

    /// Mutably borrow `len` bytes starting at `addr`.
    pub fn slice_mut(&mut self, addr: u16, len: usize) -> Result<&mut [u8], MemoryError> {
        let range = self.range(addr, len)?;
        Ok(&mut self.bytes[range])
    }

    fn range(&self, addr: u16, len: usize) -> Result<std::ops::Range<usize>, MemoryError> {
        let start = addr as usize;
        match start.checked_add(len) {
            Some(end) if end <= self.bytes.len() => Ok(start..end),
            _ => Err(MemoryError::OutOfBounds { addr, len }),
        }
    }

    /// Install the hexadecimal font at [`FONT_BASE`].
    pub fn load_font(&mut self) {
        let base = FONT_BASE as usize;
        self.bytes[base..base + FONT.len()].copy_from_slice(&FONT);
    }

    /// Copy a program image into memory at [`PROGRAM_BASE`].
    pub fn load_program(&mut self, program: &[u8]) -> Result<(), ImageError> {
        let available = MEMORY_SIZE - PROGRAM_BASE as usize;
        if program.len() > available {
            return Err(ImageError::ProgramTooLarge {
                size: program.len(),
                available,
            });
        }
        let base = PROGRAM_BASE as usize;
        self.bytes[base..base + program.len()].copy_from_slice(program);
        Ok(())
    }

    /// Clear all memory to zeros.
    pub fn clear(&mut self) {
        self.bytes.fill(0);
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl TryFrom<Vec<u8>> for Memory {
    type Error = ImageError;

    fn try_from(bytes: Vec<u8>) -> Result<Self, Self::Error> {
        if bytes.len() != MEMORY_SIZE {
            return Err(ImageError::WrongSize { len: bytes.len() });
        }
        Ok(Self { bytes })
    }
}

impl From<Memory> for Vec<u8> {
    fn from(mem: Memory) -> Self {
        mem.bytes
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let non_zero = self.bytes.iter().filter(|b| **b != 0).count();

        f.debug_struct("Memory")
            .field("non_zero_bytes", &non_zero)
            .field("total_bytes", &MEMORY_SIZE)
            .finish()
    }
}

/// Errors that can occur during memory operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    /// Access of `len` bytes at `addr` runs past the end of memory.
    #[error("memory access of {len} byte(s) at {addr:#05x} out of range (0x000-0xfff)")]
    OutOfBounds { addr: u16, len: usize },
}

/// Errors installing a program or a saved memory image.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageError {
    /// Program image does not fit in the program region.
    #[error("program size {size} exceeds available space {available}")]
    ProgramTooLarge { size: usize, available: usize },
    /// Saved memory image is not exactly 4096 bytes.
    #[error("memory image is {len} bytes, expected 4096")]
    WrongSize { len: usize },
}
