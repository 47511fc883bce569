//! CHIP-8 registers.
//!
//! - V0-VF: sixteen 8-bit general registers; VF doubles as the
//!   carry/borrow/collision flag
//! - I: 12-bit index register
//! - PC: program counter
//! - DT/ST: delay and sound timers

use crate::cpu::memory::PROGRAM_BASE;
use serde::{Serialize, Deserialize};

/// Number of general registers.
pub const REGISTER_COUNT: usize = 16;

/// Index of the flag register VF.
pub const FLAG: usize = 0xF;

/// Mask applied to the index register after every update.
pub const INDEX_MASK: u16 = 0x0FFF;

/// Width of one instruction in bytes.
pub const INSTRUCTION_BYTES: u16 = 2;

/// The CHIP-8 register file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registers {
    /// V0-VF general registers.
    pub v: [u8; REGISTER_COUNT],

    /// I: index register, always within 0x000-0xFFF.
    pub index: u16,

    /// PC: byte offset of the next instruction.
    pub pc: u16,

    /// DT: delay timer.
    pub delay_timer: u8,

    /// ST: sound timer.
    pub sound_timer: u8,
}

impl Registers {
    /// Create a register file with everything zeroed except PC, which
    /// points at the program base.
    pub fn new() -> Self {
        Self {
            v: [0; REGISTER_COUNT],
            index: 0,
            pc: PROGRAM_BASE,
            delay_timer: 0,
            sound_timer: 0,
        }
    }

    /// Reset to the power-on state.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Read register Vr.
    pub fn get(&self, r: u8) -> u8 {
        self.v[r as usize & 0xF]
    }

    /// Write register Vr.
    pub fn set(&mut self, r: u8, value: u8) {
        self.v[r as usize & 0xF] = value;
    }

    /// Read VF.
    pub fn flag(&self) -> u8 {
        self.v[FLAG]
    }

    /// Write VF.
    pub fn set_flag(&mut self, value: bool) {
        self.v[FLAG] = value as u8;
    }

    /// Set the index register, masked to 12 bits.
    pub fn set_index(&mut self, value: u16) {
        self.index = value & INDEX_MASK;
    }

    /// Step the program counter past one instruction.
    /// Returns the old value.
    pub fn advance_pc(&mut self) -> u16 {
        let old = self.pc;
        self.pc = self.pc.wrapping_add(INSTRUCTION_BYTES);
        old
    }

    /// Skip the next instruction when `condition` holds.
    pub fn skip_if(&mut self, condition: bool) {
        if condition {
            self.advance_pc();
        }
    }

    /// Set the program counter to an absolute address.
    pub fn jump(&mut self, addr: u16) {
        self.pc = addr;
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}
