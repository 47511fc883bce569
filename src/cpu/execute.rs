//! Execution engine for the CHIP-8.
//!
//! Implements the fetch-decode-execute cycle and all instruction behaviors.

use crate::cpu::decode::{self, DecodeError, Instruction};
use crate::cpu::display::Display;
use crate::cpu::input::{InputError, Keypad};
use crate::cpu::memory::{ImageError, MemoryError, FONT_BASE, GLYPH_BYTES, PROGRAM_BASE};
use crate::cpu::registers::FLAG;
use crate::cpu::stack::{CallStack, StackError};
use crate::cpu::{Memory, Registers};
use log::{debug, trace};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// The complete machine state: memory, registers, call stack and display.
///
/// Exactly one executor mutates a `Machine`; nothing else keeps a copy of
/// any part of it.
#[derive(Clone, Serialize, Deserialize)]
pub struct Machine {
    /// CPU registers.
    pub regs: Registers,
    /// Main memory.
    pub mem: Memory,
    /// Subroutine return addresses.
    pub stack: CallStack,
    /// Display bitmap.
    pub display: Display,
    /// Instruction count.
    pub cycles: u64,
    /// Source for the random-and instruction.
    #[serde(skip, default = "entropy_rng")]
    rng: StdRng,
    /// Last executed instruction.
    last_instr: Option<Instruction>,
}

impl Machine {
    /// Create a machine with zeroed state and PC at the program base.
    pub fn new() -> Self {
        Self::with_rng(entropy_rng())
    }

    /// Create a machine whose random numbers are reproducible.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            regs: Registers::new(),
            mem: Memory::new(),
            stack: CallStack::new(),
            display: Display::new(),
            cycles: 0,
            rng,
            last_instr: None,
        }
    }

    /// Reset to the power-on state. The loaded program is discarded.
    pub fn reset(&mut self) {
        self.regs.reset();
        self.mem.clear();
        self.stack.clear();
        self.display.clear();
        self.cycles = 0;
        self.last_instr = None;
    }

    /// Install the font and copy a program image to the program base.
    pub fn load_program(&mut self, program: &[u8]) -> Result<(), ImageError> {
        self.mem.load_font();
        self.mem.load_program(program)?;
        debug!("loaded {} byte program at {:#05x}", program.len(), PROGRAM_BASE);
        Ok(())
    }

    /// Fetch the instruction word at PC.
    pub fn fetch(&self) -> Result<u16, Fault> {
        Ok(self.mem.read_word(self.regs.pc)?)
    }

    /// Execute a single instruction.
    ///
    /// Returns the instruction that was executed. On a fault PC still
    /// points at the offending instruction.
    pub fn step(&mut self, keypad: &mut dyn Keypad) -> Result<Instruction, Fault> {
        let pc = self.regs.pc;

        match self.cycle(keypad) {
            Ok(instr) => {
                self.cycles += 1;
                self.last_instr = Some(instr);
                Ok(instr)
            }
            Err(fault) => {
                self.regs.jump(pc);
                debug!("fault at {:#05x}: {}", pc, fault);
                Err(fault)
            }
        }
    }

    fn cycle(&mut self, keypad: &mut dyn Keypad) -> Result<Instruction, Fault> {
        let pc = self.regs.pc;
        let word = self.fetch()?;
        let instr = decode::decode(word)?;
        trace!("{:#05x}: {:04x}  {}", pc, word, instr);

        // jumps overwrite this, skips add to it
        self.regs.advance_pc();
        self.execute(instr, keypad)?;
        Ok(instr)
    }

    /// Run for at most `max_cycles` instructions.
    ///
    /// Returns the number executed, or the first fault.
    pub fn run_limited(&mut self, keypad: &mut dyn Keypad, max_cycles: u64) -> Result<u64, Fault> {
        let mut executed = 0;

        while executed < max_cycles {
            self.step(keypad)?;
            executed += 1;
        }

        Ok(executed)
    }

    /// Count both timers down by one. Called at 60 Hz by the driver.
    pub fn tick_timers(&mut self) {
        self.regs.delay_timer = self.regs.delay_timer.saturating_sub(1);
        self.regs.sound_timer = self.regs.sound_timer.saturating_sub(1);
    }

    /// Whether the buzzer should be sounding.
    pub fn sound_active(&self) -> bool {
        self.regs.sound_timer > 0
    }

    /// Get the last executed instruction.
    pub fn last_instruction(&self) -> Option<Instruction> {
        self.last_instr
    }

    /// Execute a decoded instruction. PC already points past it.
    fn execute(&mut self, instr: Instruction, keypad: &mut dyn Keypad) -> Result<(), Fault> {
        let regs = &mut self.regs;

        match instr {
            // ==================== Flow ====================

            Instruction::Cls => {
                self.display.clear();
            }

            Instruction::Ret => {
                let addr = self.stack.pop()?;
                regs.jump(addr);
            }

            Instruction::Jump { addr } => {
                regs.jump(addr);
            }

            Instruction::Call { addr } => {
                self.stack.push(regs.pc)?;
                regs.jump(addr);
            }

            Instruction::JumpOffset { addr } => {
                let target = addr + u16::from(regs.get(0));
                regs.jump(target);
            }

            // ==================== Skips ====================

            Instruction::SkipEqImm { x, byte } => {
                regs.skip_if(regs.get(x) == byte);
            }

            Instruction::SkipNeImm { x, byte } => {
                regs.skip_if(regs.get(x) != byte);
            }

            Instruction::SkipEqReg { x, y } => {
                regs.skip_if(regs.get(x) == regs.get(y));
            }

            Instruction::SkipNeReg { x, y } => {
                regs.skip_if(regs.get(x) != regs.get(y));
            }

            Instruction::SkipKeyPressed { x } => {
                regs.skip_if(keypad.is_pressed(regs.get(x)));
            }

            Instruction::SkipKeyNotPressed { x } => {
                regs.skip_if(!keypad.is_pressed(regs.get(x)));
            }

            // ==================== Immediates ====================

            Instruction::LoadImm { x, byte } => {
                regs.set(x, byte);
            }

            Instruction::AddImm { x, byte } => {
                regs.set(x, regs.get(x).wrapping_add(byte));
            }

            Instruction::Random { x, byte } => {
                let value: u8 = self.rng.gen();
                regs.set(x, value & byte);
            }

            // ==================== Register ALU ====================

            Instruction::Move { x, y } => {
                regs.set(x, regs.get(y));
            }

            Instruction::Or { x, y } => {
                regs.set(x, regs.get(x) | regs.get(y));
            }

            Instruction::And { x, y } => {
                regs.set(x, regs.get(x) & regs.get(y));
            }

            Instruction::Xor { x, y } => {
                regs.set(x, regs.get(x) ^ regs.get(y));
            }

            Instruction::AddReg { x, y } => {
                let sum = u16::from(regs.get(x)) + u16::from(regs.get(y));
                regs.set(x, sum as u8);
                regs.set_flag(sum > 0xFF);
            }

            Instruction::Sub { x, y } => {
                let (a, b) = (regs.get(x), regs.get(y));
                regs.set(x, a.wrapping_sub(b));
                regs.set_flag(b <= a);
            }

            Instruction::SubReverse { x, y } => {
                let (a, b) = (regs.get(x), regs.get(y));
                regs.set(x, b.wrapping_sub(a));
                regs.set_flag(a <= b);
            }

            Instruction::ShiftRight { x, .. } => {
                let value = regs.get(x);
                regs.set(x, value >> 1);
                regs.v[FLAG] = value & 0x01;
            }

            Instruction::ShiftLeft { x, .. } => {
                let value = regs.get(x);
                regs.set(x, value << 1);
                regs.v[FLAG] = value >> 7;
            }

            // ==================== Index & memory ====================

            Instruction::LoadIndex { addr } => {
                regs.set_index(addr);
            }

            Instruction::AddIndex { x } => {
                regs.set_index(regs.index + u16::from(regs.get(x)));
            }

            Instruction::FontGlyph { x } => {
                let glyph = u16::from(regs.get(x) & 0x0F);
                regs.set_index(FONT_BASE + glyph * GLYPH_BYTES);
            }

            Instruction::StoreBcd { x } => {
                let value = regs.get(x);
                self.mem
                    .slice_mut(regs.index, 3)?
                    .copy_from_slice(&[value / 100, value / 10 % 10, value % 10]);
            }

            Instruction::StoreRegs { x } => {
                let count = x as usize + 1;
                self.mem
                    .slice_mut(regs.index, count)?
                    .copy_from_slice(&regs.v[..count]);
            }

            Instruction::LoadRegs { x } => {
                let count = x as usize + 1;
                let src = self.mem.slice(regs.index, count)?;
                regs.v[..count].copy_from_slice(src);
            }

            // ==================== Display ====================

            Instruction::Draw { x, y, height } => {
                let sprite = self.mem.slice(regs.index, height as usize)?;
                let hit = self.display.draw_sprite(regs.get(x), regs.get(y), sprite);
                regs.set_flag(hit);
            }

            // ==================== Timers & input ====================

            Instruction::GetDelay { x } => {
                regs.set(x, regs.delay_timer);
            }

            Instruction::SetDelay { x } => {
                regs.delay_timer = regs.get(x);
            }

            Instruction::SetSound { x } => {
                regs.sound_timer = regs.get(x);
            }

            Instruction::WaitKey { x } => {
                // nothing is written until a key is actually in hand
                let key = keypad.wait_key()?;
                regs.set(x, key);
            }
        }

        Ok(())
    }
}

fn entropy_rng() -> StdRng {
    StdRng::from_entropy()
}

/// Fetch, decode and execute exactly one instruction.
pub fn execute_one(machine: &mut Machine, keypad: &mut dyn Keypad) -> Result<(), Fault> {
    machine.step(keypad).map(|_| ())
}

/// Composite `sprite` onto the machine's display at (x, y) and set VF to
/// the collision result, which is also returned.
pub fn composite_sprite(machine: &mut Machine, x: u8, y: u8, sprite: &[u8]) -> bool {
    let hit = machine.display.draw_sprite(x, y, sprite);
    machine.regs.set_flag(hit);
    hit
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Machine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Machine")
            .field("cycles", &self.cycles)
            .field("regs", &self.regs)
            .field("stack", &self.stack)
            .field("display", &self.display)
            .finish()
    }
}

/// Errors that stop execution of an instruction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Fault {
    #[error("memory access of {len} byte(s) at {addr:#05x} out of bounds")]
    MemoryOutOfBounds { addr: u16, len: usize },

    #[error("call stack overflow")]
    StackOverflow,

    #[error("return with empty call stack")]
    StackUnderflow,

    #[error("input source error: {0}")]
    InputSource(#[from] InputError),

    #[error("unknown opcode: {0:#06x}")]
    UnknownOpcode(u16),
}

impl From<MemoryError> for Fault {
    fn from(err: MemoryError) -> Self {
        let MemoryError::OutOfBounds { addr, len } = err;
        Fault::MemoryOutOfBounds { addr, len }
    }
}

impl From<StackError> for Fault {
    fn from(err: StackError) -> Self {
        match err {
            StackError::Overflow => Fault::StackOverflow,
            StackError::Underflow => Fault::StackUnderflow,
        }
    }
}

impl From<DecodeError> for Fault {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::UnknownOpcode(word) => Fault::UnknownOpcode(word),
        }
    }
}
