//! Instruction decoder for the CHIP-8.
//!
//! Every instruction is one big-endian 16-bit word. The top nibble picks
//! one of sixteen groups; groups 0x0, 0x8, 0xE and 0xF carry a secondary
//! discriminator in the low nibble or low byte. The remaining nibbles
//! conventionally hold X, Y and an immediate:
//!
//! ```text
//!   15..12  11..8  7..4  3..0
//!   group     X     Y     N
//!                   \-kk--/
//!           \-----nnn-----/
//! ```

use serde::{Serialize, Deserialize};
use std::fmt;
use thiserror::Error;

/// Decoded CHIP-8 instruction.
///
/// Register operands are indices 0x0-0xF into the V register bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
    // ==================== Flow ====================

    /// 00E0: clear the display
    Cls,

    /// 00EE: return from subroutine
    Ret,

    /// 1nnn: PC := nnn
    Jump { addr: u16 },

    /// 2nnn: push return address, PC := nnn
    Call { addr: u16 },

    /// Bnnn: PC := nnn + V0
    JumpOffset { addr: u16 },

    // ==================== Skips ====================

    /// 3xkk: skip if Vx == kk
    SkipEqImm { x: u8, byte: u8 },

    /// 4xkk: skip if Vx != kk
    SkipNeImm { x: u8, byte: u8 },

    /// 5xy0: skip if Vx == Vy
    SkipEqReg { x: u8, y: u8 },

    /// 9xy0: skip if Vx != Vy
    SkipNeReg { x: u8, y: u8 },

    /// Ex9E: skip if key Vx is held
    SkipKeyPressed { x: u8 },

    /// ExA1: skip if key Vx is not held
    SkipKeyNotPressed { x: u8 },

    // ==================== Immediates ====================

    /// 6xkk: Vx := kk
    LoadImm { x: u8, byte: u8 },

    /// 7xkk: Vx := Vx + kk, no carry
    AddImm { x: u8, byte: u8 },

    /// Cxkk: Vx := random & kk
    Random { x: u8, byte: u8 },

    // ==================== Register ALU ====================

    /// 8xy0: Vx := Vy
    Move { x: u8, y: u8 },

    /// 8xy1: Vx := Vx | Vy
    Or { x: u8, y: u8 },

    /// 8xy2: Vx := Vx & Vy
    And { x: u8, y: u8 },

    /// 8xy3: Vx := Vx ^ Vy
    Xor { x: u8, y: u8 },

    /// 8xy4: Vx := Vx + Vy, VF := carry
    AddReg { x: u8, y: u8 },

    /// 8xy5: Vx := Vx - Vy, VF := not borrow
    Sub { x: u8, y: u8 },

    /// 8xy6: VF := low bit of Vx, Vx >>= 1
    ShiftRight { x: u8, y: u8 },

    /// 8xy7: Vx := Vy - Vx, VF := not borrow
    SubReverse { x: u8, y: u8 },

    /// 8xyE: VF := high bit of Vx, Vx <<= 1
    ShiftLeft { x: u8, y: u8 },

    // ==================== Index & memory ====================

    /// Annn: I := nnn
    LoadIndex { addr: u16 },

    /// Fx1E: I := (I + Vx) & 0xFFF
    AddIndex { x: u8 },

    /// Fx29: I := address of glyph for low nibble of Vx
    FontGlyph { x: u8 },

    /// Fx33: BCD of Vx at I, I+1, I+2
    StoreBcd { x: u8 },

    /// Fx55: store V0..=Vx at I
    StoreRegs { x: u8 },

    /// Fx65: load V0..=Vx from I
    LoadRegs { x: u8 },

    // ==================== Display ====================

    /// Dxyn: draw n-byte sprite from I at (Vx, Vy), VF := collision
    Draw { x: u8, y: u8, height: u8 },

    // ==================== Timers & input ====================

    /// Fx07: Vx := DT
    GetDelay { x: u8 },

    /// Fx0A: block until a key arrives, Vx := key
    WaitKey { x: u8 },

    /// Fx15: DT := Vx
    SetDelay { x: u8 },

    /// Fx18: ST := Vx
    SetSound { x: u8 },
}

/// Raw operand fields of an instruction word.
#[derive(Debug, Clone, Copy)]
struct Fields {
    group: u8,
    x: u8,
    y: u8,
    n: u8,
    kk: u8,
    nnn: u16,
}

impl Fields {
    fn split(word: u16) -> Self {
        Self {
            group: (word >> 12) as u8,
            x: (word >> 8 & 0xF) as u8,
            y: (word >> 4 & 0xF) as u8,
            n: (word & 0xF) as u8,
            kk: (word & 0xFF) as u8,
            nnn: word & 0x0FFF,
        }
    }
}

/// Decode one instruction word.
pub fn decode(word: u16) -> Result<Instruction, DecodeError> {
    let Fields { group, x, y, n, kk, nnn } = Fields::split(word);

    let instruction = match (group, n) {
        (0x0, _) => match word {
            0x00E0 => Instruction::Cls,
            0x00EE => Instruction::Ret,
            _ => return Err(DecodeError::UnknownOpcode(word)),
        },
        (0x1, _) => Instruction::Jump { addr: nnn },
        (0x2, _) => Instruction::Call { addr: nnn },
        (0x3, _) => Instruction::SkipEqImm { x, byte: kk },
        (0x4, _) => Instruction::SkipNeImm { x, byte: kk },
        (0x5, 0x0) => Instruction::SkipEqReg { x, y },
        (0x6, _) => Instruction::LoadImm { x, byte: kk },
        (0x7, _) => Instruction::AddImm { x, byte: kk },
        (0x8, 0x0) => Instruction::Move { x, y },
        (0x8, 0x1) => Instruction::Or { x, y },
        (0x8, 0x2) => Instruction::And { x, y },
        (0x8, 0x3) => Instruction::Xor { x, y },
        (0x8, 0x4) => Instruction::AddReg { x, y },
        (0x8, 0x5) => Instruction::Sub { x, y },
        (0x8, 0x6) => Instruction::ShiftRight { x, y },
        (0x8, 0x7) => Instruction::SubReverse { x, y },
        (0x8, 0xE) => Instruction::ShiftLeft { x, y },
        (0x9, 0x0) => Instruction::SkipNeReg { x, y },
        (0xA, _) => Instruction::LoadIndex { addr: nnn },
        (0xB, _) => Instruction::JumpOffset { addr: nnn },
        (0xC, _) => Instruction::Random { x, byte: kk },
        (0xD, _) => Instruction::Draw { x, y, height: n },
        (0xE, _) => match kk {
            0x9E => Instruction::SkipKeyPressed { x },
            0xA1 => Instruction::SkipKeyNotPressed { x },
            _ => return Err(DecodeError::UnknownOpcode(word)),
        },
        (0xF, _) => match kk {
            0x07 => Instruction::GetDelay { x },
            0x0A => Instruction::WaitKey { x },
            0x15 => Instruction::SetDelay { x },
            0x18 => Instruction::SetSound { x },
            0x1E => Instruction::AddIndex { x },
            0x29 => Instruction::FontGlyph { x },
            0x33 => Instruction::StoreBcd { x },
            0x55 => Instruction::StoreRegs { x },
            0x65 => Instruction::LoadRegs { x },
            _ => return Err(DecodeError::UnknownOpcode(word)),
        },
        _ => return Err(DecodeError::UnknownOpcode(word)),
    };

    Ok(instruction)
}

/// Encode an instruction back to its 16-bit word.
///
/// Operands wider than their field are truncated to fit.
pub fn encode(instr: &Instruction) -> u16 {
    fn xy(group: u16, x: u8, y: u8, n: u16) -> u16 {
        group << 12 | (x as u16 & 0xF) << 8 | (y as u16 & 0xF) << 4 | n
    }
    fn xkk(group: u16, x: u8, kk: u8) -> u16 {
        group << 12 | (x as u16 & 0xF) << 8 | kk as u16
    }
    fn nnn(group: u16, addr: u16) -> u16 {
        group << 12 | addr & 0x0FFF
    }

    match *instr {
        Instruction::Cls => 0x00E0,
        Instruction::Ret => 0x00EE,
        Instruction::Jump { addr } => nnn(0x1, addr),
        Instruction::Call { addr } => nnn(0x2, addr),
        Instruction::SkipEqImm { x, byte } => xkk(0x3, x, byte),
        Instruction::SkipNeImm { x, byte } => xkk(0x4, x, byte),
        Instruction::SkipEqReg { x, y } => xy(0x5, x, y, 0x0),
        Instruction::LoadImm { x, byte } => xkk(0x6, x, byte),
        Instruction::AddImm { x, byte } => xkk(0x7, x, byte),
        Instruction::Move { x, y } => xy(0x8, x, y, 0x0),
        Instruction::Or { x, y } => xy(0x8, x, y, 0x1),
        Instruction::And { x, y } => xy(0x8, x, y, 0x2),
        Instruction::Xor { x, y } => xy(0x8, x, y, 0x3),
        Instruction::AddReg { x, y } => xy(0x8, x, y, 0x4),
        Instruction::Sub { x, y } => xy(0x8, x, y, 0x5),
        Instruction::ShiftRight { x, y } => xy(0x8, x, y, 0x6),
        Instruction::SubReverse { x, y } => xy(0x8, x, y, 0x7),
        Instruction::ShiftLeft { x, y } => xy(0x8, x, y, 0xE),
        Instruction::SkipNeReg { x, y } => xy(0x9, x, y, 0x0),
        Instruction::LoadIndex { addr } => nnn(0xA, addr),
        Instruction::JumpOffset { addr } => nnn(0xB, addr),
        Instruction::Random { x, byte } => xkk(0xC, x, byte),
        Instruction::Draw { x, y, height } => xy(0xD, x, y, height as u16 & 0xF),
        Instruction::SkipKeyPressed { x } => xkk(0xE, x, 0x9E),
        Instruction::SkipKeyNotPressed { x } => xkk(0xE, x, 0xA1),
        Instruction::GetDelay { x } => xkk(0xF, x, 0x07),
        Instruction::WaitKey { x } => xkk(0xF, x, 0x0A),
        Instruction::SetDelay { x } => xkk(0xF, x, 0x15),
        Instruction::SetSound { x } => xkk(0xF, x, 0x18),
        Instruction::AddIndex { x } => xkk(0xF, x, 0x1E),
        Instruction::FontGlyph { x } => xkk(0xF, x, 0x29),
        Instruction::StoreBcd { x } => xkk(0xF, x, 0x33),
        Instruction::StoreRegs { x } => xkk(0xF, x, 0x55),
        Instruction::LoadRegs { x } => xkk(0xF, x, 0x65),
    }
}

/// Assemble a sequence of instructions into a big-endian program image.
pub fn assemble(program: &[Instruction]) -> Vec<u8> {
    program
        .iter()
        .flat_map(|i| encode(i).to_be_bytes())
        .collect()
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Instruction::Cls => write!(f, "CLS"),
            Instruction::Ret => write!(f, "RET"),
            Instruction::Jump { addr } => write!(f, "JP {:#05x}", addr),
            Instruction::Call { addr } => write!(f, "CALL {:#05x}", addr),
            Instruction::JumpOffset { addr } => write!(f, "JP V0, {:#05x}", addr),
            Instruction::SkipEqImm { x, byte } => write!(f, "SE V{:X}, {:#04x}", x, byte),
            Instruction::SkipNeImm { x, byte } => write!(f, "SNE V{:X}, {:#04x}", x, byte),
            Instruction::SkipEqReg { x, y } => write!(f, "SE V{:X}, V{:X}", x, y),
            Instruction::SkipNeReg { x, y } => write!(f, "SNE V{:X}, V{:X}", x, y),
            Instruction::SkipKeyPressed { x } => write!(f, "SKP V{:X}", x),
            Instruction::SkipKeyNotPressed { x } => write!(f, "SKNP V{:X}", x),
            Instruction::LoadImm { x, byte } => write!(f, "LD V{:X}, {:#04x}", x, byte),
            Instruction::AddImm { x, byte } => write!(f, "ADD V{:X}, {:#04x}", x, byte),
            Instruction::Random { x, byte } => write!(f, "RND V{:X}, {:#04x}", x, byte),
            Instruction::Move { x, y } => write!(f, "LD V{:X}, V{:X}", x, y),
            Instruction::Or { x, y } => write!(f, "OR V{:X}, V{:X}", x, y),
            Instruction::And { x, y } => write!(f, "AND V{:X}, V{:X}", x, y),
            Instruction::Xor { x, y } => write!(f, "XOR V{:X}, V{:X}", x, y),
            Instruction::AddReg { x, y } => write!(f, "ADD V{:X}, V{:X}", x, y),
            Instruction::Sub { x, y } => write!(f, "SUB V{:X}, V{:X}", x, y),
            Instruction::ShiftRight { x, .. } => write!(f, "SHR V{:X}", x),
            Instruction::SubReverse { x, y } => write!(f, "SUBN V{:X}, V{:X}", x, y),
            Instruction::ShiftLeft { x, .. } => write!(f, "SHL V{:X}", x),
            Instruction::LoadIndex { addr } => write!(f, "LD I, {:#05x}", addr),
            Instruction::AddIndex { x } => write!(f, "ADD I, V{:X}", x),
            Instruction::FontGlyph { x } => write!(f, "LD F, V{:X}", x),
            Instruction::StoreBcd { x } => write!(f, "LD B, V{:X}", x),
            Instruction::StoreRegs { x } => write!(f, "LD [I], V{:X}", x),
            Instruction::LoadRegs { x } => write!(f, "LD V{:X}, [I]", x),
            Instruction::Draw { x, y, height } => write!(f, "DRW V{:X}, V{:X}, {}", x, y, height),
            Instruction::GetDelay { x } => write!(f, "LD V{:X}, DT", x),
            Instruction::WaitKey { x } => write!(f, "LD V{:X}, K", x),
            Instruction::SetDelay { x } => write!(f, "LD DT, V{:X}", x),
            Instruction::SetSound { x } => write!(f, "LD ST, V{:X}", x),
        }
    }
}

/// Errors that can occur during instruction decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unknown opcode: {0:#06x}")]
    UnknownOpcode(u16),
}
