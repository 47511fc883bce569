//! CPU emulation for the CHIP-8.
//!
//! This module implements the complete interpreter core:
//! - 4 KiB byte-addressable memory with the hex font at 0x000
//! - 16 general registers V0-VF, index register I, two timers
//! - 16-deep call stack
//! - 64x32 monochrome display with XOR sprite compositing
//! - 34-instruction base set, decoded from 16-bit words

pub mod memory;
pub mod registers;
pub mod stack;
pub mod display;
pub mod input;
pub mod decode;
pub mod execute;

pub use memory::{ImageError, Memory, MemoryError};
pub use registers::Registers;
pub use stack::{CallStack, StackError};
pub use display::Display;
pub use input::{ChannelKeypad, InputError, KeySender, Keypad};
pub use decode::{Instruction, DecodeError};
pub use execute::{Machine, Fault, execute_one, composite_sprite};
