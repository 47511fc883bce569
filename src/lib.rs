//! # CHIP-8 Emulator
//!
//! A fetch-decode-execute interpreter for the CHIP-8 virtual machine.
//!
//! The core ([`cpu`]) owns all machine state and executes one instruction at
//! a time. Loading ROM images ([`rom`]), pacing ([`driver`]) and presenting
//! the display (`tui`) sit around it as thin front ends.

pub mod cpu;
pub mod driver;
pub mod rom;

#[cfg(feature = "tui")]
pub mod tui;

// Re-export commonly used types
pub use cpu::{Machine, Fault, Instruction, Keypad, ChannelKeypad, KeySender, Display};
pub use cpu::{execute_one, composite_sprite};
pub use driver::{Driver, Frame};
pub use rom::{load_rom, RomError};

#[cfg(feature = "tui")]
pub use tui::run_presenter;
