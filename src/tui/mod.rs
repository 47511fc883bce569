//! Terminal presenter for the CHIP-8.
//!
//! Provides:
//! - Half-block rendering of the 64x32 display
//! - Keyboard mapping onto the 16-key hex keypad
//! - A paced interpreter thread feeding frames to the screen

mod app;
mod ui;

pub use app::{PresenterApp, map_key, run_presenter};
