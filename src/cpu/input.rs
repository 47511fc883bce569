//! Key-state source for the interpreter.
//!
//! The core only asks two questions of the outside world: is key K held
//! right now, and (blocking) what is the next key pressed. [`Keypad`]
//! captures both; [`ChannelKeypad`] is the stock implementation, fed by a
//! front end through a cloneable [`KeySender`].

use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use thiserror::Error;

/// Number of keys on the hex keypad (0x0-0xF).
pub const KEY_COUNT: u8 = 16;

/// Source of key state consumed by the skip-if-key and wait-for-key
/// instructions.
pub trait Keypad {
    /// Whether `key` is currently held. Codes outside 0x0-0xF are never held.
    fn is_pressed(&self, key: u8) -> bool;

    /// Block until a key press is available and consume exactly one.
    fn wait_key(&mut self) -> Result<u8, InputError>;
}

/// Keypad backed by a shared held-key bitmask and a queue of presses.
///
/// Taps queue up in order; each `wait_key` takes one and leaves the rest
/// for the next call. Live presses only reach the queue while a wait is
/// pending, and only the first press of each wait does. Only the owner of
/// the keypad can wait, so at most one read is ever outstanding.
#[derive(Debug)]
pub struct ChannelKeypad {
    held: Arc<AtomicU16>,
    waiting: Arc<AtomicBool>,
    presses: Receiver<u8>,
}

/// Front-end handle used to report key activity to a [`ChannelKeypad`].
#[derive(Debug, Clone)]
pub struct KeySender {
    held: Arc<AtomicU16>,
    waiting: Arc<AtomicBool>,
    presses: Sender<u8>,
}

impl ChannelKeypad {
    /// Create a keypad and the handle that feeds it.
    pub fn new() -> (Self, KeySender) {
        let held = Arc::new(AtomicU16::new(0));
        let waiting = Arc::new(AtomicBool::new(false));
        let (tx, rx) = mpsc::channel();
        (
            Self {
                held: Arc::clone(&held),
                waiting: Arc::clone(&waiting),
                presses: rx,
            },
            KeySender { held, waiting, presses: tx },
        )
    }

    /// Bitmask of held keys, bit K for key K.
    pub fn held_mask(&self) -> u16 {
        self.held.load(Ordering::Acquire)
    }
}

impl Keypad for ChannelKeypad {
    fn is_pressed(&self, key: u8) -> bool {
        key < KEY_COUNT && self.held_mask() & (1 << key) != 0
    }

    fn wait_key(&mut self) -> Result<u8, InputError> {
        log::debug!("waiting for key press");
        self.waiting.store(true, Ordering::Release);
        let key = self.presses.recv();
        self.waiting.store(false, Ordering::Release);

        let key = key.map_err(|_| InputError::Disconnected)?;
        log::debug!("key {:X} received", key);
        Ok(key)
    }
}

impl KeySender {
    /// Mark `key` as held. If a wait is pending and no other press has
    /// answered it yet, the press is handed to it.
    pub fn press(&self, key: u8) -> Result<(), InputError> {
        check_key(key)?;
        self.held.fetch_or(1 << key, Ordering::AcqRel);
        if self.waiting.swap(false, Ordering::AcqRel) {
            self.queue(key)?;
        }
        Ok(())
    }

    /// Mark `key` as released.
    pub fn release(&self, key: u8) -> Result<(), InputError> {
        check_key(key)?;
        self.held.fetch_and(!(1 << key), Ordering::AcqRel);
        Ok(())
    }

    /// Queue a press without changing the held state, whether or not a
    /// wait is pending.
    ///
    /// For sources that only see keystrokes, such as a line-buffered stdin.
    pub fn tap(&self, key: u8) -> Result<(), InputError> {
        check_key(key)?;
        self.queue(key)
    }

    /// Whether the interpreter is blocked waiting for a key.
    pub fn wait_pending(&self) -> bool {
        self.waiting.load(Ordering::Acquire)
    }

    fn queue(&self, key: u8) -> Result<(), InputError> {
        self.presses.send(key).map_err(|_| InputError::Disconnected)
    }
}

fn check_key(key: u8) -> Result<(), InputError> {
    if key >= KEY_COUNT {
        return Err(InputError::InvalidKey(key));
    }
    Ok(())
}

/// Map a hexadecimal digit character to its key code.
pub fn key_from_hex_digit(c: char) -> Option<u8> {
    c.to_digit(16).map(|d| d as u8)
}

/// Errors reported by a key source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("key source disconnected")]
    Disconnected,

    #[error("invalid key code {0:#04x}")]
    InvalidKey(u8),
}
