//! Bounded call stack of return addresses.

use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Maximum nesting depth of subroutine calls.
pub const STACK_LIMIT: usize = 16;

/// LIFO of return addresses, at most [`STACK_LIMIT`] deep.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallStack {
    frames: Vec<u16>,
}

impl CallStack {
    pub fn new() -> Self {
        Self {
            frames: Vec::with_capacity(STACK_LIMIT),
        }
    }

    /// Push a return address. A full stack is left untouched.
    pub fn push(&mut self, addr: u16) -> Result<(), StackError> {
        if self.frames.len() >= STACK_LIMIT {
            return Err(StackError::Overflow);
        }
        self.frames.push(addr);
        Ok(())
    }

    /// Pop the most recent return address.
    pub fn pop(&mut self) -> Result<u16, StackError> {
        self.frames.pop().ok_or(StackError::Underflow)
    }

    pub fn peek(&self) -> Option<u16> {
        self.frames.last().copied()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StackError {
    #[error("call stack overflow (limit {STACK_LIMIT})")]
    Overflow,

    #[error("return with empty call stack")]
    Underflow,
}
