//! Execution driver: runs the machine in frames and ticks the timers.
//!
//! One frame is a fixed number of instructions followed by one 60 Hz timer
//! tick. The driver owns the machine for as long as it runs; presenters
//! only ever see [`Frame`] snapshots.

use crate::cpu::{Display, Fault, Keypad, Machine};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{SyncSender, TrySendError};
use std::thread;
use std::time::{Duration, Instant};

/// Timer and presentation rate.
pub const FRAME_RATE: u32 = 60;

/// Instructions per frame unless configured otherwise (about 600 Hz).
pub const DEFAULT_CYCLES_PER_FRAME: u32 = 10;

/// What a presenter needs to draw one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub display: Display,
    pub sound: bool,
    pub pc: u16,
    pub cycles: u64,
}

/// Drives a [`Machine`] with a key source.
pub struct Driver<K: Keypad> {
    machine: Machine,
    keypad: K,
    cycles_per_frame: u32,
}

impl<K: Keypad> Driver<K> {
    pub fn new(machine: Machine, keypad: K, cycles_per_frame: u32) -> Self {
        Self {
            machine,
            keypad,
            cycles_per_frame: cycles_per_frame.max(1),
        }
    }

    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    pub fn into_machine(self) -> Machine {
        self.machine
    }

    /// Run one frame's worth of instructions, then tick the timers.
    pub fn run_frame(&mut self) -> Result<(), Fault> {
        self.machine
            .run_limited(&mut self.keypad, u64::from(self.cycles_per_frame))?;
        self.machine.tick_timers();
        Ok(())
    }

    /// Run frames until `max_cycles` instructions have executed.
    ///
    /// The last frame may overshoot by less than one frame.
    pub fn run_unpaced(&mut self, max_cycles: u64) -> Result<u64, Fault> {
        let start = self.machine.cycles;
        while self.machine.cycles - start < max_cycles {
            self.run_frame()?;
        }
        Ok(self.machine.cycles - start)
    }

    /// Snapshot for a presenter.
    pub fn frame(&self) -> Frame {
        Frame {
            display: self.machine.display.clone(),
            sound: self.machine.sound_active(),
            pc: self.machine.regs.pc,
            cycles: self.machine.cycles,
        }
    }

    /// Run at [`FRAME_RATE`] until `stop` is set or the presenter hangs up,
    /// publishing a snapshot after every frame.
    ///
    /// Snapshots are dropped while the presenter is still busy with the
    /// previous one, except the last one on a fault, which is always
    /// delivered so the presenter sees where execution stopped.
    pub fn run_paced(&mut self, frames: SyncSender<Frame>, stop: &AtomicBool) -> Result<(), Fault> {
        let period = Duration::from_secs(1) / FRAME_RATE;
        let mut deadline = Instant::now();

        while !stop.load(Ordering::Acquire) {
            if let Err(fault) = self.run_frame() {
                let _ = frames.send(self.frame());
                return Err(fault);
            }

            match frames.try_send(self.frame()) {
                Ok(()) | Err(TrySendError::Full(_)) => {}
                Err(TrySendError::Disconnected(_)) => break,
            }

            deadline += period;
            match deadline.checked_duration_since(Instant::now()) {
                Some(wait) => thread::sleep(wait),
                // running behind; don't try to catch up
                None => deadline = Instant::now(),
            }
        }

        Ok(())
    }
}
