//! Presenter application state and event loop.

use crate::cpu::{ChannelKeypad, Fault, KeySender, Machine};
use crate::cpu::input::KEY_COUNT;
use crate::driver::{Driver, Frame};
use crossterm::event::KeyCode;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// How long a key counts as held after a press is reported.
/// Most terminals never report the release.
const HOLD_TIME: Duration = Duration::from_millis(150);

/// Map a keyboard key onto the hex keypad, using the conventional layout:
///
/// ```text
///   1 2 3 4      1 2 3 C
///   Q W E R  ->  4 5 6 D
///   A S D F      7 8 9 E
///   Z X C V      A 0 B F
/// ```
pub fn map_key(code: KeyCode) -> Option<u8> {
    let KeyCode::Char(c) = code else {
        return None;
    };
    let key = match c.to_ascii_lowercase() {
        '1' => 0x1,
        '2' => 0x2,
        '3' => 0x3,
        '4' => 0xC,
        'q' => 0x4,
        'w' => 0x5,
        'e' => 0x6,
        'r' => 0xD,
        'a' => 0x7,
        's' => 0x8,
        'd' => 0x9,
        'f' => 0xE,
        'z' => 0xA,
        'x' => 0x0,
        'c' => 0xB,
        'v' => 0xF,
        _ => return None,
    };
    Some(key)
}

/// Presenter application state.
pub struct PresenterApp {
    /// Most recent snapshot from the interpreter.
    pub frame: Frame,
    /// Status message to display.
    pub status: String,
    /// Has the interpreter stopped?
    pub halted: bool,
    /// Should we quit?
    pub should_quit: bool,
    keys: KeySender,
    held_until: [Option<Instant>; KEY_COUNT as usize],
}

impl PresenterApp {
    pub fn new(keys: KeySender) -> Self {
        Self {
            frame: Frame {
                display: Default::default(),
                sound: false,
                pc: 0,
                cycles: 0,
            },
            status: "Running. Press Esc to quit.".into(),
            halted: false,
            should_quit: false,
            keys,
            held_until: [None; KEY_COUNT as usize],
        }
    }

    /// A key went down.
    pub fn key_down(&mut self, key: u8, now: Instant) {
        if let Err(e) = self.keys.press(key) {
            self.status = format!("Input error: {}", e);
            return;
        }
        self.held_until[key as usize] = Some(now + HOLD_TIME);
    }

    /// A key went up, for terminals that report it.
    pub fn key_up(&mut self, key: u8) {
        let _ = self.keys.release(key);
        self.held_until[key as usize] = None;
    }

    /// Release keys whose hold time has run out.
    pub fn release_expired(&mut self, now: Instant) {
        for key in 0..KEY_COUNT {
            if matches!(self.held_until[key as usize], Some(until) if until <= now) {
                self.key_up(key);
            }
        }
    }

    /// Take a new snapshot from the interpreter.
    pub fn show(&mut self, frame: Frame) {
        self.frame = frame;
    }

    /// The interpreter thread finished.
    pub fn halt(&mut self, outcome: std::thread::Result<Result<(), Fault>>) {
        self.halted = true;
        self.status = match outcome {
            Ok(Ok(())) => "Stopped. Press Esc to quit.".into(),
            Ok(Err(fault)) => format!("Halted at PC={:#05x}: {}. Press Esc to quit.", self.frame.pc, fault),
            Err(_) => "Interpreter thread panicked. Press Esc to quit.".into(),
        };
    }
}

/// Run a program in the terminal until the user quits.
pub fn run_presenter(program: Vec<u8>, cycles_per_frame: u32, seed: Option<u64>) -> io::Result<()> {
    use crossterm::{
        event::{self, Event, KeyEventKind},
        terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
        ExecutableCommand,
    };
    use ratatui::prelude::*;
    use std::io::stdout;

    let mut machine = seed.map_or_else(Machine::new, Machine::with_seed);
    machine
        .load_program(&program)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    // The interpreter thread owns the machine; we only see snapshots
    let (keypad, keys) = ChannelKeypad::new();
    let (frames_tx, frames_rx) = mpsc::sync_channel(1);
    let stop = Arc::new(AtomicBool::new(false));
    let mut worker: Option<JoinHandle<Result<(), Fault>>> = Some({
        let stop = Arc::clone(&stop);
        thread::spawn(move || {
            let mut driver = Driver::new(machine, keypad, cycles_per_frame);
            driver.run_paced(frames_tx, &stop)
        })
    });

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut app = PresenterApp::new(keys);

    // Main loop
    let result = loop {
        // Drain snapshots
        loop {
            match frames_rx.try_recv() {
                Ok(frame) => app.show(frame),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if let Some(handle) = worker.take() {
                        app.halt(handle.join());
                    }
                    break;
                }
            }
        }

        // Draw
        if let Err(e) = terminal.draw(|frame| super::ui::draw(frame, &app)) {
            break Err(e);
        }

        // Handle input
        match event::poll(Duration::from_millis(10)) {
            Ok(true) => match event::read() {
                Ok(Event::Key(key)) => {
                    if key.code == KeyCode::Esc {
                        app.should_quit = true;
                    } else if let Some(k) = map_key(key.code) {
                        match key.kind {
                            KeyEventKind::Press | KeyEventKind::Repeat => app.key_down(k, Instant::now()),
                            KeyEventKind::Release => app.key_up(k),
                        }
                    }
                }
                Ok(_) => {}
                Err(e) => break Err(e),
            },
            Ok(false) => {}
            Err(e) => break Err(e),
        }

        app.release_expired(Instant::now());

        if app.should_quit {
            break Ok(());
        }
    };

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    // Dropping the key sender unblocks a pending key wait
    stop.store(true, Ordering::Release);
    drop(app);
    drop(frames_rx);
    if let Some(handle) = worker.take() {
        let _ = handle.join();
    }

    result
}
