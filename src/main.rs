//! CHIP-8 Emulator - CLI Entry Point
//!
//! Commands:
//! - `chip8-emu run <rom>` - Run headless, keys typed on stdin as hex digits
//! - `chip8-emu play <rom>` - Run in the terminal with keyboard input

use clap::{Parser, Subcommand};
use log::LevelFilter;
use simple_logger::SimpleLogger;

use chip8::driver::DEFAULT_CYCLES_PER_FRAME;

#[derive(Parser)]
#[command(name = "chip8-emu")]
#[command(author = "Yigit")]
#[command(version = "0.1.0")]
#[command(about = "A CHIP-8 interpreter")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a ROM headless for a fixed number of instructions
    Run {
        /// Path to the ROM image
        rom: String,
        /// Maximum number of instructions to run (default: 10000)
        #[arg(short, long, default_value = "10000")]
        max_cycles: u64,
        /// Instructions executed per 60 Hz timer tick
        #[arg(short, long, default_value_t = DEFAULT_CYCLES_PER_FRAME)]
        cycles_per_frame: u32,
        /// Seed for the random number instruction
        #[arg(long)]
        seed: Option<u64>,
        /// Write the final machine state as JSON
        #[arg(long)]
        dump_state: Option<String>,
        /// Log every executed instruction
        #[arg(short, long)]
        trace: bool,
        /// Log loads, key waits and faults
        #[arg(short, long)]
        verbose: bool,
    },
    /// Play a ROM in the terminal
    #[cfg(feature = "tui")]
    Play {
        /// Path to the ROM image
        rom: String,
        /// Instructions executed per 60 Hz frame
        #[arg(short, long, default_value_t = DEFAULT_CYCLES_PER_FRAME)]
        cycles_per_frame: u32,
        /// Seed for the random number instruction
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Run { rom, max_cycles, cycles_per_frame, seed, dump_state, trace, verbose }) => {
            init_logging(trace, verbose);
            run_program(&rom, max_cycles, cycles_per_frame, seed, dump_state.as_deref());
        }
        #[cfg(feature = "tui")]
        Some(Commands::Play { rom, cycles_per_frame, seed }) => {
            play_program(&rom, cycles_per_frame, seed);
        }
        None => {
            println!("CHIP-8 Emulator v0.1.0");
            println!();
            println!("Use --help for available commands");
        }
    }
}

fn init_logging(trace: bool, verbose: bool) {
    let level = if trace {
        LevelFilter::Trace
    } else if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    if let Err(e) = SimpleLogger::new().with_level(level).init() {
        eprintln!("⚠️  Failed to initialise logging: {}", e);
    }
}

fn load_or_exit(path: &str) -> Vec<u8> {
    match chip8::load_rom(path) {
        Ok(rom) => {
            println!("📂 Loaded {} bytes", rom.len());
            rom
        }
        Err(e) => {
            eprintln!("❌ Failed to load ROM: {}", e);
            std::process::exit(1);
        }
    }
}

fn run_program(path: &str, max_cycles: u64, cycles_per_frame: u32, seed: Option<u64>, dump_state: Option<&str>) {
    use chip8::{ChannelKeypad, Driver, Machine};

    println!("🔧 Running: {}", path);
    let rom = load_or_exit(path);

    let mut machine = seed.map_or_else(Machine::new, Machine::with_seed);
    if let Err(e) = machine.load_program(&rom) {
        eprintln!("❌ Failed to load program: {}", e);
        std::process::exit(1);
    }

    let (keypad, keys) = ChannelKeypad::new();
    spawn_stdin_reader(keys);

    let mut driver = Driver::new(machine, keypad, cycles_per_frame);
    let outcome = driver.run_unpaced(max_cycles);
    let machine = driver.into_machine();

    println!();
    println!("━━━ Display ━━━");
    print!("{}", render_ascii(&machine.display));

    println!();
    println!("━━━ Result ━━━");
    println!("Cycles: {}", machine.cycles);
    println!("PC: {:#05x}   I: {:#05x}", machine.regs.pc, machine.regs.index);
    for (i, chunk) in machine.regs.v.chunks(8).enumerate() {
        let regs: Vec<String> = chunk
            .iter()
            .enumerate()
            .map(|(j, v)| format!("V{:X}={:02x}", i * 8 + j, v))
            .collect();
        println!("{}", regs.join(" "));
    }
    println!("DT: {}   ST: {}   Stack depth: {}", machine.regs.delay_timer, machine.regs.sound_timer, machine.stack.len());

    if let Some(out) = dump_state {
        match serde_json::to_string_pretty(&machine) {
            Ok(json) => match std::fs::write(out, json) {
                Ok(()) => println!("✓ State written to {}", out),
                Err(e) => eprintln!("❌ Failed to write state: {}", e),
            },
            Err(e) => eprintln!("❌ Failed to serialise state: {}", e),
        }
    }

    if let Err(fault) = outcome {
        eprintln!("❌ Fault at PC={:#05x}: {}", machine.regs.pc, fault);
        std::process::exit(1);
    }
}

/// Feed hex digits typed on stdin to the keypad, one press per digit.
///
/// Closing stdin disconnects the keypad, so a pending key wait faults
/// instead of hanging.
fn spawn_stdin_reader(keys: chip8::KeySender) {
    use chip8::cpu::input::key_from_hex_digit;
    use std::io::BufRead;

    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else {
                break;
            };
            for key in line.chars().filter_map(key_from_hex_digit) {
                if keys.tap(key).is_err() {
                    return;
                }
            }
        }
    });
}

fn render_ascii(display: &chip8::Display) -> String {
    use chip8::cpu::display::{HEIGHT, WIDTH};

    let mut out = String::with_capacity((WIDTH + 1) * HEIGHT);
    for y in 0..HEIGHT {
        out.extend((0..WIDTH).map(|x| if display.pixel(x, y) { '█' } else { '·' }));
        out.push('\n');
    }
    out
}

#[cfg(feature = "tui")]
fn play_program(path: &str, cycles_per_frame: u32, seed: Option<u64>) {
    let rom = load_or_exit(path);

    if let Err(e) = chip8::run_presenter(rom, cycles_per_frame, seed) {
        eprintln!("❌ Presenter error: {}", e);
        std::process::exit(1);
    }
}
