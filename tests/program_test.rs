//! End-to-end programs run through the public interpreter API.

use chip8::cpu::decode::assemble;
use chip8::cpu::stack::STACK_LIMIT;
use chip8::{execute_one, ChannelKeypad, Fault, Instruction, Machine};
use std::thread;

fn boot(program: &[Instruction]) -> Machine {
    let mut machine = Machine::with_seed(42);
    machine.load_program(&assemble(program)).unwrap();
    machine
}

#[test]
fn test_draw_score_digits() {
    // Draw the decimal digits of V0 = 137 side by side at (0, 0)
    let program = [
        Instruction::LoadImm { x: 0, byte: 137 },
        Instruction::LoadIndex { addr: 0x300 },
        Instruction::StoreBcd { x: 0 },
        Instruction::LoadRegs { x: 2 },         // V0..V2 = 1, 3, 7
        Instruction::LoadImm { x: 3, byte: 0 }, // x
        Instruction::LoadImm { x: 4, byte: 0 }, // y
        Instruction::FontGlyph { x: 0 },
        Instruction::Draw { x: 3, y: 4, height: 5 },
        Instruction::AddImm { x: 3, byte: 5 },
        Instruction::FontGlyph { x: 1 },
        Instruction::Draw { x: 3, y: 4, height: 5 },
        Instruction::AddImm { x: 3, byte: 5 },
        Instruction::FontGlyph { x: 2 },
        Instruction::Draw { x: 3, y: 4, height: 5 },
    ];
    let mut machine = boot(&program);
    let (mut keypad, _keys) = ChannelKeypad::new();

    machine.run_limited(&mut keypad, program.len() as u64).unwrap();

    assert_eq!(&machine.regs.v[..3], &[1, 3, 7]);
    assert_eq!(machine.regs.flag(), 0);
    // glyph "1" top row is 0x20: one pixel at column 2
    assert!(machine.display.pixel(2, 0));
    // glyph "7" top row is 0xF0 at columns 10..13
    for col in 10..14 {
        assert!(machine.display.pixel(col, 0));
    }
    assert!(!machine.display.pixel(14, 0));
}

#[test]
fn test_countdown_loop() {
    // V0 counts down from 5; V1 counts iterations
    let program = [
        Instruction::LoadImm { x: 0, byte: 5 },    // 0x200
        Instruction::AddImm { x: 1, byte: 1 },     // 0x202
        Instruction::AddImm { x: 0, byte: 0xFF },  // 0x204  V0 -= 1
        Instruction::SkipEqImm { x: 0, byte: 0 },  // 0x206
        Instruction::Jump { addr: 0x202 },         // 0x208
        Instruction::Jump { addr: 0x20A },         // 0x20A  halt loop
    ];
    let mut machine = boot(&program);
    let (mut keypad, _keys) = ChannelKeypad::new();

    machine.run_limited(&mut keypad, 1 + 5 * 4).unwrap();

    assert_eq!(machine.regs.get(0), 0);
    assert_eq!(machine.regs.get(1), 5);
    assert_eq!(machine.regs.pc, 0x20A);
}

#[test]
fn test_nested_calls_unwind() {
    let program = [
        Instruction::Call { addr: 0x206 },         // 0x200
        Instruction::LoadImm { x: 9, byte: 1 },    // 0x202
        Instruction::Jump { addr: 0x204 },         // 0x204
        Instruction::Call { addr: 0x20C },         // 0x206
        Instruction::AddImm { x: 8, byte: 1 },     // 0x208
        Instruction::Ret,                          // 0x20A
        Instruction::AddImm { x: 8, byte: 1 },     // 0x20C
        Instruction::Ret,                          // 0x20E
    ];
    let mut machine = boot(&program);
    let (mut keypad, _keys) = ChannelKeypad::new();

    machine.run_limited(&mut keypad, 7).unwrap();

    assert_eq!(machine.regs.get(8), 2);
    assert_eq!(machine.regs.get(9), 1);
    assert!(machine.stack.is_empty());
}

#[test]
fn test_runaway_recursion_overflows() {
    let mut machine = boot(&[Instruction::Call { addr: 0x200 }]);
    let (mut keypad, _keys) = ChannelKeypad::new();

    let result = machine.run_limited(&mut keypad, 100);

    assert_eq!(result, Err(Fault::StackOverflow));
    assert_eq!(machine.cycles, STACK_LIMIT as u64);
}

#[test]
fn test_wait_key_from_another_thread() {
    let mut machine = boot(&[
        Instruction::WaitKey { x: 3 },
        Instruction::SkipKeyPressed { x: 3 },
        Instruction::LoadImm { x: 4, byte: 0xEE },
    ]);
    let (mut keypad, keys) = ChannelKeypad::new();

    let feeder = thread::spawn(move || {
        while !keys.wait_pending() {
            thread::yield_now();
        }
        keys.press(0x7).unwrap();
        keys
    });

    execute_one(&mut machine, &mut keypad).unwrap();
    assert_eq!(machine.regs.get(3), 0x7);

    // still held, so the load is skipped
    let _keys = feeder.join().unwrap();
    execute_one(&mut machine, &mut keypad).unwrap();
    assert_eq!(machine.regs.pc, 0x206);
    assert_eq!(machine.regs.get(4), 0);
}

#[test]
fn test_state_serialises() {
    let mut machine = boot(&[
        Instruction::LoadImm { x: 0, byte: 0xAB },
        Instruction::Call { addr: 0x300 },
    ]);
    let (mut keypad, _keys) = ChannelKeypad::new();
    machine.run_limited(&mut keypad, 2).unwrap();

    let json = serde_json::to_string(&machine).unwrap();
    let restored: Machine = serde_json::from_str(&json).unwrap();

    assert_eq!(restored.regs, machine.regs);
    assert_eq!(restored.stack, machine.stack);
    assert_eq!(restored.display, machine.display);
    assert_eq!(restored.cycles, 2);
}

#[test]
fn test_truncated_memory_image_rejected() {
    let machine = Machine::with_seed(1);
    let mut state: serde_json::Value = serde_json::to_value(&machine).unwrap();
    state["mem"] = serde_json::json!([0, 0]);

    let err = serde_json::from_value::<Machine>(state).unwrap_err();
    assert!(err.to_string().contains("memory image is 2 bytes"));
}
