//! The concrete end-to-end scenarios from spec.md §8, each prefixed with a
//! Reset so `PC == 0x1000` before the program under test runs.

use mos6502::mem;
use mos6502::{Address, Memory, CPU};

const RESET_VECTOR: Address = Address::new(0xFFFC);
const START: Address = Address::new(0x1000);

fn boot<M: Memory>(mut memory: M) -> CPU<M> {
    memory.write(RESET_VECTOR, START.lower());
    memory.write(RESET_VECTOR + 1u16, START.higher());
    let mut cpu = CPU::with_memory(memory);
    cpu.end_on_break = true;
    cpu.send_reset();
    cpu.step(); // services the reset
    cpu
}

#[test]
fn lda_immediate() {
    let mut cpu = boot(mem! { START.index() as u16 => { 0xA9u8, 0xD5u8 } });
    cpu.run();
    assert_eq!(cpu.accumulator(), 0xD5);
    assert!(cpu.status().contains(mos6502::Status::NEGATIVE));
    assert!(!cpu.status().contains(mos6502::Status::ZERO));
}

#[test]
fn sta_zero_page_via_register() {
    let mut cpu = boot(mem! { START.index() as u16 => {
        0xA9u8, 0xD8u8, // LDA #$D8
        0x85u8, 0x20u8  // STA $20
    } });
    cpu.run();
    assert_eq!(cpu.memory().read(Address::new(0x0020)), 0xD8);
}

#[test]
fn zero_page_x_wraps_within_the_page() {
    let mut memory = mem! { START.index() as u16 => {
        0xA2u8, 0x10u8, // LDX #$10
        0xB5u8, 0x40u8  // LDA $40, X
    } };
    memory.write(Address::new(0x0050), 0xDE);
    let mut cpu = boot(memory);
    cpu.run();
    assert_eq!(cpu.accumulator(), 0xDE);
}

#[test]
fn x_indirect_addressing() {
    let mut memory = mem! { START.index() as u16 => {
        0xA2u8, 0x20u8, // LDX #$20
        0xA1u8, 0x20u8  // LDA ($20, X)
    } };
    memory.write(Address::new(0x0040), 0x00);
    memory.write(Address::new(0x0041), 0x30);
    memory.write(Address::new(0x3000), 0xDF);
    let mut cpu = boot(memory);
    cpu.run();
    assert_eq!(cpu.accumulator(), 0xDF);
}

#[test]
fn indirect_jmp_page_boundary_bug() {
    let mut memory = mem! { START.index() as u16 => {
        0x6Cu8, 0xFFu8, 0x3Fu8 // JMP ($3FFF)
    } };
    memory.write(Address::new(0x3FFF), 0x00);
    memory.write(Address::new(0x4000), 0x50);
    memory.write(Address::new(0x3F00), 0x60);
    memory.write(Address::new(0x6000), 0x00); // BRK
    let mut cpu = boot(memory);
    cpu.step();
    assert_eq!(cpu.program_counter(), Address::new(0x6000));
}

#[test]
fn jsr_rts_round_trip() {
    let mut cpu = boot(mem! {
        START.index() as u16 => { 0x20u8, 0x00u8, 0x30u8 } // JSR $3000
        0x3000u16 => { 0x60u8 } // RTS
    });
    cpu.step(); // JSR
    assert_eq!(cpu.program_counter(), Address::new(0x3000));

    // the pushed return address is one less than the next instruction
    let s = cpu.stack_pointer();
    let pushed = Address::from_bytes(
        cpu.memory().read(Address::from_bytes(0x01, s.wrapping_add(2))),
        cpu.memory().read(Address::from_bytes(0x01, s.wrapping_add(1))),
    );
    assert_eq!(pushed, Address::new(0x1002));

    cpu.step(); // RTS
    assert_eq!(cpu.program_counter(), Address::new(0x1003));
}
