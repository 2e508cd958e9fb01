//! Per-addressing-mode cycle accounting (spec.md §4.C), parameterized with
//! `yare` the way the teacher tables its own addressing-mode/cycle matrix.

use mos6502::mem;
use mos6502::{Address, Memory, CPU};
use yare::parameterized;

enum Scenario {
    Normal,
    PageCross,
}
use Scenario::*;

#[parameterized(
    lda_immediate = (&[0xA9, 0x00], 2, Normal),
    lda_zero_page = (&[0xA5, 0x10], 3, Normal),
    lda_zero_page_x = (&[0xB5, 0x10], 4, Normal),
    lda_absolute = (&[0xAD, 0x00, 0x20], 4, Normal),
    lda_absolute_x = (&[0xBD, 0x00, 0x20], 4, Normal),
    lda_absolute_x_cross = (&[0xBD, 0xFF, 0x20], 5, PageCross),
    lda_absolute_y = (&[0xB9, 0x00, 0x20], 4, Normal),
    lda_absolute_y_cross = (&[0xB9, 0xFF, 0x20], 5, PageCross),
    lda_x_indirect = (&[0xA1, 0x10], 6, Normal),
    sta_zero_page = (&[0x85, 0x10], 3, Normal),
    sta_absolute = (&[0x8D, 0x00, 0x20], 4, Normal),
    sta_absolute_x = (&[0x9D, 0x00, 0x20], 5, Normal),
    sta_absolute_x_no_cross_bonus = (&[0x9D, 0xFF, 0x20], 5, PageCross),
    asl_accumulator = (&[0x0A], 2, Normal),
    asl_zero_page = (&[0x06, 0x10], 5, Normal),
    asl_absolute = (&[0x0E, 0x00, 0x20], 6, Normal),
    asl_absolute_x = (&[0x1E, 0x00, 0x20], 7, Normal),
    inx = (&[0xE8], 2, Normal),
    nop = (&[0xEA], 2, Normal),
    jmp_absolute = (&[0x4C, 0x00, 0x20], 3, Normal),
    jmp_indirect = (&[0x6C, 0x00, 0x20], 5, Normal),
    jsr = (&[0x20, 0x00, 0x20], 6, Normal),
    pha = (&[0x48], 3, Normal),
    pla = (&[0x68], 4, Normal),
)]
fn addressing_mode_cycle_costs(program: &[u8], expected_cycles: u64, scenario: Scenario) {
    let mut memory = mos6502::ArrayMemory::default();
    for (i, &byte) in program.iter().enumerate() {
        memory.write(Address::new(i as u16), byte);
    }
    let mut cpu = CPU::with_memory(memory);
    if let PageCross = scenario {
        cpu.set_x(1);
        cpu.set_y(1);
    }
    cpu.step();
    assert_eq!(cpu.cycle_count(), expected_cycles);
}

#[test]
fn indirect_y_ticks_an_extra_cycle_on_page_cross() {
    let mut memory = mem![0xB1u8, 0x10u8]; // LDA ($10), Y
    memory.write(Address::new(0x0010), 0xFF);
    memory.write(Address::new(0x0011), 0x00);
    let mut cpu = CPU::with_memory(memory);
    cpu.set_y(1); // $00FF + 1 crosses into page $01
    cpu.step();
    assert_eq!(cpu.cycle_count(), 6);
}

#[test]
fn indirect_y_no_cross_is_five_cycles() {
    let mut memory = mem![0xB1u8, 0x10u8];
    memory.write(Address::new(0x0010), 0x00);
    memory.write(Address::new(0x0011), 0x20);
    let mut cpu = CPU::with_memory(memory);
    cpu.set_y(1);
    cpu.step();
    assert_eq!(cpu.cycle_count(), 5);
}

#[test]
fn branch_not_taken_is_cheaper_than_taken() {
    let mut cpu = CPU::with_memory(mem![0xD0u8, 0x02u8]); // BNE +2, Z=0 by default
    cpu.step();
    assert_eq!(cpu.cycle_count(), 3);
}
