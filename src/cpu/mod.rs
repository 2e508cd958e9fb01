//! The 6502 processor core: registers, status flags, the fetch-decode-
//! execute loop, and interrupt/reset handling.

pub mod addressing_modes;
pub mod descriptor;
pub mod status;

use crate::cpu::addressing_modes::Reference;
use crate::cpu::descriptor::{
    BranchCondition, Descriptor, Handler, OperandCategory,
};
use crate::{Address, Memory};
use log::trace;
pub use status::Status;

const RESET_VECTOR: Address = Address::new(0xFFFC);
const INTERRUPT_VECTOR: Address = Address::new(0xFFFE);
const NMI_VECTOR: Address = Address::new(0xFFFA);
const BREAK_OPCODE: u8 = 0x00;

/// A MOS 6502 core, generic over its [`Memory`] bus. Owns the bus for its
/// lifetime, matching the teacher's `CPU<M>` generic-owner pattern rather
/// than a trait object.
#[derive(Debug)]
pub struct CPU<M> {
    memory: M,

    a: u8,
    x: u8,
    y: u8,
    s: u8,
    pc: Address,
    status: Status,

    // transient decode state
    data: u8,
    address: Address,
    opcode: u8,

    cycles: u64,

    reset_pending: bool,
    irq_pending: bool,
    nmi_pending: bool,

    last_instruction: Option<&'static Descriptor>,

    /// When set, `run()` treats an executed BRK as its terminator instead
    /// of pushing interrupt state, matching `Processor::EndOnBreak`.
    pub end_on_break: bool,
}

impl<M: Memory> CPU<M> {
    pub fn with_memory(memory: M) -> Self {
        CPU {
            memory,
            a: 0,
            x: 0,
            y: 0,
            s: 0,
            pc: Address::new(0),
            status: Status::empty(),
            data: 0,
            address: Address::new(0),
            opcode: 0,
            cycles: 0,
            reset_pending: false,
            irq_pending: false,
            nmi_pending: false,
            last_instruction: None,
            end_on_break: false,
        }
    }

    pub fn memory(&mut self) -> &mut M {
        &mut self.memory
    }

    pub fn accumulator(&self) -> u8 {
        self.a
    }

    pub fn set_accumulator(&mut self, value: u8) {
        self.a = value;
    }

    pub fn x(&self) -> u8 {
        self.x
    }

    pub fn set_x(&mut self, value: u8) {
        self.x = value;
    }

    pub fn y(&self) -> u8 {
        self.y
    }

    pub fn set_y(&mut self, value: u8) {
        self.y = value;
    }

    pub fn stack_pointer(&self) -> u8 {
        self.s
    }

    pub fn set_stack_pointer(&mut self, value: u8) {
        self.s = value;
    }

    pub fn program_counter(&self) -> Address {
        self.pc
    }

    pub fn set_program_counter(&mut self, address: Address) {
        self.pc = address;
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn set_status(&mut self, status: Status) {
        self.status = status;
    }

    pub fn cycle_count(&self) -> u64 {
        self.cycles
    }

    fn tick(&mut self, cycles: u64) {
        self.cycles += cycles;
    }

    fn read_u8(&mut self, address: Address) -> u8 {
        let byte = self.memory.read(address);
        self.tick(1);
        byte
    }

    fn read_opcode(&mut self) -> u8 {
        let opcode = self.memory.read(self.pc);
        self.pc += 1u16;
        self.tick(1);
        opcode
    }

    fn read_data_at_pc(&mut self) -> u8 {
        let byte = self.read_u8(self.pc);
        self.pc += 1u16;
        byte
    }

    fn read_address(&mut self, address: Address) -> Address {
        let lo = self.memory.read(address);
        let hi = self.memory.read(address + 1u16);
        self.tick(2);
        Address::from_bytes(hi, lo)
    }

    fn read_address_at_pc(&mut self) -> Address {
        let address = self.read_address(self.pc);
        self.pc += 2u16;
        address
    }

    fn push(&mut self, byte: u8) {
        self.memory.write(Address::from_bytes(0x01, self.s), byte);
        self.s = self.s.wrapping_sub(1);
        self.tick(1);
    }

    fn pull_byte(&mut self) -> u8 {
        self.tick(1);
        self.s = self.s.wrapping_add(1);
        self.memory.read(Address::from_bytes(0x01, self.s))
    }

    fn push_address(&mut self, address: Address) {
        self.push(address.higher());
        self.push(address.lower());
    }

    fn pull_address(&mut self) -> Address {
        let lo = self.pull_byte();
        let hi = self.pull_byte();
        Address::from_bytes(hi, lo)
    }

    fn read_ref(&mut self, reference: Reference) -> u8 {
        match reference {
            Reference::None => 0,
            Reference::Accumulator => self.a,
            Reference::IndexX => self.x,
            Reference::IndexY => self.y,
            Reference::StackPointer => self.s,
            Reference::Status => self.status.bits(),
            Reference::Immediate => self.data,
            Reference::Memory(address) => self.memory.read(address),
        }
    }

    fn write_ref(&mut self, reference: Reference, value: u8) {
        match reference {
            Reference::None | Reference::Immediate => {}
            Reference::Accumulator => self.a = value,
            Reference::IndexX => self.x = value,
            Reference::IndexY => self.y = value,
            Reference::StackPointer => self.s = value,
            Reference::Status => self.status = Status::from_bits_truncate(value),
            Reference::Memory(address) => self.memory.write(address, value),
        }
    }

    fn write_nz(&mut self, value: u8) {
        self.status.write_nz(value);
    }

    /// Reset the processor: `S = 0xFF`, `P` gets Interrupt-disable/Break/
    /// Reserved set, `PC` loads from the reset vector, the cycle counter
    /// and all pending latches are cleared.
    pub fn reset(&mut self) {
        self.s = 0xFF;
        self.status = Status::RESET;
        self.pc = self.read_address(RESET_VECTOR);
        self.cycles = 0;
        self.reset_pending = false;
        self.irq_pending = false;
        self.nmi_pending = false;
        log::debug!("reset: PC := {}", self.pc);
    }

    /// Request a Reset at the next step boundary.
    pub fn send_reset(&mut self) {
        self.reset_pending = true;
    }

    /// Request an IRQ. Ignored if the Interrupt-disable flag is set, as on
    /// real hardware and in `original_source::SendIRQ`.
    pub fn send_irq(&mut self) {
        if !self.status.contains(Status::INTERRUPT) {
            self.irq_pending = true;
        }
    }

    /// Request an NMI; unlike IRQ this cannot be masked.
    pub fn send_nmi(&mut self) {
        self.nmi_pending = true;
    }

    fn service_irq(&mut self) {
        self.irq_pending = false;
        let pc = self.pc;
        self.push_address(pc);
        let pushed = (self.status & !Status::BREAK).bits();
        self.push(pushed);
        self.status.insert(Status::INTERRUPT);
        self.pc = self.read_address(INTERRUPT_VECTOR);
    }

    fn service_nmi(&mut self) {
        self.nmi_pending = false;
        let pc = self.pc;
        self.push_address(pc);
        let pushed = self.status.bits();
        self.push(pushed);
        self.status.insert(Status::INTERRUPT);
        self.pc = self.read_address(NMI_VECTOR);
    }

    /// Execute one instruction (or service a pending Reset instead), then
    /// service a pending NMI or IRQ, NMI taking priority. Mirrors
    /// `Processor::Step`.
    pub fn step(&mut self) {
        if self.reset_pending {
            self.reset();
            return;
        }

        self.execute_instruction();

        if self.nmi_pending {
            self.service_nmi();
        } else if self.irq_pending {
            self.service_irq();
        }
    }

    pub fn step_n(&mut self, count: usize) {
        for _ in 0..count {
            self.step();
        }
    }

    /// Step until a BRK is executed with `end_on_break` set. Unbounded
    /// otherwise, matching `Processor::Run`.
    pub fn run(&mut self) {
        loop {
            self.step();
            if self.opcode == BREAK_OPCODE && self.end_on_break {
                break;
            }
        }
    }

    fn execute_instruction(&mut self) {
        let pc = self.pc;
        self.opcode = self.read_opcode();

        let descriptor = descriptor::lookup(self.opcode)
            .unwrap_or_else(|| panic!("undefined opcode: {:#04X}", self.opcode));

        trace!("{}  {:#04x}  {}", pc, self.opcode, descriptor.mnemonic);

        if self.opcode != BREAK_OPCODE || !self.end_on_break {
            self.last_instruction = Some(descriptor);
        }

        let source = self.resolve_source(descriptor);
        let target = self.resolve_target(descriptor, source);

        self.dispatch(descriptor, source, target);
    }

    fn dispatch(&mut self, descriptor: &Descriptor, source: Reference, target: Reference) {
        match descriptor.handler {
            Handler::Load => {
                let value = self.read_ref(source);
                self.write_ref(target, value);
                if target != Reference::StackPointer {
                    self.write_nz(value);
                }
            }
            Handler::Store => {
                let value = self.read_ref(target);
                self.write_ref(source, value);
            }
            Handler::And => self.logic(source, target, |a, b| a & b),
            Handler::Or => self.logic(source, target, |a, b| a | b),
            Handler::Xor => self.logic(source, target, |a, b| a ^ b),
            Handler::Compare => {
                let t = self.read_ref(target);
                let s = self.read_ref(source);
                self.status.set(Status::CARRY, t >= s);
                self.status.set(Status::ZERO, t == s);
                self.status
                    .set(Status::NEGATIVE, t.wrapping_sub(s) & 0x80 != 0);
            }
            Handler::Bit => {
                let operand = self.read_ref(target);
                self.status.set(Status::ZERO, self.a & operand == 0);
                self.status.set(Status::OVERFLOW, operand & 0x40 != 0);
                self.status.set(Status::NEGATIVE, operand & 0x80 != 0);
            }
            Handler::ShiftLeft => {
                let t = self.read_ref(target);
                let carry = t & 0x80 != 0;
                let result = ((t as u16) << 1) as u8;
                self.finish_rmw(target, descriptor.category, result, carry);
            }
            Handler::ShiftRight => {
                let t = self.read_ref(target);
                let carry = t & 1 != 0;
                let result = t >> 1;
                self.finish_rmw(target, descriptor.category, result, carry);
            }
            Handler::RotateLeft => {
                let t = self.read_ref(target);
                let c = self.status.contains(Status::CARRY) as u16;
                let carry = t & 0x80 != 0;
                let result = (((t as u16) << 1) | c) as u8;
                self.finish_rmw(target, descriptor.category, result, carry);
            }
            Handler::RotateRight => {
                let t = self.read_ref(target);
                let c = self.status.contains(Status::CARRY) as u8;
                let carry = t & 1 != 0;
                let result = (t >> 1) | (c << 7);
                self.finish_rmw(target, descriptor.category, result, carry);
            }
            Handler::Increment => self.step_target(target, descriptor.category, 1),
            Handler::Decrement => self.step_target(target, descriptor.category, -1),
            Handler::Adc => self.add_with_carry(source, target),
            Handler::Sbc => self.subtract_with_carry(source, target),
            Handler::Branch(condition) => {
                if self.branch_taken(condition) {
                    self.branch(source);
                }
            }
            Handler::Jump => self.pc = self.address,
            Handler::Jsr => {
                let return_addr = self.pc - 1u16;
                self.push_address(return_addr);
                self.tick(1);
                self.pc = self.address;
            }
            Handler::Rts => {
                let addr = self.pull_address();
                self.tick(2);
                self.pc = addr + 1u16;
            }
            Handler::Brk => {
                if !self.end_on_break {
                    let return_addr = self.pc + 1u16;
                    self.push_address(return_addr);
                    let pushed = (self.status | Status::BREAK | Status::RESERVED).bits();
                    self.push(pushed);
                    self.status.insert(Status::INTERRUPT);
                    self.pc = self.read_address(INTERRUPT_VECTOR);
                }
            }
            Handler::Rti => {
                let status = self.pull_byte();
                self.status = Status::from_bits_truncate(status);
                self.tick(1);
                self.pc = self.pull_address();
            }
            Handler::Nop => {}
            Handler::Push => {
                let value = self.read_ref(target);
                self.push(value);
            }
            Handler::Pull => {
                let value = self.pull_byte();
                self.tick(1);
                if target == Reference::Status {
                    self.status = Status::from_bits_truncate(value) | Status::BREAK | Status::RESERVED;
                } else {
                    self.write_ref(target, value);
                    self.write_nz(value);
                }
            }
            Handler::SetFlag(flag, value) => self.status.set(flag, value),
        }
    }

    fn logic(&mut self, source: Reference, target: Reference, op: impl Fn(u8, u8) -> u8) {
        let t = self.read_ref(target);
        let s = self.read_ref(source);
        let result = op(t, s);
        self.write_ref(target, result);
        self.write_nz(result);
    }

    fn step_target(&mut self, target: Reference, category: OperandCategory, delta: i8) {
        let t = self.read_ref(target);
        let result = t.wrapping_add(delta as u8);
        if category == OperandCategory::Address {
            self.tick(2);
        }
        self.write_ref(target, result);
        self.write_nz(result);
    }

    /// Common tail of the shift/rotate handlers: the extra "modify/write"
    /// +2 ticks only apply to memory targets (spec.md §4.D), not the
    /// accumulator-addressed forms (`ASL A` etc, 0 extra ticks).
    fn finish_rmw(&mut self, target: Reference, category: OperandCategory, result: u8, carry: bool) {
        if category == OperandCategory::Address {
            self.tick(2);
        }
        self.write_ref(target, result);
        self.status.set(Status::CARRY, carry);
        self.write_nz(result);
    }

    fn add_with_carry(&mut self, source: Reference, target: Reference) {
        let s = self.read_ref(source);
        let t = self.read_ref(target);
        let carry_in = self.status.contains(Status::CARRY) as u16;
        let decimal = self.status.contains(Status::DECIMAL);

        let result: u16 = if decimal {
            let mut lo = (s & 0x0F) as u16 + (t & 0x0F) as u16 + carry_in;
            let mut hi = (s & 0xF0) as u16 + (t & 0xF0) as u16;
            if lo >= 0x0A {
                lo -= 0x0A;
                hi += 0x10;
            }
            if hi >= 0xA0 {
                hi += 0x60;
            }
            lo + hi
        } else {
            t as u16 + s as u16 + carry_in
        };

        self.status.set(Status::CARRY, result & 0x100 != 0);
        self.status
            .set(Status::OVERFLOW, (s as u16 ^ result) & (t as u16 ^ result) & 0x80 != 0);
        let value = (result & 0xFF) as u8;
        self.write_ref(target, value);
        if !decimal {
            self.write_nz(value);
        }
    }

    fn subtract_with_carry(&mut self, source: Reference, target: Reference) {
        let s = self.read_ref(source);
        let t = self.read_ref(target);
        let carry_in = self.status.contains(Status::CARRY) as i32;
        let decimal = self.status.contains(Status::DECIMAL);

        let result: u16 = if decimal {
            let nines = 0x99 - s as u16;
            let mut lo = (t & 0x0F) as u16 + (nines & 0x0F) + carry_in as u16;
            let mut hi = (t & 0xF0) as u16 + (nines & 0xF0);
            if lo >= 0x0A {
                lo -= 0x0A;
                hi += 0x10;
            }
            if hi >= 0xA0 {
                hi += 0x60;
            }
            let result = lo + hi;
            self.status.set(Status::CARRY, result & 0x100 != 0);
            result
        } else {
            let raw = t as i32 - s as i32 - 1 + carry_in;
            let result = raw as u16;
            self.status.set(Status::CARRY, result & 0x100 == 0);
            result
        };

        self.status
            .set(Status::OVERFLOW, !(s as u16 ^ result) & (t as u16 ^ result) & 0x80 != 0);
        let value = (result & 0xFF) as u8;
        self.write_ref(target, value);
        if !decimal {
            self.write_nz(value);
        }
    }

    fn branch_taken(&self, condition: BranchCondition) -> bool {
        use BranchCondition::*;
        match condition {
            Minus => self.status.contains(Status::NEGATIVE),
            Positive => !self.status.contains(Status::NEGATIVE),
            Equal => self.status.contains(Status::ZERO),
            NotEqual => !self.status.contains(Status::ZERO),
            CarrySet => self.status.contains(Status::CARRY),
            CarryClear => !self.status.contains(Status::CARRY),
            OverflowSet => self.status.contains(Status::OVERFLOW),
            OverflowClear => !self.status.contains(Status::OVERFLOW),
        }
    }

    fn branch(&mut self, source: Reference) {
        let offset = self.read_ref(source) as i8;
        let target = self.pc + offset;
        if self.pc.higher() != target.higher() {
            self.tick(1);
        }
        self.tick(1);
        self.pc = target;
    }

    /// True if the most recently executed instruction has this mnemonic.
    pub fn is_last_instruction(&self, name: &str) -> bool {
        self.last_instruction
            .map(|d| d.mnemonic == name)
            .unwrap_or(false)
    }

    /// True if the most recently executed instruction has this mnemonic
    /// and addressing mode.
    pub fn is_last_instruction_mode(&self, name: &str, mode: descriptor::AddressingMode) -> bool {
        self.last_instruction
            .map(|d| d.mnemonic == name && d.mode == mode)
            .unwrap_or(false)
    }

    /// True if the most recently executed instruction has this mnemonic,
    /// addressing mode and operand category.
    pub fn is_last_instruction_mode_category(
        &self,
        name: &str,
        mode: descriptor::AddressingMode,
        category: OperandCategory,
    ) -> bool {
        self.last_instruction
            .map(|d| d.mnemonic == name && d.mode == mode && d.category == category)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mem;

    fn run(memory: crate::ArrayMemory, steps: usize) -> CPU<crate::ArrayMemory> {
        let mut cpu = CPU::with_memory(memory);
        cpu.set_program_counter(Address::new(0));
        cpu.step_n(steps);
        cpu
    }

    #[test]
    fn lda_immediate_sets_accumulator_and_flags() {
        let memory = mem![0xA9u8, 0x00u8];
        let cpu = run(memory, 1);
        assert_eq!(cpu.accumulator(), 0);
        assert!(cpu.status().contains(Status::ZERO));
    }

    #[test]
    fn lda_then_sta_round_trips_through_memory() {
        let memory = mem![0xA9u8, 0x42u8, 0x8Du8, 0x00u8, 0x02u8];
        let mut cpu = run(memory, 2);
        assert_eq!(cpu.memory().read(Address::new(0x0200)), 0x42);
    }

    #[test]
    fn txs_does_not_touch_flags() {
        let memory = mem![0x9Au8]; // TXS
        let mut cpu = CPU::with_memory(memory);
        cpu.set_x(0);
        cpu.set_status(Status::NEGATIVE);
        cpu.step();
        assert_eq!(cpu.stack_pointer(), 0);
        assert!(cpu.status().contains(Status::NEGATIVE));
    }

    #[test]
    fn adc_sets_carry_and_overflow_on_signed_overflow() {
        let memory = mem![0xA9u8, 0x7Fu8, 0x69u8, 0x01u8]; // LDA #$7F ; ADC #$01
        let cpu = run(memory, 2);
        assert_eq!(cpu.accumulator(), 0x80);
        assert!(cpu.status().contains(Status::OVERFLOW));
        assert!(!cpu.status().contains(Status::CARRY));
    }

    #[test]
    fn sbc_carry_means_no_borrow() {
        let memory = mem![0xA9u8, 0x05u8, 0x38u8, 0xE9u8, 0x01u8]; // LDA #5 ; SEC ; SBC #1
        let cpu = run(memory, 3);
        assert_eq!(cpu.accumulator(), 4);
        assert!(cpu.status().contains(Status::CARRY));
    }

    #[test]
    fn inx_takes_two_cycles_total() {
        let memory = mem![0xE8u8];
        let mut cpu = CPU::with_memory(memory);
        cpu.step();
        assert_eq!(cpu.x(), 1);
        assert_eq!(cpu.cycle_count(), 2);
    }

    #[test]
    fn branch_crossing_a_page_costs_an_extra_cycle() {
        // BNE $00FC, offset +$7F: PC lands at $00FE after the 2-byte fetch,
        // and $00FE + $7F = $017D crosses from page $00 into page $01.
        let mut memory = crate::ArrayMemory::default();
        memory.write(Address::new(0x00FC), 0xD0);
        memory.write(Address::new(0x00FD), 0x7F);
        let mut cpu = CPU::with_memory(memory);
        cpu.set_program_counter(Address::new(0x00FC));
        cpu.step();
        assert_eq!(cpu.cycle_count(), 4);
    }

    #[test]
    fn undefined_opcode_panics() {
        let result = std::panic::catch_unwind(|| {
            let memory = mem![0x02u8];
            let mut cpu = CPU::with_memory(memory);
            cpu.step();
        });
        assert!(result.is_err());
    }

    #[test]
    fn reset_vector_is_honoured() {
        let mut memory = crate::ArrayMemory::default();
        memory.write(Address::new(0xFFFC), 0x00);
        memory.write(Address::new(0xFFFD), 0x80);
        let mut cpu = CPU::with_memory(memory);
        cpu.send_reset();
        cpu.step();
        assert_eq!(cpu.program_counter(), Address::new(0x8000));
        assert_eq!(cpu.stack_pointer(), 0xFF);
        assert_eq!(cpu.cycle_count(), 0);
    }

    #[test]
    fn nmi_takes_priority_over_irq() {
        let mut memory = crate::ArrayMemory::default();
        memory.write(Address::new(0xFFFA), 0x00);
        memory.write(Address::new(0xFFFB), 0x90);
        memory.write(Address::new(0xFFFE), 0x00);
        memory.write(Address::new(0xFFFF), 0xA0);
        memory.write(Address::new(0x0000), 0xEA); // NOP
        let mut cpu = CPU::with_memory(memory);
        cpu.send_irq();
        cpu.send_nmi();
        cpu.step();
        assert_eq!(cpu.program_counter(), Address::new(0x9000));
    }

    #[test]
    fn run_stops_on_brk_when_end_on_break_is_set() {
        let memory = mem![0xEAu8, 0xEAu8, 0x00u8];
        let mut cpu = CPU::with_memory(memory);
        cpu.end_on_break = true;
        cpu.run();
        assert_eq!(cpu.program_counter(), Address::new(3));
        assert!(cpu.is_last_instruction("NOP"));
    }
}
