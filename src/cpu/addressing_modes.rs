//! The addressing-mode resolver (component C): turns a decoded descriptor
//! plus already-fetched operand bytes into a [`Reference`] operand handle,
//! ticking the cycle counter exactly as
//! `original_source/emu6502/processor.cpp`'s `ExecuteInstruction` does in
//! its `Source`/`Target` mode switches.

use crate::cpu::descriptor::{AddressingMode, Descriptor, OperandCategory};
use crate::cpu::CPU;
use crate::{Address, Memory};

/// A handle to wherever an instruction's operand lives: a register, the
/// status byte, the just-fetched immediate byte, or a memory cell. Mirrors
/// the `Operand = Register(..) | Memory(..)` design note in spec.md 9 and
/// the tagged-pointer role `Source`/`Target` play in `original_source`.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Reference {
    None,
    Accumulator,
    IndexX,
    IndexY,
    StackPointer,
    Status,
    Immediate,
    Memory(Address),
}

fn page_crossed(base: Address, index: u8) -> bool {
    u16::from(base.lower()) + u16::from(index) >= 0x100
}

impl<M: Memory> CPU<M> {
    /// Fetch any operand bytes the addressing mode needs (none, one, or
    /// two) into the transient `data`/`address` registers, then resolve the
    /// source operand, ticking cycles as it goes.
    pub(crate) fn resolve_source(&mut self, descriptor: &Descriptor) -> Reference {
        match descriptor.mode.length() {
            2 => {
                self.data = self.read_data_at_pc();
            }
            3 => {
                self.address = self.read_address_at_pc();
            }
            _ => {}
        }

        use AddressingMode::*;
        match descriptor.mode {
            Implied => {
                self.tick(1);
                Reference::None
            }
            Accumulator => Reference::Accumulator,
            IndexX => Reference::IndexX,
            IndexY => Reference::IndexY,
            StackPointer => Reference::StackPointer,
            Absolute => {
                if descriptor.category != OperandCategory::None {
                    self.tick(1);
                }
                Reference::Memory(self.address)
            }
            AbsoluteX => {
                let base = self.address;
                let effective = base + self.x;
                if !descriptor.internal_execution || page_crossed(base, self.x) {
                    self.tick(1);
                }
                self.tick(1);
                Reference::Memory(effective)
            }
            AbsoluteY => {
                let base = self.address;
                let effective = base + self.y;
                if !descriptor.internal_execution || page_crossed(base, self.y) {
                    self.tick(1);
                }
                self.tick(1);
                Reference::Memory(effective)
            }
            Immediate => Reference::Immediate,
            Indirect => {
                let ptr = self.address;
                let resolved = if ptr.lower() == 0xFF {
                    let lo = self.memory.read(ptr);
                    let hi = self.memory.read(Address::from_bytes(ptr.higher(), 0x00));
                    self.tick(2);
                    Address::from_bytes(hi, lo)
                } else {
                    self.read_address(ptr)
                };
                self.address = resolved;
                Reference::Memory(resolved)
            }
            XIndirect => {
                let ptr = Address::zero_page(self.data.wrapping_add(self.x));
                let effective = self.read_address(ptr);
                self.tick(2);
                self.address = effective;
                Reference::Memory(effective)
            }
            IndirectY => {
                let ptr = Address::zero_page(self.data);
                let base = self.read_address(ptr);
                let effective = base + self.y;
                if !descriptor.internal_execution || page_crossed(base, self.y) {
                    self.tick(1);
                }
                self.tick(1);
                self.address = effective;
                Reference::Memory(effective)
            }
            ZeroPage => {
                let addr = Address::zero_page(self.data);
                self.tick(1);
                Reference::Memory(addr)
            }
            ZeroPageX => {
                let addr = Address::zero_page(self.data.wrapping_add(self.x));
                self.tick(2);
                Reference::Memory(addr)
            }
            ZeroPageY => {
                let addr = Address::zero_page(self.data.wrapping_add(self.y));
                self.tick(2);
                Reference::Memory(addr)
            }
        }
    }

    /// Resolve the target operand handle. No ticks of its own: in
    /// `original_source` the target switch is pure pointer arithmetic.
    pub(crate) fn resolve_target(&self, descriptor: &Descriptor, source: Reference) -> Reference {
        use OperandCategory::*;
        match descriptor.category {
            None => Reference::None,
            Accumulator => Reference::Accumulator,
            IndexX => Reference::IndexX,
            IndexY => Reference::IndexY,
            StackPointer => Reference::StackPointer,
            Status => Reference::Status,
            Address => source,
        }
    }
}
