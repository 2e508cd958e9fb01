//! The instruction descriptor table: the data-driven heart of the core.
//!
//! Each of the 151 legal opcodes gets one [`Descriptor`] row naming its
//! mnemonic, addressing mode, operand category and handler. Decoding an
//! opcode is then a single array lookup rather than a 151-arm match, and the
//! resolver/dispatcher (`cpu::addressing_modes`, `cpu::mod`) only have to
//! know how to interpret 15 addressing modes and ~20 handlers, not 151
//! individual opcodes.

use crate::cpu::status::Status;
use std::sync::OnceLock;

/// How an instruction's operand is located, mirroring `SourceType` in
/// `original_source/emu6502/processor.h` one-for-one, with one deliberate
/// deviation: `Accumulator` here means "the accumulator register is the
/// operand", used both for transfer sources (TAX, TAY) *and* for the
/// accumulator-addressed shift/rotate forms (`ASL A` etc), which the
/// original instead encodes as `Implied` (see DESIGN.md).
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum AddressingMode {
    Accumulator,
    IndexX,
    IndexY,
    StackPointer,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    Immediate,
    Implied,
    Indirect,
    XIndirect,
    IndirectY,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
}

impl AddressingMode {
    /// Total instruction length in bytes, including the opcode byte.
    pub const fn length(self) -> u8 {
        use AddressingMode::*;
        match self {
            Accumulator | IndexX | IndexY | StackPointer | Implied => 1,
            Immediate | XIndirect | IndirectY | ZeroPage | ZeroPageX | ZeroPageY => 2,
            Absolute | AbsoluteX | AbsoluteY | Indirect => 3,
        }
    }
}

/// What the handler writes its result into, mirroring `TargetType`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum OperandCategory {
    None,
    Accumulator,
    IndexX,
    IndexY,
    StackPointer,
    Status,
    Address,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum BranchCondition {
    Minus,
    Positive,
    Equal,
    NotEqual,
    CarrySet,
    CarryClear,
    OverflowSet,
    OverflowClear,
}

/// Which semantic handler executes the instruction, grounded one-for-one in
/// the `Processor::Function` member-function pointers of
/// `original_source/emu6502/processor.h`'s `LegalInstructionSet`. Variants
/// that original_source spreads across several member functions differing
/// only by a flag or a predicate (the eight conditional branches, the seven
/// flag set/clear instructions) are collapsed into one handler parameterized
/// by that difference, since Rust can match on an embedded value instead of
/// needing one function pointer per case.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Handler {
    Load,
    Store,
    And,
    Or,
    Xor,
    Compare,
    Bit,
    ShiftLeft,
    ShiftRight,
    RotateLeft,
    RotateRight,
    Increment,
    Decrement,
    Adc,
    Sbc,
    Branch(BranchCondition),
    Jump,
    Jsr,
    Rts,
    Brk,
    Rti,
    Nop,
    Push,
    Pull,
    SetFlag(Status, bool),
}

#[derive(Debug, Clone, Copy)]
pub struct Descriptor {
    pub opcode: u8,
    pub mnemonic: &'static str,
    pub mode: AddressingMode,
    pub category: OperandCategory,
    pub internal_execution: bool,
    pub handler: Handler,
}

use AddressingMode::*;
use BranchCondition::*;
use Handler::*;
use OperandCategory as Cat;

macro_rules! row {
    ($opcode:expr, $mnemonic:expr, $mode:expr, $category:expr, $internal:expr, $handler:expr) => {
        Descriptor {
            opcode: $opcode,
            mnemonic: $mnemonic,
            mode: $mode,
            category: $category,
            internal_execution: $internal,
            handler: $handler,
        }
    };
}

/// The 151 legal NMOS 6502 opcodes, transcribed from
/// `original_source/emu6502/processor.h`'s `LegalInstructionSet`, with the
/// `ASL A`/`LSR A`/`ROL A`/`ROR A` rows changed from `Implied` to
/// `Accumulator` addressing per the documented deviation (DESIGN.md).
pub static TABLE: [Descriptor; 151] = [
    row!(0x61, "ADC", XIndirect, Cat::Accumulator, true, Adc),
    row!(0x65, "ADC", ZeroPage, Cat::Accumulator, true, Adc),
    row!(0x69, "ADC", Immediate, Cat::Accumulator, true, Adc),
    row!(0x6D, "ADC", Absolute, Cat::Accumulator, true, Adc),
    row!(0x71, "ADC", IndirectY, Cat::Accumulator, true, Adc),
    row!(0x75, "ADC", ZeroPageX, Cat::Accumulator, true, Adc),
    row!(0x79, "ADC", AbsoluteY, Cat::Accumulator, true, Adc),
    row!(0x7D, "ADC", AbsoluteX, Cat::Accumulator, true, Adc),
    row!(0x21, "AND", XIndirect, Cat::Accumulator, true, And),
    row!(0x25, "AND", ZeroPage, Cat::Accumulator, true, And),
    row!(0x29, "AND", Immediate, Cat::Accumulator, true, And),
    row!(0x2D, "AND", Absolute, Cat::Accumulator, true, And),
    row!(0x31, "AND", IndirectY, Cat::Accumulator, true, And),
    row!(0x35, "AND", ZeroPageX, Cat::Accumulator, true, And),
    row!(0x39, "AND", AbsoluteY, Cat::Accumulator, true, And),
    row!(0x3D, "AND", AbsoluteX, Cat::Accumulator, true, And),
    row!(0x06, "ASL", ZeroPage, Cat::Address, false, ShiftLeft),
    row!(0x0A, "ASL A", Accumulator, Cat::Accumulator, true, ShiftLeft),
    row!(0x0E, "ASL", Absolute, Cat::Address, false, ShiftLeft),
    row!(0x16, "ASL", ZeroPageX, Cat::Address, false, ShiftLeft),
    row!(0x1E, "ASL", AbsoluteX, Cat::Address, false, ShiftLeft),
    row!(0x90, "BCC", Immediate, Cat::None, true, Branch(CarryClear)),
    row!(0xB0, "BCS", Immediate, Cat::None, true, Branch(CarrySet)),
    row!(0xF0, "BEQ", Immediate, Cat::None, true, Branch(Equal)),
    row!(0x24, "BIT", ZeroPage, Cat::Address, true, Bit),
    row!(0x2C, "BIT", Absolute, Cat::Address, true, Bit),
    row!(0x30, "BMI", Immediate, Cat::None, true, Branch(Minus)),
    row!(0xD0, "BNE", Immediate, Cat::None, true, Branch(NotEqual)),
    row!(0x10, "BPL", Immediate, Cat::None, true, Branch(Positive)),
    row!(0x00, "BRK", Implied, Cat::None, true, Brk),
    row!(0x50, "BVC", Immediate, Cat::None, true, Branch(OverflowClear)),
    row!(0x70, "BVS", Immediate, Cat::None, true, Branch(OverflowSet)),
    row!(0x18, "CLC", Implied, Cat::None, true, SetFlag(Status::CARRY, false)),
    row!(0xD8, "CLD", Implied, Cat::None, true, SetFlag(Status::DECIMAL, false)),
    row!(0x58, "CLI", Implied, Cat::None, true, SetFlag(Status::INTERRUPT, false)),
    row!(0xB8, "CLV", Implied, Cat::None, true, SetFlag(Status::OVERFLOW, false)),
    row!(0xC1, "CMP", XIndirect, Cat::Accumulator, true, Compare),
    row!(0xC5, "CMP", ZeroPage, Cat::Accumulator, true, Compare),
    row!(0xC9, "CMP", Immediate, Cat::Accumulator, true, Compare),
    row!(0xCD, "CMP", Absolute, Cat::Accumulator, true, Compare),
    row!(0xD1, "CMP", IndirectY, Cat::Accumulator, true, Compare),
    row!(0xD5, "CMP", ZeroPageX, Cat::Accumulator, true, Compare),
    row!(0xD9, "CMP", AbsoluteY, Cat::Accumulator, true, Compare),
    row!(0xDD, "CMP", AbsoluteX, Cat::Accumulator, true, Compare),
    row!(0xE0, "CPX", Immediate, Cat::IndexX, true, Compare),
    row!(0xE4, "CPX", ZeroPage, Cat::IndexX, true, Compare),
    row!(0xEC, "CPX", Absolute, Cat::IndexX, true, Compare),
    row!(0xC0, "CPY", Immediate, Cat::IndexY, true, Compare),
    row!(0xC4, "CPY", ZeroPage, Cat::IndexY, true, Compare),
    row!(0xCC, "CPY", Absolute, Cat::IndexY, true, Compare),
    row!(0xC6, "DEC", ZeroPage, Cat::Address, false, Decrement),
    row!(0xCE, "DEC", Absolute, Cat::Address, false, Decrement),
    row!(0xD6, "DEC", ZeroPageX, Cat::Address, false, Decrement),
    row!(0xDE, "DEC", AbsoluteX, Cat::Address, false, Decrement),
    row!(0xCA, "DEX", Implied, Cat::IndexX, true, Decrement),
    row!(0x88, "DEY", Implied, Cat::IndexY, true, Decrement),
    row!(0x41, "EOR", XIndirect, Cat::Accumulator, true, Xor),
    row!(0x45, "EOR", ZeroPage, Cat::Accumulator, true, Xor),
    row!(0x49, "EOR", Immediate, Cat::Accumulator, true, Xor),
    row!(0x4D, "EOR", Absolute, Cat::Accumulator, true, Xor),
    row!(0x51, "EOR", IndirectY, Cat::Accumulator, true, Xor),
    row!(0x55, "EOR", ZeroPageX, Cat::Accumulator, true, Xor),
    row!(0x59, "EOR", AbsoluteY, Cat::Accumulator, true, Xor),
    row!(0x5D, "EOR", AbsoluteX, Cat::Accumulator, true, Xor),
    row!(0xE6, "INC", ZeroPage, Cat::Address, false, Increment),
    row!(0xEE, "INC", Absolute, Cat::Address, false, Increment),
    row!(0xF6, "INC", ZeroPageX, Cat::Address, false, Increment),
    row!(0xFE, "INC", AbsoluteX, Cat::Address, false, Increment),
    row!(0xE8, "INX", Implied, Cat::IndexX, true, Increment),
    row!(0xC8, "INY", Implied, Cat::IndexY, true, Increment),
    row!(0x4C, "JMP", Absolute, Cat::None, true, Jump),
    row!(0x6C, "JMP", Indirect, Cat::None, true, Jump),
    row!(0x20, "JSR", Absolute, Cat::None, true, Jsr),
    row!(0xA1, "LDA", XIndirect, Cat::Accumulator, true, Load),
    row!(0xA5, "LDA", ZeroPage, Cat::Accumulator, true, Load),
    row!(0xA9, "LDA", Immediate, Cat::Accumulator, true, Load),
    row!(0xAD, "LDA", Absolute, Cat::Accumulator, true, Load),
    row!(0xB1, "LDA", IndirectY, Cat::Accumulator, true, Load),
    row!(0xB5, "LDA", ZeroPageX, Cat::Accumulator, true, Load),
    row!(0xB9, "LDA", AbsoluteY, Cat::Accumulator, true, Load),
    row!(0xBD, "LDA", AbsoluteX, Cat::Accumulator, true, Load),
    row!(0xA2, "LDX", Immediate, Cat::IndexX, true, Load),
    row!(0xA6, "LDX", ZeroPage, Cat::IndexX, true, Load),
    row!(0xAE, "LDX", Absolute, Cat::IndexX, true, Load),
    row!(0xB6, "LDX", ZeroPageY, Cat::IndexX, true, Load),
    row!(0xBE, "LDX", AbsoluteY, Cat::IndexX, true, Load),
    row!(0xA0, "LDY", Immediate, Cat::IndexY, true, Load),
    row!(0xA4, "LDY", ZeroPage, Cat::IndexY, true, Load),
    row!(0xAC, "LDY", Absolute, Cat::IndexY, true, Load),
    row!(0xB4, "LDY", ZeroPageX, Cat::IndexY, true, Load),
    row!(0xBC, "LDY", AbsoluteX, Cat::IndexY, true, Load),
    row!(0x46, "LSR", ZeroPage, Cat::Address, false, ShiftRight),
    row!(0x4A, "LSR A", Accumulator, Cat::Accumulator, true, ShiftRight),
    row!(0x4E, "LSR", Absolute, Cat::Address, false, ShiftRight),
    row!(0x56, "LSR", ZeroPageX, Cat::Address, false, ShiftRight),
    row!(0x5E, "LSR", AbsoluteX, Cat::Address, false, ShiftRight),
    row!(0xEA, "NOP", Implied, Cat::None, true, Nop),
    row!(0x01, "ORA", XIndirect, Cat::Accumulator, true, Or),
    row!(0x05, "ORA", ZeroPage, Cat::Accumulator, true, Or),
    row!(0x09, "ORA", Immediate, Cat::Accumulator, true, Or),
    row!(0x0D, "ORA", Absolute, Cat::Accumulator, true, Or),
    row!(0x11, "ORA", IndirectY, Cat::Accumulator, true, Or),
    row!(0x15, "ORA", ZeroPageX, Cat::Accumulator, true, Or),
    row!(0x19, "ORA", AbsoluteY, Cat::Accumulator, true, Or),
    row!(0x1D, "ORA", AbsoluteX, Cat::Accumulator, true, Or),
    row!(0x48, "PHA", Implied, Cat::Accumulator, true, Push),
    row!(0x08, "PHP", Implied, Cat::Status, true, Push),
    row!(0x68, "PLA", Implied, Cat::Accumulator, true, Pull),
    row!(0x28, "PLP", Implied, Cat::Status, true, Pull),
    row!(0x26, "ROL", ZeroPage, Cat::Address, false, RotateLeft),
    row!(0x2A, "ROL A", Accumulator, Cat::Accumulator, true, RotateLeft),
    row!(0x2E, "ROL", Absolute, Cat::Address, false, RotateLeft),
    row!(0x36, "ROL", ZeroPageX, Cat::Address, false, RotateLeft),
    row!(0x3E, "ROL", AbsoluteX, Cat::Address, false, RotateLeft),
    row!(0x66, "ROR", ZeroPage, Cat::Address, false, RotateRight),
    row!(0x6A, "ROR A", Accumulator, Cat::Accumulator, true, RotateRight),
    row!(0x6E, "ROR", Absolute, Cat::Address, false, RotateRight),
    row!(0x76, "ROR", ZeroPageX, Cat::Address, false, RotateRight),
    row!(0x7E, "ROR", AbsoluteX, Cat::Address, false, RotateRight),
    row!(0x40, "RTI", Implied, Cat::None, true, Rti),
    row!(0x60, "RTS", Implied, Cat::None, true, Rts),
    row!(0xE1, "SBC", XIndirect, Cat::Accumulator, true, Sbc),
    row!(0xE5, "SBC", ZeroPage, Cat::Accumulator, true, Sbc),
    row!(0xE9, "SBC", Immediate, Cat::Accumulator, true, Sbc),
    row!(0xED, "SBC", Absolute, Cat::Accumulator, true, Sbc),
    row!(0xF1, "SBC", IndirectY, Cat::Accumulator, true, Sbc),
    row!(0xF5, "SBC", ZeroPageX, Cat::Accumulator, true, Sbc),
    row!(0xF9, "SBC", AbsoluteY, Cat::Accumulator, true, Sbc),
    row!(0xFD, "SBC", AbsoluteX, Cat::Accumulator, true, Sbc),
    row!(0x38, "SEC", Implied, Cat::None, true, SetFlag(Status::CARRY, true)),
    row!(0xF8, "SED", Implied, Cat::None, true, SetFlag(Status::DECIMAL, true)),
    row!(0x78, "SEI", Implied, Cat::None, true, SetFlag(Status::INTERRUPT, true)),
    row!(0x81, "STA", XIndirect, Cat::Accumulator, false, Store),
    row!(0x85, "STA", ZeroPage, Cat::Accumulator, false, Store),
    row!(0x8D, "STA", Absolute, Cat::Accumulator, false, Store),
    row!(0x91, "STA", IndirectY, Cat::Accumulator, false, Store),
    row!(0x95, "STA", ZeroPageX, Cat::Accumulator, false, Store),
    row!(0x99, "STA", AbsoluteY, Cat::Accumulator, false, Store),
    row!(0x9D, "STA", AbsoluteX, Cat::Accumulator, false, Store),
    row!(0x86, "STX", ZeroPage, Cat::IndexX, false, Store),
    row!(0x8E, "STX", Absolute, Cat::IndexX, false, Store),
    row!(0x96, "STX", ZeroPageY, Cat::IndexX, false, Store),
    row!(0x84, "STY", ZeroPage, Cat::IndexY, false, Store),
    row!(0x8C, "STY", Absolute, Cat::IndexY, false, Store),
    row!(0x94, "STY", ZeroPageX, Cat::IndexY, false, Store),
    row!(0xAA, "TAX", Accumulator, Cat::IndexX, true, Load),
    row!(0xA8, "TAY", Accumulator, Cat::IndexY, true, Load),
    row!(0xBA, "TSX", StackPointer, Cat::IndexX, true, Load),
    row!(0x8A, "TXA", IndexX, Cat::Accumulator, true, Load),
    row!(0x9A, "TXS", IndexX, Cat::StackPointer, true, Load),
    row!(0x98, "TYA", IndexY, Cat::Accumulator, true, Load),
];

static LOOKUP: OnceLock<[Option<&'static Descriptor>; 256]> = OnceLock::new();

/// The 256-slot opcode -> descriptor lookup, built once on first use.
/// Opcodes not among the 151 legal ones resolve to `None`.
pub fn lookup(opcode: u8) -> Option<&'static Descriptor> {
    LOOKUP.get_or_init(build_lookup)[opcode as usize]
}

fn build_lookup() -> [Option<&'static Descriptor>; 256] {
    let mut table: [Option<&'static Descriptor>; 256] = [None; 256];
    for descriptor in TABLE.iter() {
        table[descriptor.opcode as usize] = Some(descriptor);
    }
    table
}

/// Look up a descriptor by mnemonic, addressing mode and operand category
/// all at once. Used by [`crate::cpu::CPU::is_last_instruction`]'s
/// three-argument overload.
pub fn find(mnemonic: &str, mode: AddressingMode, category: OperandCategory) -> Option<&'static Descriptor> {
    TABLE
        .iter()
        .find(|d| d.mnemonic == mnemonic && d.mode == mode && d.category == category)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_has_151_entries() {
        assert_eq!(TABLE.len(), 151);
    }

    #[test]
    fn opcodes_are_unique() {
        let mut opcodes: Vec<u8> = TABLE.iter().map(|d| d.opcode).collect();
        opcodes.sort_unstable();
        opcodes.dedup();
        assert_eq!(opcodes.len(), 151);
    }

    #[test]
    fn lda_immediate_decodes() {
        let d = lookup(0xA9).expect("LDA #imm is legal");
        assert_eq!(d.mnemonic, "LDA");
        assert_eq!(d.mode, AddressingMode::Immediate);
        assert_eq!(d.category, OperandCategory::Accumulator);
    }

    #[test]
    fn sec_is_sec_not_and() {
        let d = lookup(0x38).expect("SEC is legal");
        assert_eq!(d.mnemonic, "SEC");
        assert_eq!(d.handler, Handler::SetFlag(Status::CARRY, true));
    }

    #[test]
    fn undefined_opcode_has_no_descriptor() {
        assert!(lookup(0x02).is_none());
        assert!(lookup(0xFF).is_none());
    }

    #[test]
    fn asl_accumulator_uses_dedicated_mode() {
        let d = lookup(0x0A).expect("ASL A is legal");
        assert_eq!(d.mode, AddressingMode::Accumulator);
        assert_eq!(d.mnemonic, "ASL A");
    }
}
