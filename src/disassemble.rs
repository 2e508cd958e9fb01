//! Fixed-format disassembly (component J / spec.md §6).
//!
//! Each addressing mode has exactly one textual form, uppercase hex, with a
//! leading `$` for addresses and `#$` for immediates. The accumulator
//! shift/rotate mnemonics already carry their `" A"` suffix in
//! [`Descriptor::mnemonic`](crate::descriptor::Descriptor::mnemonic), so this
//! function only needs to append the operand.

use crate::cpu::descriptor::{AddressingMode, Descriptor};
use crate::Address;

/// Render one decoded instruction as text. `data` is the fetched operand
/// byte for single-byte-operand modes; `address` is the fetched 16-bit
/// operand for two-byte-operand modes (and the zero-page pointer, widened,
/// for the indirect modes). Unused for modes that consume neither.
pub fn disassemble(descriptor: &Descriptor, data: u8, address: Address) -> String {
    use AddressingMode::*;

    let mnemonic = descriptor.mnemonic;
    match descriptor.mode {
        Accumulator | IndexX | IndexY | StackPointer | Implied => mnemonic.to_string(),
        Immediate => format!("{} #${:X}", mnemonic, data),
        Indirect => format!("{} (${:X})", mnemonic, address.index()),
        Absolute => format!("{} ${:X}", mnemonic, address.index()),
        AbsoluteX => format!("{} ${:X}, X", mnemonic, address.index()),
        AbsoluteY => format!("{} ${:X}, Y", mnemonic, address.index()),
        ZeroPage => format!("{} ${:X}", mnemonic, data),
        ZeroPageX => format!("{} ${:X}, X", mnemonic, data),
        ZeroPageY => format!("{} ${:X}, Y", mnemonic, data),
        XIndirect => format!("{} (${:X}), X", mnemonic, data),
        IndirectY => format!("{} (${:X}, Y)", mnemonic, data),
    }
}
