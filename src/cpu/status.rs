use bitflags::bitflags;

bitflags! {
    /// Processor status byte. Bit layout matches `Flags` in
    /// `original_source/emu6502/processor.h` exactly.
    #[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
    pub struct Status: u8 {
        const CARRY     = 0b0000_0001;
        const ZERO      = 0b0000_0010;
        const INTERRUPT = 0b0000_0100;
        const DECIMAL   = 0b0000_1000;
        const BREAK     = 0b0001_0000;
        const RESERVED  = 0b0010_0000;
        const OVERFLOW  = 0b0100_0000;
        const NEGATIVE  = 0b1000_0000;
    }
}

impl Status {
    /// Value after Reset: Interrupt-disable, Break and Reserved set, per
    /// spec.md 3 / `original_source::Processor::Reset`.
    pub const RESET: Status = Status::INTERRUPT.union(Status::BREAK).union(Status::RESERVED);

    pub fn set_flag(&mut self, flag: Status, value: bool) {
        self.set(flag, value);
    }

    /// Write Negative and Zero from `value`, the common tail of most
    /// arithmetic/logic handlers.
    pub fn write_nz(&mut self, value: u8) {
        self.set(Status::ZERO, value == 0);
        self.set(Status::NEGATIVE, value & 0x80 != 0);
    }
}

impl Default for Status {
    fn default() -> Self {
        Status::empty()
    }
}
