//! Host-side helpers for getting a program image into a [`Memory`].
//!
//! These are not part of the processor core (the core only ever sees the
//! `Memory` trait) but every frontend needs them, so they live in this crate
//! rather than being duplicated by each one.

use crate::{Address, ArrayMemory, Memory};
use std::fmt::Write as _;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("line {line}: expected ':' prefix")]
    MissingColon { line: usize },
    #[error("line {line}: checksum mismatch")]
    BadChecksum { line: usize },
    #[error("line {line}: record shorter than its declared byte count")]
    Truncated { line: usize },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn hex_byte(s: &str, line: usize) -> Result<u8, LoadError> {
    u8::from_str_radix(s, 16).map_err(|_| LoadError::Truncated { line })
}

/// Write raw ASCII hex pairs (optionally separated by whitespace) into
/// `memory` starting at `offset`, optionally appending a trailing `0x00`
/// (BRK) byte after the last one written. Mirrors `Memory::Write` in
/// `original_source`, used by tests and the `mem!` macro family to build
/// small memory images without listing `u8` literals.
pub fn load_hex_pairs<M: Memory>(memory: &mut M, offset: Address, text: &str, add_break: bool) {
    let mut addr = offset;
    let digits: Vec<char> = text.chars().filter(|c| !c.is_whitespace()).collect();
    for pair in digits.chunks(2) {
        let s: String = pair.iter().collect();
        let byte = u8::from_str_radix(&s, 16).unwrap_or(0);
        memory.write(addr, byte);
        addr += 1u8;
    }
    if add_break {
        memory.write(addr, 0x00);
    }
}

/// Parse an Intel HEX text image into `memory`. Fills all 64 KiB with
/// `0xFF` first (matching `original_source::Memory::ReadFile`'s pre-fill,
/// present for both loader kinds there), then applies each `:`-prefixed
/// record in turn. Record type `0x00` (data) writes bytes at the record's
/// address; `0x01` (end of file) stops parsing; any other record type is
/// silently skipped, matching the original's `default: break` arm — this
/// detail isn't in the distilled spec but the original always does it.
pub fn load_intel_hex<M: Memory>(memory: &mut M, text: &str) -> Result<(), LoadError> {
    fill_unprogrammed(memory);

    for (idx, raw_line) in text.lines().enumerate() {
        let line = idx + 1;
        let row = raw_line.trim_end();
        if row.is_empty() {
            continue;
        }
        if !row.starts_with(':') {
            return Err(LoadError::MissingColon { line });
        }
        let body = &row[1..];
        if body.len() < 8 {
            return Err(LoadError::Truncated { line });
        }

        let byte_count = hex_byte(&body[0..2], line)? as usize;
        let address = u16::from_str_radix(&body[2..6], 16).map_err(|_| LoadError::Truncated { line })?;
        let record_type = hex_byte(&body[6..8], line)?;

        let needed = 8 + byte_count * 2 + 2;
        if body.len() < needed {
            return Err(LoadError::Truncated { line });
        }

        let mut checksum: u32 = 0;
        for i in 0..(byte_count + 5) {
            checksum += hex_byte(&body[i * 2..i * 2 + 2], line)? as u32;
        }
        if checksum & 0xFF != 0 {
            return Err(LoadError::BadChecksum { line });
        }

        match record_type {
            0x00 => {
                for i in 0..byte_count {
                    let byte = hex_byte(&body[8 + i * 2..10 + i * 2], line)?;
                    memory.write(Address::new(address.wrapping_add(i as u16)), byte);
                }
            }
            0x01 => break,
            _ => {}
        }
    }

    Ok(())
}

/// Fill `memory` with `0xFF` then copy `bytes` in starting at `0x0000`,
/// matching the non-hex branch of `original_source::Memory::ReadFile`.
pub fn load_raw<M: Memory>(memory: &mut M, bytes: &[u8]) {
    fill_unprogrammed(memory);
    for (i, &byte) in bytes.iter().take(0x10000).enumerate() {
        memory.write(Address::new(i as u16), byte);
    }
}

fn fill_unprogrammed<M: Memory>(memory: &mut M) {
    for i in 0..=0xFFFFu32 {
        memory.write(Address::new(i as u16), 0xFF);
    }
}

/// Load a program file, dispatching on its extension the way
/// `original_source::Memory::ReadFile` does: `.hex` (case-insensitive) is
/// parsed as Intel HEX, anything else is treated as a raw binary image.
pub fn load_file(memory: &mut ArrayMemory, path: &std::path::Path) -> Result<(), LoadError> {
    let is_hex = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("hex"))
        .unwrap_or(false);

    if is_hex {
        let text = std::fs::read_to_string(path)?;
        load_intel_hex(memory, &text)
    } else {
        let bytes = std::fs::read(path)?;
        load_raw(memory, &bytes);
        Ok(())
    }
}

/// Format `size` bytes starting at `address` as uppercase two-digit hex
/// pairs separated by spaces, matching `original_source::Memory::Read`.
pub fn format_hex<M: Memory>(memory: &mut M, address: Address, size: u16) -> String {
    let mut out = String::with_capacity(size as usize * 3);
    let mut addr = address;
    for _ in 0..size {
        let byte = memory.read(addr);
        let _ = write!(out, "{:02X} ", byte);
        addr += 1u8;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ArrayMemory;

    #[test]
    fn hex_pairs_write_sequential_bytes() {
        let mut memory = ArrayMemory::default();
        load_hex_pairs(&mut memory, Address::new(0), "A9 01 8D 00 02", false);
        assert_eq!(memory.read(Address::new(0)), 0xA9);
        assert_eq!(memory.read(Address::new(4)), 0x02);
    }

    #[test]
    fn hex_pairs_can_append_break() {
        let mut memory = ArrayMemory::default();
        load_hex_pairs(&mut memory, Address::new(0), "EA", true);
        assert_eq!(memory.read(Address::new(1)), 0x00);
    }

    #[test]
    fn intel_hex_loads_a_data_record() {
        let mut memory = ArrayMemory::default();
        let text = ":03000000A9018D6F\n:00000001FF\n";
        load_intel_hex(&mut memory, text).unwrap();
        assert_eq!(memory.read(Address::new(0)), 0xA9);
        assert_eq!(memory.read(Address::new(1)), 0x01);
        assert_eq!(memory.read(Address::new(2)), 0x8D);
    }

    #[test]
    fn intel_hex_rejects_bad_checksum() {
        let mut memory = ArrayMemory::default();
        let text = ":03000000A9018D00\n";
        assert!(matches!(
            load_intel_hex(&mut memory, text),
            Err(LoadError::BadChecksum { .. })
        ));
    }

    #[test]
    fn intel_hex_skips_unknown_record_types() {
        let mut memory = ArrayMemory::default();
        // record type 0x05, byte count 0: checksum = 00+00+00+05 = 05, two's complement 0xFB
        let text = ":000000 05FB\n".replace(' ', "");
        load_intel_hex(&mut memory, &text).unwrap();
        assert_eq!(memory.read(Address::new(0)), 0xFF);
    }

    #[test]
    fn raw_loader_prefills_unprogrammed_memory() {
        let mut memory = ArrayMemory::default();
        load_raw(&mut memory, &[0x00, 0x01]);
        assert_eq!(memory.read(Address::new(0)), 0x00);
        assert_eq!(memory.read(Address::new(2)), 0xFF);
    }
}
