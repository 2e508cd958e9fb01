//! CLI driver (component K): load a program image, reset the CPU, run it to
//! a fixed point, and print the memory windows and registers the
//! test-suite convention (`original_source/emu6502/main.cpp`) expects.

use clap::Parser;
use mos6502::loader::{format_hex, load_file};
use mos6502::{Address, ArrayMemory, CPU};
use std::path::PathBuf;
use std::process::ExitCode;

/// Run a MOS 6502 program image and print its final register and memory
/// state.
#[derive(Parser)]
#[command(name = "emu6502")]
struct Args {
    /// Path to the program image (".hex" for Intel HEX, anything else raw binary).
    path: Option<PathBuf>,
}

const TEST_SUITE_ENTRY: Address = Address::new(0x0400);

fn main() -> ExitCode {
    env_logger::init();

    match run() {
        Ok(code) => code,
        Err(err) => {
            log::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> anyhow::Result<ExitCode> {
    let args = Args::parse();
    let Some(path) = args.path else {
        println!("Missing argument");
        return Ok(ExitCode::FAILURE);
    };

    let mut memory = ArrayMemory::default();
    if let Err(err) = load_file(&mut memory, &path) {
        log::debug!("load_file({}) failed: {err}", path.display());
        println!("Cannot open file \"{}\"", path.display());
        return Ok(ExitCode::FAILURE);
    }

    let mut cpu = CPU::with_memory(memory);
    cpu.end_on_break = false;
    cpu.send_reset();
    cpu.step();
    cpu.set_program_counter(TEST_SUITE_ENTRY);

    loop {
        let previous_pc = cpu.program_counter();
        cpu.step();
        if previous_pc == cpu.program_counter() {
            break;
        }
    }

    print_report(&mut cpu);
    Ok(ExitCode::SUCCESS)
}

fn print_report(cpu: &mut CPU<ArrayMemory>) {
    for row in (0..0x100u16).step_by(16) {
        println!("{}", format_hex(cpu.memory(), Address::new(row + 0x200), 16));
    }
    println!();

    let pc = cpu.program_counter();
    println!("{:X}: {}", (pc - 30u8).index(), format_hex(cpu.memory(), pc - 30u8, 16));
    println!("{:X}: {}", (pc - 14u8).index(), format_hex(cpu.memory(), pc - 14u8, 16));
    println!();

    println!("{}", format_hex(cpu.memory(), Address::new(0x01F0), 16));
    println!();

    println!("A  = {:X}", cpu.accumulator());
    println!("X  = {:X}", cpu.x());
    println!("Y  = {:X}", cpu.y());
    println!("S  = {:X}", cpu.stack_pointer());
    println!("PC = {:X}", cpu.program_counter().index());
    println!("     NO-BDIZC");
    println!("P  = {:08b}", cpu.status().bits());
}
