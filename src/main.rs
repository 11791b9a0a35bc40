//! rustyNES core inspector
//!
//! Loads an iNES image, attaches the matching mapper, mirrors the PRG window onto
//! the CPU bus and reports what the CPU would see at reset. Optionally writes a
//! save state of the freshly initialised session.

use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use rusty_nes_core::util::{combine_bytes, hexdump};
use rusty_nes_core::{create_mapper, Cartridge, Cpu, MemoryBus, Mirroring, MirroringCallback, SaveState};

/// Start of the cartridge PRG window on the CPU bus
const PRG_WINDOW_START: u16 = 0x8000;

/// Command line arguments
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Path to the NES ROM file
    #[clap(name = "ROM")]
    rom_path: PathBuf,

    /// Enable debug logging
    #[clap(short, long)]
    debug: bool,

    /// Number of PRG bytes from $8000 to hexdump through the mapper
    #[clap(long, default_value = "64")]
    dump: usize,

    /// Write a save state of the initialised session to this path
    #[clap(long)]
    snapshot: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.debug {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    let rom_path = args.rom_path.to_string_lossy();
    info!("Loading ROM: {}", rom_path);

    let cartridge = Rc::new(
        Cartridge::from_file(&args.rom_path).with_context(|| format!("Failed to load ROM: {}", rom_path))?,
    );
    println!("{:#?}", cartridge);

    let on_mirroring: MirroringCallback = Box::new(|mode: Mirroring| info!("Name table mirroring is now {:?}", mode));
    let mapper = create_mapper(Rc::clone(&cartridge), Some(on_mirroring))
        .with_context(|| format!("Failed to create mapper {}", cartridge.mapper_number()))?;

    // Mirror the PRG window onto the CPU bus as the instruction engine would see it
    let mut bus = MemoryBus::new();
    let window: Vec<u8> = (PRG_WINDOW_START..=0xFFFF).map(|addr| mapper.read_prg(addr)).collect();
    bus.load(PRG_WINDOW_START, &window);

    let reset_vector = combine_bytes(mapper.read_prg(0xFFFC), mapper.read_prg(0xFFFD));
    let cpu = Cpu { pc: reset_vector, ..Cpu::new() };
    info!(
        "Mapper {} ready, mirroring {:?}, extended RAM {}, reset vector ${:04X}",
        mapper.kind(),
        mapper.mirroring(),
        mapper.has_extended_ram(),
        reset_vector
    );

    let dump_len = args.dump.min(window.len());
    if dump_len > 0 {
        print!("{}", hexdump(&window[..dump_len], PRG_WINDOW_START));
    }

    if let Some(path) = &args.snapshot {
        SaveState::capture(&cpu, &bus, mapper.as_ref())
            .save_to_file(path)
            .with_context(|| format!("Failed to write save state: {}", path.display()))?;
    }

    Ok(())
}
