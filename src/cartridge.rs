//! NES cartridge implementation
//!
//! This module handles the iNES cartridge format. A cartridge image is a 16-byte
//! header followed by the PRG ROM (program code, 16KB banks) and, optionally,
//! the CHR ROM (character/graphics data, 8KB banks). Cartridges that ship no CHR
//! ROM rely on writable CHR RAM provided by the mapper instead.
//!
//! Header layout:
//! - Bytes 0-3: "NES\x1A" signature
//! - Byte 4: PRG ROM bank count (16KB units)
//! - Byte 5: CHR ROM bank count (8KB units, 0 = CHR RAM)
//! - Byte 6: mirroring, extended RAM, trainer, four-screen, mapper low nybble
//! - Byte 7: mapper high nybble
//! - Bytes 9-10: TV system flags

use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use bincode::{Decode, Encode};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Size of the iNES header
pub const INES_HEADER_SIZE: usize = 16;

/// Size of a PRG ROM bank (16KB)
pub const PRG_ROM_BANK_SIZE: usize = 0x4000;

/// Size of a CHR ROM/RAM bank (8KB)
pub const CHR_BANK_SIZE: usize = 0x2000;

const INES_MAGIC: [u8; 4] = [0x4E, 0x45, 0x53, 0x1A];

mod flags6_bits {
    pub const VERTICAL_MIRRORING: u8 = 0x01;
    pub const EXTENDED_RAM: u8 = 0x02;
    pub const TRAINER: u8 = 0x04;
    pub const FOUR_SCREEN: u8 = 0x08;
}

/// Errors that can occur when loading a cartridge image
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("ROM header is shorter than 16 bytes")]
    TruncatedHeader,

    #[error("ROM does not declare any PRG ROM banks")]
    NoPrgBanks,

    #[error("PRG ROM data is shorter than the header declares")]
    TruncatedPrg,

    #[error("CHR ROM data is shorter than the header declares")]
    TruncatedChr,

    #[error("Trainer present but not supported")]
    TrainerUnsupported,

    #[error("Failed to allocate {0} bytes for ROM data")]
    AllocationFailure(usize),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Name table mirroring modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub enum Mirroring {
    /// Horizontal mirroring (vertical arrangement of nametables)
    Horizontal,

    /// Vertical mirroring (horizontal arrangement of nametables)
    Vertical,

    /// Four-screen mirroring (no mirroring)
    FourScreen,

    /// Single-screen mirroring, lower bank
    OneScreenLower,

    /// Single-screen mirroring, upper bank
    OneScreenHigher,
}

/// TV system the image declares. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub enum TvSystem {
    Ntsc,
    Pal,
    DualCompatible,
}

impl TvSystem {
    /// Decode the TV system from header bytes 9 (official) and 10 (unofficial)
    fn from_header(header: &[u8; INES_HEADER_SIZE]) -> Self {
        if header[9] & 0x01 != 0 {
            return TvSystem::Pal;
        }
        match header[10] & 0x03 {
            0 => TvSystem::Ntsc,
            2 => TvSystem::Pal,
            _ => TvSystem::DualCompatible,
        }
    }

    /// Whether the image declares any PAL timing (byte 10 bit 0 or a PAL-only system)
    pub fn targets_pal(self) -> bool {
        self != TvSystem::Ntsc
    }
}

/// A loaded cartridge image. Immutable once loaded.
pub struct Cartridge {
    header: [u8; INES_HEADER_SIZE],

    /// PRG ROM data
    prg_rom: Vec<u8>,

    /// CHR ROM data, empty when the cartridge uses CHR RAM
    chr_rom: Vec<u8>,

    mapper_number: u8,

    /// Mirroring mode declared by the header
    mirroring: Mirroring,

    /// Whether the header advertises extended (battery-backed) CPU RAM
    extended_ram: bool,

    tv_system: TvSystem,
}

impl Cartridge {
    /// Load a cartridge from an iNES byte stream.
    ///
    /// The stream is consumed up to the end of the CHR ROM; trailing data is left
    /// unread. Every buffer is owned by locals until the image is complete, so a
    /// failure at any step drops whatever was already read.
    pub fn load<R: Read>(mut reader: R) -> Result<Self, LoadError> {
        let mut header = [0u8; INES_HEADER_SIZE];
        read_section(&mut reader, &mut header, LoadError::TruncatedHeader)?;

        if header[0..4] != INES_MAGIC {
            warn!(
                "Unexpected iNES signature: {:02X} {:02X} {:02X} {:02X}",
                header[0], header[1], header[2], header[3]
            );
        }

        let flags6 = header[6];
        let flags7 = header[7];

        if flags6 & flags6_bits::TRAINER != 0 {
            warn!("ROM carries a trainer block, which is not supported");
            return Err(LoadError::TrainerUnsupported);
        }

        let prg_banks = header[4] as usize;
        if prg_banks == 0 {
            return Err(LoadError::NoPrgBanks);
        }
        debug!("16KB PRG ROM banks: {}", prg_banks);

        let mut prg_rom = allocate(prg_banks * PRG_ROM_BANK_SIZE)?;
        read_section(&mut reader, &mut prg_rom, LoadError::TruncatedPrg)?;

        let chr_banks = header[5] as usize;
        debug!("8KB CHR ROM banks: {}", chr_banks);
        let chr_rom = if chr_banks == 0 {
            Vec::new()
        } else {
            let mut chr_rom = allocate(chr_banks * CHR_BANK_SIZE)?;
            read_section(&mut reader, &mut chr_rom, LoadError::TruncatedChr)?;
            chr_rom
        };

        let mirroring = if flags6 & flags6_bits::FOUR_SCREEN != 0 {
            Mirroring::FourScreen
        } else if flags6 & flags6_bits::VERTICAL_MIRRORING != 0 {
            Mirroring::Vertical
        } else {
            Mirroring::Horizontal
        };

        let mapper_number = ((flags6 >> 4) & 0x0F) | (flags7 & 0xF0);
        let extended_ram = flags6 & flags6_bits::EXTENDED_RAM != 0;
        let tv_system = TvSystem::from_header(&header);

        if tv_system.targets_pal() {
            warn!("Unsupported PAL ROM ({:?}); loading anyway", tv_system);
        }

        info!(
            "Loaded cartridge - Mapper: {}, PRG ROM: {}KB, CHR {}: {}KB, Mirroring: {:?}, Extended RAM: {}, TV: {:?}",
            mapper_number,
            prg_rom.len() / 1024,
            if chr_rom.is_empty() { "RAM" } else { "ROM" },
            chr_rom.len() / 1024,
            mirroring,
            extended_ram,
            tv_system
        );

        Ok(Cartridge {
            header,
            prg_rom,
            chr_rom,
            mapper_number,
            mirroring,
            extended_ram,
            tv_system,
        })
    }

    /// Create a cartridge from ROM data in iNES format
    pub fn from_bytes(data: &[u8]) -> Result<Self, LoadError> {
        Self::load(data)
    }

    /// Load a cartridge from an iNES file on disk
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let file = File::open(path.as_ref())?;
        Self::load(BufReader::new(file))
    }

    /// The raw 16-byte header
    pub fn header(&self) -> &[u8; INES_HEADER_SIZE] {
        &self.header
    }

    pub fn prg_rom(&self) -> &[u8] {
        &self.prg_rom
    }

    /// CHR ROM contents; empty when the cartridge relies on CHR RAM
    pub fn chr_rom(&self) -> &[u8] {
        &self.chr_rom
    }

    pub fn prg_bank_count(&self) -> usize {
        self.prg_rom.len() / PRG_ROM_BANK_SIZE
    }

    pub fn chr_bank_count(&self) -> usize {
        self.chr_rom.len() / CHR_BANK_SIZE
    }

    /// Whether graphics data must come from writable CHR RAM
    pub fn has_chr_ram(&self) -> bool {
        self.chr_rom.is_empty()
    }

    pub fn mapper_number(&self) -> u8 {
        self.mapper_number
    }

    /// Get the mirroring mode declared by the header
    pub fn mirroring(&self) -> Mirroring {
        self.mirroring
    }

    pub fn has_extended_ram(&self) -> bool {
        self.extended_ram
    }

    pub fn tv_system(&self) -> TvSystem {
        self.tv_system
    }
}

impl fmt::Debug for Cartridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cartridge")
            .field("mapper", &self.mapper_number)
            .field("mirroring", &self.mirroring)
            .field("prg_rom_size", &self.prg_rom.len())
            .field("chr_rom_size", &self.chr_rom.len())
            .field("chr_is_ram", &self.has_chr_ram())
            .field("extended_ram", &self.extended_ram)
            .field("tv_system", &self.tv_system)
            .finish()
    }
}

/// Fill `buf` from the reader, reporting a short read as `truncated`
fn read_section<R: Read>(reader: &mut R, buf: &mut [u8], truncated: LoadError) -> Result<(), LoadError> {
    reader.read_exact(buf).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            truncated
        } else {
            LoadError::Io(e)
        }
    })
}

/// Zeroed buffer of `size` bytes, reporting allocation failure instead of aborting
fn allocate(size: usize) -> Result<Vec<u8>, LoadError> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(size)
        .map_err(|_| LoadError::AllocationFailure(size))?;
    buffer.resize(size, 0);
    Ok(buffer)
}
