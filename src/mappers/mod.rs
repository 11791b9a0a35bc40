//! Mapper implementations for NES cartridges
//!
//! A mapper translates CPU (PRG) and PPU (CHR) addresses into offsets inside the
//! cartridge's ROM/RAM banks and owns whatever bank-select registers the chip has.
//! The cartridge image itself is shared and read-only; each mapper keeps only its
//! own switching state.

mod base; // unmapped kinds
mod mapper000; // NROM
mod mapper003; // CNROM
mod mapper007; // AxROM

pub use base::NullMapper;
pub use mapper000::Mapper000;
pub use mapper003::Mapper003;
pub use mapper007::Mapper007;

use std::fmt;
use std::rc::Rc;

use bincode::{Decode, Encode};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cartridge::{Cartridge, Mirroring};

/// Hook invoked with the new mode whenever a mapper changes name table mirroring
pub type MirroringCallback = Box<dyn FnMut(Mirroring)>;

/// Errors that can occur when constructing a mapper
#[derive(Error, Debug, PartialEq, Eq)]
pub enum MapperError {
    #[error("Mapper has neither CHR ROM nor CHR RAM to draw graphics from")]
    NoGraphicsSource,

    #[error("Unsupported mapper: {0}")]
    UnsupportedMapper(u8),
}

/// Mapper chips known by iNES number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapperKind {
    Nrom,
    SxRom,
    UxRom,
    CnRom,
    Mmc3,
    AxRom,
    ColorDreams,
    GxRom,
}

impl MapperKind {
    pub fn from_number(number: u8) -> Option<Self> {
        match number {
            0 => Some(MapperKind::Nrom),
            1 => Some(MapperKind::SxRom),
            2 => Some(MapperKind::UxRom),
            3 => Some(MapperKind::CnRom),
            4 => Some(MapperKind::Mmc3),
            7 => Some(MapperKind::AxRom),
            11 => Some(MapperKind::ColorDreams),
            66 => Some(MapperKind::GxRom),
            _ => None,
        }
    }

    pub fn number(self) -> u8 {
        match self {
            MapperKind::Nrom => 0,
            MapperKind::SxRom => 1,
            MapperKind::UxRom => 2,
            MapperKind::CnRom => 3,
            MapperKind::Mmc3 => 4,
            MapperKind::AxRom => 7,
            MapperKind::ColorDreams => 11,
            MapperKind::GxRom => 66,
        }
    }
}

impl fmt::Display for MapperKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} ({})", self, self.number())
    }
}

/// Bank-switching state of a mapper, as captured in a save state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub enum MapperState {
    Null,
    Nrom { chr_ram: Vec<u8> },
    Cnrom { chr_bank: u8 },
    Axrom { prg_bank: u8, mirroring: Mirroring, chr_ram: Vec<u8> },
}

/// Trait for NES mappers
pub trait Mapper {
    /// Which chip this mapper models
    fn kind(&self) -> MapperKind;

    /// The cartridge this mapper reads from
    fn cartridge(&self) -> &Cartridge;

    /// Read from PRG ROM/RAM
    fn read_prg(&self, addr: u16) -> u8;

    /// Write to PRG ROM/RAM (bank-select registers on most chips)
    fn write_prg(&mut self, addr: u16, value: u8);

    /// Read from CHR ROM/RAM
    fn read_chr(&self, addr: u16) -> u8;

    /// Write to CHR ROM/RAM
    fn write_chr(&mut self, addr: u16, value: u8);

    /// Get the current mirroring mode
    fn mirroring(&self) -> Mirroring {
        self.cartridge().mirroring()
    }

    /// Whether the cartridge provides extended CPU RAM
    fn has_extended_ram(&self) -> bool {
        self.cartridge().has_extended_ram()
    }

    /// Notify that a scanline has been completed
    fn notify_scanline(&mut self) {}

    /// Reset the mapper to its initial state
    fn reset(&mut self);

    /// Capture the bank-switching state
    fn save_state(&self) -> MapperState;

    /// Restore state captured by `save_state`; returns false if it belongs to another chip
    fn load_state(&mut self, state: &MapperState) -> bool;
}

/// Create a new mapper instance for the cartridge's mapper number.
///
/// `on_mirroring` is handed to chips that switch mirroring at runtime; others drop it.
pub fn create_mapper(
    cartridge: Rc<Cartridge>,
    on_mirroring: Option<MirroringCallback>,
) -> Result<Box<dyn Mapper>, MapperError> {
    let number = cartridge.mapper_number();
    let kind = MapperKind::from_number(number).ok_or(MapperError::UnsupportedMapper(number))?;

    let mapper: Box<dyn Mapper> = match kind {
        MapperKind::Nrom => Box::new(Mapper000::new(cartridge)?),
        MapperKind::CnRom => Box::new(Mapper003::new(cartridge)),
        MapperKind::AxRom => Box::new(Mapper007::new(cartridge, on_mirroring)?),
        _ => {
            warn!("Mapper {} is not implemented; using an unmapped placeholder", kind);
            Box::new(NullMapper::new(cartridge, kind))
        }
    };

    info!("Created mapper {}", kind);
    Ok(mapper)
}

/// Whether a saved CHR RAM image fits the live one; CHR ROM carts save an empty image
fn chr_ram_matches(live: Option<&Vec<u8>>, saved: &[u8]) -> bool {
    live.map_or(0, Vec::len) == saved.len()
}

/// Zeroed CHR RAM of `size` bytes, or `NoGraphicsSource` if it cannot be allocated
fn allocate_chr_ram(size: usize) -> Result<Vec<u8>, MapperError> {
    let mut chr_ram = Vec::new();
    chr_ram
        .try_reserve_exact(size)
        .map_err(|_| MapperError::NoGraphicsSource)?;
    chr_ram.resize(size, 0);
    Ok(chr_ram)
}
