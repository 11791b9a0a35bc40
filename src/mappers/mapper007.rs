//! Mapper 007 (AxROM) implementation
//!
//! Switches the whole 32KB PRG window at once and selects one-screen name table
//! mirroring from the same register. Used by games like Battletoads, Marble Madness
//! and Wizards & Warriors.
//!
//! Memory map:
//! - PRG ROM: one of up to eight 32KB banks at 0x8000-0xFFFF
//! - CHR RAM: 8KB at 0x0000-0x1FFF (only when the cartridge ships no CHR ROM)
//!
//! Bank select ($8000-$FFFF): bits 0-2 pick the PRG bank, bit 4 picks the
//! name table (0 = lower, 1 = upper).

use std::rc::Rc;

use log::{debug, trace, warn};

use crate::cartridge::{Cartridge, Mirroring, CHR_BANK_SIZE};
use super::{allocate_chr_ram, chr_ram_matches, Mapper, MapperError, MapperKind, MapperState, MirroringCallback};

/// Size of the switchable PRG window (32KB)
const PRG_WINDOW_SIZE: usize = 0x8000;

pub struct Mapper007 {
    cartridge: Rc<Cartridge>,

    /// CHR RAM; absent when the cartridge provides CHR ROM
    chr_ram: Option<Vec<u8>>,

    /// Selected 32KB PRG bank (0-7)
    prg_bank: u8,

    /// One-screen mirroring selected by the last bank write
    mirroring: Mirroring,

    on_mirroring: Option<MirroringCallback>,
}

impl Mapper007 {
    /// Create a new Mapper007 instance.
    ///
    /// Fails with `NoGraphicsSource` when the cartridge has no CHR ROM and CHR
    /// RAM cannot be allocated.
    pub fn new(cartridge: Rc<Cartridge>, on_mirroring: Option<MirroringCallback>) -> Result<Self, MapperError> {
        if cartridge.prg_rom().len() < PRG_WINDOW_SIZE {
            warn!(
                "AxROM: PRG ROM is only {}KB; reads past it return 0",
                cartridge.prg_rom().len() / 1024
            );
        }

        let chr_ram = if cartridge.has_chr_ram() {
            debug!("AxROM: using 8KB of CHR RAM");
            Some(allocate_chr_ram(CHR_BANK_SIZE)?)
        } else {
            None
        };

        Ok(Mapper007 {
            cartridge,
            chr_ram,
            prg_bank: 0,
            mirroring: Mirroring::OneScreenLower,
            on_mirroring,
        })
    }

    pub fn prg_bank(&self) -> u8 {
        self.prg_bank
    }

    fn notify_mirroring(&mut self) {
        if let Some(callback) = self.on_mirroring.as_mut() {
            callback(self.mirroring);
        }
    }
}

impl Mapper for Mapper007 {
    fn kind(&self) -> MapperKind {
        MapperKind::AxRom
    }

    fn cartridge(&self) -> &Cartridge {
        &self.cartridge
    }

    fn read_prg(&self, addr: u16) -> u8 {
        let mapped_addr = self.prg_bank as usize * PRG_WINDOW_SIZE + (addr & 0x7FFF) as usize;
        match self.cartridge.prg_rom().get(mapped_addr) {
            Some(&value) => {
                trace!("AxROM: PRG read ${:05X} -> ${:02X}", mapped_addr, value);
                value
            }
            None => {
                warn!("AxROM: PRG read outside ROM at ${:05X}", mapped_addr);
                0
            }
        }
    }

    fn write_prg(&mut self, addr: u16, value: u8) {
        if addr < 0x8000 {
            return;
        }

        self.prg_bank = value & 0x07;
        self.mirroring = if value & 0x10 != 0 {
            Mirroring::OneScreenHigher
        } else {
            Mirroring::OneScreenLower
        };
        debug!("AxROM: selected PRG bank {}, mirroring {:?}", self.prg_bank, self.mirroring);

        // The register write re-asserts mirroring even when it is unchanged
        self.notify_mirroring();
    }

    fn read_chr(&self, addr: u16) -> u8 {
        let Some(ram) = self.chr_ram.as_ref() else {
            warn!("AxROM: no character RAM for read at ${:04X}", addr);
            return 0;
        };

        match ram.get(addr as usize) {
            Some(&value) => value,
            None => {
                warn!("AxROM: CHR read outside character RAM at ${:04X}", addr);
                0
            }
        }
    }

    fn write_chr(&mut self, addr: u16, value: u8) {
        let Some(ram) = self.chr_ram.as_mut() else {
            warn!("AxROM: no character RAM for write at ${:04X}", addr);
            return;
        };

        match ram.get_mut(addr as usize) {
            Some(cell) => *cell = value,
            None => warn!("AxROM: CHR write outside character RAM at ${:04X}", addr),
        }
    }

    fn mirroring(&self) -> Mirroring {
        self.mirroring
    }

    fn reset(&mut self) {
        self.prg_bank = 0;
        self.mirroring = Mirroring::OneScreenLower;
    }

    fn save_state(&self) -> MapperState {
        MapperState::Axrom {
            prg_bank: self.prg_bank,
            mirroring: self.mirroring,
            chr_ram: self.chr_ram.clone().unwrap_or_default(),
        }
    }

    fn load_state(&mut self, state: &MapperState) -> bool {
        let MapperState::Axrom { prg_bank, mirroring, chr_ram } = state else {
            return false;
        };

        if !chr_ram_matches(self.chr_ram.as_ref(), chr_ram) {
            warn!(
                "AxROM: saved CHR RAM is {} bytes, expected {}",
                chr_ram.len(),
                self.chr_ram.as_ref().map_or(0, Vec::len)
            );
            return false;
        }

        self.prg_bank = prg_bank & 0x07;
        self.mirroring = *mirroring;
        if let Some(ram) = self.chr_ram.as_mut() {
            ram.copy_from_slice(chr_ram);
        }
        self.notify_mirroring();
        true
    }
}
