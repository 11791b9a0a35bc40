//! Mapper 003 (CNROM) implementation
//!
//! This mapper features CHR ROM banking with fixed PRG ROM.
//! Used by games like Adventure Island, Paperboy, Defender II, etc.
//!
//! Memory map:
//! - PRG ROM: 16KB (mirrored) or 32KB, fixed at 0x8000-0xFFFF
//! - CHR ROM: four switchable 8KB banks at 0x0000-0x1FFF
//!
//! Any write to 0x8000-0xFFFF selects the CHR bank from its low two bits. CHR is
//! always ROM on this board; there is no CHR RAM fallback.

use std::rc::Rc;

use log::{debug, trace, warn};

use crate::cartridge::{Cartridge, PRG_ROM_BANK_SIZE};
use super::{Mapper, MapperKind, MapperState};

pub struct Mapper003 {
    cartridge: Rc<Cartridge>,

    /// Current CHR ROM bank (0-3)
    chr_bank: u8,

    /// PRG ROM is a single 16KB bank mirrored across the 32KB window
    single_bank: bool,
}

impl Mapper003 {
    /// Create a new Mapper003 instance
    pub fn new(cartridge: Rc<Cartridge>) -> Self {
        let single_bank = cartridge.prg_rom().len() == PRG_ROM_BANK_SIZE;
        if cartridge.has_chr_ram() {
            warn!("CNROM cartridge without CHR ROM; all pattern reads will return 0");
        }

        Mapper003 {
            cartridge,
            chr_bank: 0,
            single_bank,
        }
    }

    pub fn chr_bank(&self) -> u8 {
        self.chr_bank
    }

    pub fn is_single_bank(&self) -> bool {
        self.single_bank
    }
}

impl Mapper for Mapper003 {
    fn kind(&self) -> MapperKind {
        MapperKind::CnRom
    }

    fn cartridge(&self) -> &Cartridge {
        &self.cartridge
    }

    fn read_prg(&self, addr: u16) -> u8 {
        let offset = addr.wrapping_sub(0x8000);
        let mapped_addr = (if self.single_bank { offset & 0x3FFF } else { offset }) as usize;
        match self.cartridge.prg_rom().get(mapped_addr) {
            Some(&value) => {
                trace!("CNROM: PRG read ${:04X} -> ${:02X}", mapped_addr, value);
                value
            }
            None => {
                warn!("CNROM: PRG read outside ROM at ${:04X}", addr);
                0
            }
        }
    }

    fn write_prg(&mut self, addr: u16, value: u8) {
        // CHR bank select (ignore address, only data matters)
        self.chr_bank = value & 0x03;
        debug!("CNROM: selected CHR bank {} (write to ${:04X})", self.chr_bank, addr);
    }

    fn read_chr(&self, addr: u16) -> u8 {
        let chr_rom = self.cartridge.chr_rom();
        if chr_rom.is_empty() {
            warn!("CNROM: no CHR ROM for read at ${:04X}", addr);
            return 0;
        }

        let mapped_addr = (addr as usize) | ((self.chr_bank as usize) << 13);
        match chr_rom.get(mapped_addr) {
            Some(&value) => value,
            None => {
                warn!("CNROM: CHR read outside ROM at ${:05X}", mapped_addr);
                0
            }
        }
    }

    fn write_chr(&mut self, addr: u16, value: u8) {
        trace!("CNROM: ignored write of ${:02X} to read-only CHR at ${:04X}", value, addr);
    }

    fn reset(&mut self) {
        self.chr_bank = 0;
    }

    fn save_state(&self) -> MapperState {
        MapperState::Cnrom { chr_bank: self.chr_bank }
    }

    fn load_state(&mut self, state: &MapperState) -> bool {
        match state {
            MapperState::Cnrom { chr_bank } => {
                self.chr_bank = chr_bank & 0x03;
                true
            }
            _ => false,
        }
    }
}
