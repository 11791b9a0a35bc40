//! Mapper 000 (NROM) implementation
//!
//! This is the simplest NES mapper with no banking capabilities.
//! Used by games like Super Mario Bros, Donkey Kong, etc.
//!
//! Memory map:
//! - PRG ROM: 16KB (0x8000-0xBFFF, mirrored at 0xC000-0xFFFF) or 32KB (0x8000-0xFFFF)
//! - CHR ROM/RAM: 8KB (0x0000-0x1FFF)

use std::rc::Rc;

use log::{debug, warn};

use crate::cartridge::{Cartridge, CHR_BANK_SIZE, PRG_ROM_BANK_SIZE};
use super::{allocate_chr_ram, chr_ram_matches, Mapper, MapperError, MapperKind, MapperState};

pub struct Mapper000 {
    cartridge: Rc<Cartridge>,

    /// CHR RAM, present only when the cartridge ships no CHR ROM
    chr_ram: Option<Vec<u8>>,

    /// PRG ROM mask for fast address calculation
    prg_mask: u16,
}

impl Mapper000 {
    /// Create a new Mapper000 instance
    pub fn new(cartridge: Rc<Cartridge>) -> Result<Self, MapperError> {
        let chr_ram = if cartridge.has_chr_ram() {
            debug!("NROM: using 8KB of CHR RAM");
            Some(allocate_chr_ram(CHR_BANK_SIZE)?)
        } else {
            None
        };

        // 16KB PRG ROM gets mirrored to fill the 32KB space
        let prg_mask = if cartridge.prg_rom().len() <= PRG_ROM_BANK_SIZE { 0x3FFF } else { 0x7FFF };

        Ok(Mapper000 {
            cartridge,
            chr_ram,
            prg_mask,
        })
    }
}

impl Mapper for Mapper000 {
    fn kind(&self) -> MapperKind {
        MapperKind::Nrom
    }

    fn cartridge(&self) -> &Cartridge {
        &self.cartridge
    }

    #[inline]
    fn read_prg(&self, addr: u16) -> u8 {
        let mapped_addr = (addr & self.prg_mask) as usize;
        self.cartridge.prg_rom().get(mapped_addr).copied().unwrap_or(0)
    }

    #[inline]
    fn write_prg(&mut self, _addr: u16, _value: u8) {
        // PRG ROM is read-only in NROM
    }

    #[inline]
    fn read_chr(&self, addr: u16) -> u8 {
        let mapped_addr = (addr & 0x1FFF) as usize;
        let chr = match &self.chr_ram {
            Some(ram) => ram.as_slice(),
            None => self.cartridge.chr_rom(),
        };
        chr.get(mapped_addr).copied().unwrap_or(0)
    }

    #[inline]
    fn write_chr(&mut self, addr: u16, value: u8) {
        if let Some(ram) = self.chr_ram.as_mut() {
            ram[(addr & 0x1FFF) as usize] = value;
        }
    }

    fn reset(&mut self) {
        // Nothing to reset in NROM
    }

    fn save_state(&self) -> MapperState {
        MapperState::Nrom {
            chr_ram: self.chr_ram.clone().unwrap_or_default(),
        }
    }

    fn load_state(&mut self, state: &MapperState) -> bool {
        match state {
            MapperState::Nrom { chr_ram } => {
                if !chr_ram_matches(self.chr_ram.as_ref(), chr_ram) {
                    warn!(
                        "NROM: saved CHR RAM is {} bytes, expected {}",
                        chr_ram.len(),
                        self.chr_ram.as_ref().map_or(0, Vec::len)
                    );
                    return false;
                }
                if let Some(ram) = self.chr_ram.as_mut() {
                    ram.copy_from_slice(chr_ram);
                }
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mappers::tests::test_cartridge;

    #[test]
    fn test_single_bank_mirrors_prg() {
        let mapper = Mapper000::new(test_cartridge(1, 1, 0)).unwrap();
        assert_eq!(mapper.read_prg(0x8000), mapper.read_prg(0xC000));
        assert_eq!(mapper.read_prg(0xBFFF), mapper.read_prg(0xFFFF));
    }

    #[test]
    fn test_two_banks_map_straight_through() {
        let mapper = Mapper000::new(test_cartridge(2, 1, 0)).unwrap();
        assert_eq!(mapper.read_prg(0x8000), 0);
        assert_eq!(mapper.read_prg(0xC000), 1);
    }

    #[test]
    fn test_prg_writes_ignored() {
        let mut mapper = Mapper000::new(test_cartridge(2, 1, 0)).unwrap();
        mapper.write_prg(0xC000, 0x55);
        assert_eq!(mapper.read_prg(0xC000), 1);
    }

    #[test]
    fn test_chr_rom_is_read_only() {
        let mut mapper = Mapper000::new(test_cartridge(1, 1, 0)).unwrap();
        mapper.write_chr(0x0010, 0x42);
        assert_eq!(mapper.read_chr(0x0010), 0x80);
    }

    #[test]
    fn test_chr_ram_is_writable() {
        let mut mapper = Mapper000::new(test_cartridge(1, 0, 0)).unwrap();
        assert_eq!(mapper.read_chr(0x1FFF), 0);
        mapper.write_chr(0x1FFF, 0x42);
        assert_eq!(mapper.read_chr(0x1FFF), 0x42);
    }

    #[test]
    fn test_state_restores_chr_ram() {
        let mut mapper = Mapper000::new(test_cartridge(1, 0, 0)).unwrap();
        mapper.write_chr(0x0100, 0x99);
        let state = mapper.save_state();

        mapper.write_chr(0x0100, 0x00);
        assert!(mapper.load_state(&state));
        assert_eq!(mapper.read_chr(0x0100), 0x99);
        assert!(!mapper.load_state(&MapperState::Cnrom { chr_bank: 1 }));
    }

    #[test]
    fn test_state_from_chr_rom_cart_rejected_by_chr_ram_cart() {
        let rom_state = Mapper000::new(test_cartridge(1, 1, 0)).unwrap().save_state();

        let mut mapper = Mapper000::new(test_cartridge(1, 0, 0)).unwrap();
        mapper.write_chr(0x0100, 0x99);
        assert!(!mapper.load_state(&rom_state));
        assert_eq!(mapper.read_chr(0x0100), 0x99);
    }
}
