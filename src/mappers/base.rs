//! Placeholder mapper for chips that are declared but not modelled
//!
//! Performs no address translation: every read returns 0 and every write is
//! dropped, with the access logged. Mirroring and extended RAM come straight
//! from the cartridge header.

use std::rc::Rc;

use log::trace;

use crate::cartridge::Cartridge;
use super::{Mapper, MapperKind, MapperState};

pub struct NullMapper {
    cartridge: Rc<Cartridge>,
    kind: MapperKind,
}

impl NullMapper {
    pub fn new(cartridge: Rc<Cartridge>, kind: MapperKind) -> Self {
        NullMapper { cartridge, kind }
    }
}

impl Mapper for NullMapper {
    fn kind(&self) -> MapperKind {
        self.kind
    }

    fn cartridge(&self) -> &Cartridge {
        &self.cartridge
    }

    fn read_prg(&self, addr: u16) -> u8 {
        trace!("Mapper {}: unmapped PRG read at ${:04X}", self.kind, addr);
        0
    }

    fn write_prg(&mut self, addr: u16, value: u8) {
        trace!("Mapper {}: unmapped PRG write ${:04X} = ${:02X}", self.kind, addr, value);
    }

    fn read_chr(&self, addr: u16) -> u8 {
        trace!("Mapper {}: unmapped CHR read at ${:04X}", self.kind, addr);
        0
    }

    fn write_chr(&mut self, addr: u16, value: u8) {
        trace!("Mapper {}: unmapped CHR write ${:04X} = ${:02X}", self.kind, addr, value);
    }

    fn reset(&mut self) {}

    fn save_state(&self) -> MapperState {
        MapperState::Null
    }

    fn load_state(&mut self, state: &MapperState) -> bool {
        matches!(state, MapperState::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::Mirroring;
    use crate::mappers::tests::test_cartridge;

    #[test]
    fn test_null_mapper_reads_zero() {
        let mut mapper = NullMapper::new(test_cartridge(1, 1, 2), MapperKind::UxRom);
        mapper.write_prg(0x8000, 0xFF);
        mapper.write_chr(0x0000, 0xFF);
        assert_eq!(mapper.read_prg(0x8000), 0);
        assert_eq!(mapper.read_chr(0x0000), 0);
    }

    #[test]
    fn test_null_mapper_forwards_header_fields() {
        let mapper = NullMapper::new(test_cartridge(1, 1, 2), MapperKind::UxRom);
        assert_eq!(mapper.mirroring(), Mirroring::Horizontal);
        assert!(!mapper.has_extended_ram());
    }
}
