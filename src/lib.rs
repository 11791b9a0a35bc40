//! rustyNES core
//!
//! The memory-addressing backbone of the emulator: iNES cartridge loading, the
//! mapper chips that translate PRG/CHR addresses into ROM/RAM banks, the CPU
//! memory bus and the 6502 addressing modes. Instruction execution, the PPU and
//! the APU consume these interfaces.

pub mod cartridge;
pub mod cpu;
pub mod mappers;
pub mod memory;
pub mod savestate;
pub mod util;

pub use cartridge::{Cartridge, LoadError, Mirroring, TvSystem};
pub use cpu::{AddressingMode, Cpu};
pub use mappers::{create_mapper, Mapper, MapperError, MapperKind, MapperState, MirroringCallback};
pub use memory::{Bus, MemoryBus};
pub use savestate::{SaveState, SaveStateError};
