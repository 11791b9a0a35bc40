//! Save state implementation
//!
//! Captures the CPU registers, the bus RAM and the active mapper's bank-switching
//! state so a session can be frozen and resumed. The cartridge image is not part
//! of the state; a save state is only meaningful against the same ROM.
//!
//! Save states are versioned to ensure compatibility across different versions
//! of the emulator. Files are serialized using bincode with Serde.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use bincode::{decode_from_std_read, encode_into_std_write};
use bincode::{Decode, Encode};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cpu::Cpu;
use crate::mappers::{Mapper, MapperKind, MapperState};
use crate::memory::{MemoryBus, RAM_SIZE};

/// Current save state format version
const CURRENT_SAVE_STATE_VERSION: u32 = 1;

/// Upper bound on an encoded state: the RAM snapshot plus room for the largest mapper state
const SAVE_STATE_LIMIT: usize = RAM_SIZE + 0x4000;

/// Errors that can occur during save state operations
#[derive(Error, Debug)]
pub enum SaveStateError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] bincode::error::EncodeError),

    #[error("Deserialization error: {0}")]
    DeserializationError(#[from] bincode::error::DecodeError),

    #[error("Incompatible save state version: found {0}, expected {1}")]
    IncompatibleVersion(u32, u32),

    #[error("Save state does not match mapper {0}")]
    MapperMismatch(MapperKind),

    #[error("Invalid save state data")]
    InvalidData,
}

/// CPU state data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct CpuState {
    pc: u16,
    abs_addr: u16,
    rel_addr: u16,
    a: u8,
    x: u8,
    y: u8,
    fetched: u8,
}

impl From<&Cpu> for CpuState {
    fn from(cpu: &Cpu) -> Self {
        CpuState {
            pc: cpu.pc,
            abs_addr: cpu.abs_addr,
            rel_addr: cpu.rel_addr,
            a: cpu.a,
            x: cpu.x,
            y: cpu.y,
            fetched: cpu.fetched,
        }
    }
}

impl CpuState {
    fn apply(&self, cpu: &mut Cpu) {
        cpu.pc = self.pc;
        cpu.abs_addr = self.abs_addr;
        cpu.rel_addr = self.rel_addr;
        cpu.a = self.a;
        cpu.x = self.x;
        cpu.y = self.y;
        cpu.fetched = self.fetched;
    }
}

/// Save state data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct SaveState {
    /// Save state format version
    version: u32,

    /// CPU state
    cpu: CpuState,

    /// Bus RAM contents
    ram: Vec<u8>,

    /// Mapper bank state
    mapper: MapperState,
}

/// Bincode configuration shared by every save state
fn config() -> impl bincode::config::Config {
    bincode::config::standard().with_limit::<SAVE_STATE_LIMIT>()
}

impl SaveState {
    /// Capture the current state of a session
    pub fn capture(cpu: &Cpu, bus: &MemoryBus, mapper: &dyn Mapper) -> Self {
        SaveState {
            version: CURRENT_SAVE_STATE_VERSION,
            cpu: CpuState::from(cpu),
            ram: bus.ram().to_vec(),
            mapper: mapper.save_state(),
        }
    }

    /// Mapper bank state carried by this snapshot
    pub fn mapper_state(&self) -> &MapperState {
        &self.mapper
    }

    /// Apply this state to live components.
    ///
    /// Nothing is modified unless the RAM size and mapper kind both match.
    pub fn restore(&self, cpu: &mut Cpu, bus: &mut MemoryBus, mapper: &mut dyn Mapper) -> Result<(), SaveStateError> {
        if self.ram.len() != RAM_SIZE {
            return Err(SaveStateError::InvalidData);
        }
        if !mapper.load_state(&self.mapper) {
            warn!("Save state does not belong to mapper {}", mapper.kind());
            return Err(SaveStateError::MapperMismatch(mapper.kind()));
        }

        self.cpu.apply(cpu);
        bus.load_ram(&self.ram);
        Ok(())
    }

    /// Serialize the state using bincode
    pub fn to_bytes(&self) -> Result<Vec<u8>, SaveStateError> {
        let mut buffer = Vec::new();
        encode_into_std_write(self, &mut buffer, config())?;
        Ok(buffer)
    }

    /// Deserialize a state, rejecting other format versions
    pub fn from_bytes(data: &[u8]) -> Result<Self, SaveStateError> {
        let state: SaveState = decode_from_std_read(&mut &*data, config())?;
        if state.version != CURRENT_SAVE_STATE_VERSION {
            return Err(SaveStateError::IncompatibleVersion(state.version, CURRENT_SAVE_STATE_VERSION));
        }
        Ok(state)
    }

    /// Save state to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), SaveStateError> {
        let data = self.to_bytes()?;
        let mut file = File::create(path.as_ref())?;
        file.write_all(&data)?;

        info!("Save state written to {}", path.as_ref().display());
        Ok(())
    }

    /// Load state from a file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, SaveStateError> {
        let mut file = File::open(path.as_ref())?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;

        let state = Self::from_bytes(&data)?;
        info!("Save state loaded from {}", path.as_ref().display());
        Ok(state)
    }
}
