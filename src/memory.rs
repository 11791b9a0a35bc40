//! CPU memory bus
//!
//! The CPU sees a flat 16-bit address space (0x0000 - 0xFFFF). This bus backs the
//! whole range with 64KB of RAM so that the addressing modes can be exercised
//! without the PPU/APU register windows or cartridge space wired in.

use log::{debug, trace};

/// Size of the addressable space (64KB)
pub const RAM_SIZE: usize = 0x10000;

/// Anything the CPU can read from and write to
pub trait Bus {
    /// Read a byte from memory at the specified address
    fn read(&mut self, addr: u16) -> u8;

    /// Write a byte to memory at the specified address
    fn write(&mut self, addr: u16, value: u8);
}

/// Represents the memory bus connecting the CPU to its RAM
pub struct MemoryBus {
    /// Flat RAM, exclusively owned by the bus
    ram: Box<[u8]>,
}

impl MemoryBus {
    /// Create a new memory bus with zeroed RAM
    pub fn new() -> Self {
        MemoryBus {
            ram: vec![0; RAM_SIZE].into_boxed_slice(),
        }
    }

    /// Reset the memory bus
    pub fn reset(&mut self) {
        self.ram.fill(0);
    }

    /// Copy `data` into RAM starting at `addr`, wrapping at the top of the address space
    pub fn load(&mut self, addr: u16, data: &[u8]) {
        let mut target = addr;
        for &byte in data {
            self.write(target, byte);
            target = target.wrapping_add(1);
        }
        debug!("Loaded {} bytes at ${:04X}", data.len(), addr);
    }

    /// Snapshot of the whole RAM
    pub fn ram(&self) -> &[u8] {
        &self.ram
    }

    /// Overwrite RAM from a snapshot; returns false if the size does not match
    pub fn load_ram(&mut self, data: &[u8]) -> bool {
        if data.len() != self.ram.len() {
            return false;
        }
        self.ram.copy_from_slice(data);
        true
    }
}

impl Default for MemoryBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus for MemoryBus {
    fn read(&mut self, addr: u16) -> u8 {
        // Always in range for a 64KB bus; kept so a smaller RAM window stays safe
        match self.ram.get(addr as usize) {
            Some(&value) => value,
            None => {
                trace!("Read from unmapped address: ${:04X}", addr);
                0
            }
        }
    }

    fn write(&mut self, addr: u16, value: u8) {
        match self.ram.get_mut(addr as usize) {
            Some(cell) => *cell = value,
            None => trace!("Write to unmapped address: ${:04X} = ${:02X}", addr, value),
        }
    }
}
