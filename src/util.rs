//! Utility functions and helpers for the emulator core
//!
//! This module contains byte helpers shared by the CPU addressing modes and a
//! hexdump used by the command-line front end.

use std::fmt::Write;

/// Combine two 8-bit values into a 16-bit value (little-endian)
#[inline]
pub fn combine_bytes(low: u8, high: u8) -> u16 {
    u16::from_le_bytes([low, high])
}

/// Determine if a page boundary is crossed when adding an offset to an address
#[inline]
pub fn page_boundary_crossed(addr: u16, offset: u8) -> bool {
    (addr & 0xFF00) != (addr.wrapping_add(offset as u16) & 0xFF00)
}

/// Hexdump of a memory region, 16 bytes per line with an ASCII column
pub fn hexdump(data: &[u8], start_addr: u16) -> String {
    let mut out = String::new();
    for (i, chunk) in data.chunks(16).enumerate() {
        let addr = start_addr.wrapping_add((i * 16) as u16);
        let _ = write!(out, "{:04X}: ", addr);

        for (j, byte) in chunk.iter().enumerate() {
            let _ = write!(out, "{:02X} ", byte);
            if j == 7 {
                out.push(' ');
            }
        }

        // Padding for incomplete lines
        for _ in chunk.len()..16 {
            out.push_str("   ");
        }
        if chunk.len() <= 8 {
            out.push(' ');
        }

        out.push_str(" |");
        for &byte in chunk {
            if (0x20..0x7F).contains(&byte) {
                out.push(byte as char);
            } else {
                out.push('.');
            }
        }
        out.push_str("|\n");
    }
    out
}
