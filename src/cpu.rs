//! Effective-address computation for the Ricoh 2A03 (modified MOS 6502)
//!
//! Each addressing mode consumes exactly the operand bytes the instruction set
//! defines for it, advances the program counter past them and leaves its result
//! in `abs_addr` (or `rel_addr` for branches). The return value says whether the
//! mode costs an extra cycle because indexing crossed a page boundary.
//!
//! Opcode decode and execution live outside this module; they drive the modes
//! through `Cpu::resolve`.

use log::trace;

use crate::memory::Bus;
use crate::util::{combine_bytes, page_boundary_crossed};

/// Addressing modes for CPU instructions
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AddressingMode {
    Implied,
    Immediate,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Relative,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    Indirect,
    IndexedIndirect,  // (Indirect,X)
    IndirectIndexed,  // (Indirect),Y
}

/// CPU register block used by the addressing modes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cpu {
    /// Program counter
    pub pc: u16,
    /// Effective address produced by the last addressing mode
    pub abs_addr: u16,
    /// Sign-extended branch offset produced by `Relative`
    pub rel_addr: u16,
    /// Accumulator register
    pub a: u8,
    /// X index register
    pub x: u8,
    /// Y index register
    pub y: u8,
    /// Operand fetched for the current instruction
    pub fetched: u8,
}

impl Cpu {
    /// Create a new CPU with every register cleared
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset the CPU to its initial state
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn read<B: Bus>(&self, bus: &mut B, addr: u16) -> u8 {
        bus.read(addr)
    }

    pub fn write<B: Bus>(&self, bus: &mut B, addr: u16, value: u8) {
        bus.write(addr, value);
    }

    /// Read the byte at PC and step past it
    fn next_byte<B: Bus>(&mut self, bus: &mut B) -> u8 {
        let value = bus.read(self.pc);
        self.pc = self.pc.wrapping_add(1);
        value
    }

    /// Read a little-endian word at PC and step past it
    fn next_word<B: Bus>(&mut self, bus: &mut B) -> u16 {
        let low = self.next_byte(bus);
        let high = self.next_byte(bus);
        combine_bytes(low, high)
    }

    /// Run the given addressing mode; true means an extra cycle is due
    pub fn resolve<B: Bus>(&mut self, mode: AddressingMode, bus: &mut B) -> bool {
        let extra_cycle = match mode {
            AddressingMode::Implied => self.implied(),
            AddressingMode::Immediate => self.immediate(),
            AddressingMode::ZeroPage => self.zero_page(bus),
            AddressingMode::ZeroPageX => self.zero_page_x(bus),
            AddressingMode::ZeroPageY => self.zero_page_y(bus),
            AddressingMode::Relative => self.relative(bus),
            AddressingMode::Absolute => self.absolute(bus),
            AddressingMode::AbsoluteX => self.absolute_x(bus),
            AddressingMode::AbsoluteY => self.absolute_y(bus),
            AddressingMode::Indirect => self.indirect(bus),
            AddressingMode::IndexedIndirect => self.indexed_indirect(bus),
            AddressingMode::IndirectIndexed => self.indirect_indexed(bus),
        };
        trace!(
            "{:?}: abs=${:04X} rel=${:04X} pc=${:04X} extra={}",
            mode, self.abs_addr, self.rel_addr, self.pc, extra_cycle
        );
        extra_cycle
    }

    /// Load `fetched` with the operand the last mode resolved to
    pub fn fetch<B: Bus>(&mut self, mode: AddressingMode, bus: &mut B) -> u8 {
        if mode != AddressingMode::Implied {
            self.fetched = bus.read(self.abs_addr);
        }
        self.fetched
    }

    /// Operand is the accumulator
    pub fn implied(&mut self) -> bool {
        self.fetched = self.a;
        false
    }

    /// Operand is the byte following the opcode
    pub fn immediate(&mut self) -> bool {
        self.abs_addr = self.pc;
        self.pc = self.pc.wrapping_add(1);
        false
    }

    pub fn zero_page<B: Bus>(&mut self, bus: &mut B) -> bool {
        self.abs_addr = self.next_byte(bus) as u16 & 0x00FF;
        false
    }

    /// Zero page indexed by X, wrapping within page zero
    pub fn zero_page_x<B: Bus>(&mut self, bus: &mut B) -> bool {
        let base = self.next_byte(bus);
        self.abs_addr = (base as u16 + self.x as u16) & 0x00FF;
        false
    }

    /// Zero page indexed by Y, wrapping within page zero
    pub fn zero_page_y<B: Bus>(&mut self, bus: &mut B) -> bool {
        let base = self.next_byte(bus);
        self.abs_addr = (base as u16 + self.y as u16) & 0x00FF;
        false
    }

    pub fn absolute<B: Bus>(&mut self, bus: &mut B) -> bool {
        self.abs_addr = self.next_word(bus);
        false
    }

    pub fn absolute_x<B: Bus>(&mut self, bus: &mut B) -> bool {
        let base = self.next_word(bus);
        self.abs_addr = base.wrapping_add(self.x as u16);
        page_boundary_crossed(base, self.x)
    }

    pub fn absolute_y<B: Bus>(&mut self, bus: &mut B) -> bool {
        let base = self.next_word(bus);
        self.abs_addr = base.wrapping_add(self.y as u16);
        page_boundary_crossed(base, self.y)
    }

    /// 16-bit pointer dereference (JMP only).
    ///
    /// A pointer whose low byte is $FF takes its high byte from the start of the
    /// same page, as the hardware does.
    pub fn indirect<B: Bus>(&mut self, bus: &mut B) -> bool {
        let ptr = self.next_word(bus);
        let low = bus.read(ptr);
        let high = if ptr & 0x00FF == 0x00FF {
            bus.read(ptr & 0xFF00)
        } else {
            bus.read(ptr.wrapping_add(1))
        };
        self.abs_addr = combine_bytes(low, high);
        false
    }

    /// (zp,X): pointer in page zero, offset by X before dereferencing
    pub fn indexed_indirect<B: Bus>(&mut self, bus: &mut B) -> bool {
        let ptr = self.next_byte(bus).wrapping_add(self.x);
        let low = bus.read(ptr as u16);
        let high = bus.read(ptr.wrapping_add(1) as u16);
        self.abs_addr = combine_bytes(low, high);
        false
    }

    /// (zp),Y: pointer in page zero dereferenced, then offset by Y
    pub fn indirect_indexed<B: Bus>(&mut self, bus: &mut B) -> bool {
        let ptr = self.next_byte(bus);
        let low = bus.read(ptr as u16);
        let high = bus.read(ptr.wrapping_add(1) as u16);
        let base = combine_bytes(low, high);
        self.abs_addr = base.wrapping_add(self.y as u16);
        page_boundary_crossed(base, self.y)
    }

    /// Signed branch offset, sign-extended into `rel_addr`
    pub fn relative<B: Bus>(&mut self, bus: &mut B) -> bool {
        let mut offset = self.next_byte(bus) as u16;
        if offset & 0x0080 != 0 {
            offset |= 0xFF00;
        }
        self.rel_addr = offset;
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryBus;

    /// CPU at $8000 with the operand bytes placed right after it
    fn setup(operands: &[u8]) -> (Cpu, MemoryBus) {
        let mut bus = MemoryBus::new();
        bus.load(0x8000, operands);
        let cpu = Cpu { pc: 0x8000, ..Cpu::new() };
        (cpu, bus)
    }

    #[test]
    fn test_implied_takes_accumulator() {
        let (mut cpu, mut bus) = setup(&[]);
        cpu.a = 0x42;
        assert!(!cpu.resolve(AddressingMode::Implied, &mut bus));
        assert_eq!(cpu.fetched, 0x42);
        assert_eq!(cpu.fetch(AddressingMode::Implied, &mut bus), 0x42);
        assert_eq!(cpu.pc, 0x8000);
    }

    #[test]
    fn test_immediate() {
        let (mut cpu, mut bus) = setup(&[0x99]);
        assert!(!cpu.resolve(AddressingMode::Immediate, &mut bus));
        assert_eq!(cpu.abs_addr, 0x8000);
        assert_eq!(cpu.pc, 0x8001);
        assert_eq!(cpu.fetch(AddressingMode::Immediate, &mut bus), 0x99);
    }

    #[test]
    fn test_zero_page() {
        let (mut cpu, mut bus) = setup(&[0x34]);
        assert!(!cpu.resolve(AddressingMode::ZeroPage, &mut bus));
        assert_eq!(cpu.abs_addr, 0x0034);
        assert_eq!(cpu.pc, 0x8001);
    }

    #[test]
    fn test_zero_page_indexed_wraps() {
        let (mut cpu, mut bus) = setup(&[0xF0, 0xF0]);
        cpu.x = 0x20;
        cpu.y = 0x0F;
        assert!(!cpu.resolve(AddressingMode::ZeroPageX, &mut bus));
        assert_eq!(cpu.abs_addr, 0x0010);
        assert!(!cpu.resolve(AddressingMode::ZeroPageY, &mut bus));
        assert_eq!(cpu.abs_addr, 0x00FF);
        assert_eq!(cpu.pc, 0x8002);
    }

    #[test]
    fn test_absolute_little_endian() {
        let (mut cpu, mut bus) = setup(&[0x34, 0x12]);
        assert!(!cpu.resolve(AddressingMode::Absolute, &mut bus));
        assert_eq!(cpu.abs_addr, 0x1234);
        assert_eq!(cpu.pc, 0x8002);
    }

    #[test]
    fn test_absolute_x_page_cross() {
        let (mut cpu, mut bus) = setup(&[0x10, 0x12, 0xF0, 0x12]);
        cpu.x = 0x05;
        assert!(!cpu.resolve(AddressingMode::AbsoluteX, &mut bus));
        assert_eq!(cpu.abs_addr, 0x1215);

        cpu.x = 0x20;
        assert!(cpu.resolve(AddressingMode::AbsoluteX, &mut bus));
        assert_eq!(cpu.abs_addr, 0x1310);
        assert_eq!(cpu.pc, 0x8004);
    }

    #[test]
    fn test_absolute_y_page_cross() {
        let (mut cpu, mut bus) = setup(&[0xFF, 0x12, 0x00, 0x12, 0xFF, 0xFF]);
        cpu.y = 0x01;
        assert!(cpu.resolve(AddressingMode::AbsoluteY, &mut bus));
        assert_eq!(cpu.abs_addr, 0x1300);

        cpu.y = 0xFF;
        assert!(!cpu.resolve(AddressingMode::AbsoluteY, &mut bus));
        assert_eq!(cpu.abs_addr, 0x12FF);

        // Wrapping off the top of memory is also a page change
        cpu.y = 0x01;
        assert!(cpu.resolve(AddressingMode::AbsoluteY, &mut bus));
        assert_eq!(cpu.abs_addr, 0x0000);
    }

    #[test]
    fn test_extra_cycle_iff_index_carries() {
        for low in [0x00u8, 0x80, 0xFE, 0xFF] {
            for index in [0x00u8, 0x01, 0x7F, 0xFF] {
                let (mut cpu, mut bus) = setup(&[low, 0x40]);
                cpu.x = index;
                let crossed = cpu.resolve(AddressingMode::AbsoluteX, &mut bus);
                assert_eq!(crossed, low as u16 + index as u16 > 0xFF, "low={low:02X} x={index:02X}");
            }
        }
    }

    #[test]
    fn test_indirect() {
        let (mut cpu, mut bus) = setup(&[0x20, 0x01]);
        bus.write(0x0120, 0xFC);
        bus.write(0x0121, 0xBA);
        assert!(!cpu.resolve(AddressingMode::Indirect, &mut bus));
        assert_eq!(cpu.abs_addr, 0xBAFC);
        assert_eq!(cpu.pc, 0x8002);
    }

    #[test]
    fn test_indirect_page_wrap_bug() {
        let (mut cpu, mut bus) = setup(&[0xFF, 0x02]);
        bus.write(0x02FF, 0x34);
        bus.write(0x0200, 0x12);
        bus.write(0x0300, 0x56);
        cpu.resolve(AddressingMode::Indirect, &mut bus);
        assert_eq!(cpu.abs_addr, 0x1234);
    }

    #[test]
    fn test_indexed_indirect_wraps_in_zero_page() {
        let (mut cpu, mut bus) = setup(&[0x20, 0xF0]);
        cpu.x = 0x04;
        bus.write(0x0024, 0x74);
        bus.write(0x0025, 0x20);
        assert!(!cpu.resolve(AddressingMode::IndexedIndirect, &mut bus));
        assert_eq!(cpu.abs_addr, 0x2074);

        // $F0 + $0F = $FF: high byte comes from $00
        cpu.x = 0x0F;
        bus.write(0x00FF, 0x11);
        bus.write(0x0000, 0x22);
        bus.write(0x0100, 0x33);
        assert!(!cpu.resolve(AddressingMode::IndexedIndirect, &mut bus));
        assert_eq!(cpu.abs_addr, 0x2211);
        assert_eq!(cpu.pc, 0x8002);
    }

    #[test]
    fn test_indirect_indexed() {
        let (mut cpu, mut bus) = setup(&[0x86, 0x86]);
        bus.write(0x0086, 0x28);
        bus.write(0x0087, 0x40);
        cpu.y = 0x10;
        assert!(!cpu.resolve(AddressingMode::IndirectIndexed, &mut bus));
        assert_eq!(cpu.abs_addr, 0x4038);

        cpu.y = 0xE0;
        assert!(cpu.resolve(AddressingMode::IndirectIndexed, &mut bus));
        assert_eq!(cpu.abs_addr, 0x4108);
    }

    #[test]
    fn test_indirect_indexed_pointer_wraps() {
        let (mut cpu, mut bus) = setup(&[0xFF]);
        bus.write(0x00FF, 0x00);
        bus.write(0x0000, 0x30);
        bus.write(0x0100, 0x99);
        cpu.resolve(AddressingMode::IndirectIndexed, &mut bus);
        assert_eq!(cpu.abs_addr, 0x3000);
    }

    #[test]
    fn test_relative_sign_extension() {
        let (mut cpu, mut bus) = setup(&[0x05, 0xFB, 0x80]);
        cpu.resolve(AddressingMode::Relative, &mut bus);
        assert_eq!(cpu.rel_addr, 0x0005);
        cpu.resolve(AddressingMode::Relative, &mut bus);
        assert_eq!(cpu.rel_addr, 0xFFFB);
        assert_eq!(cpu.pc.wrapping_add(cpu.rel_addr), 0x7FFD);
        cpu.resolve(AddressingMode::Relative, &mut bus);
        assert_eq!(cpu.rel_addr, 0xFF80);
        assert_eq!(cpu.pc, 0x8003);
    }

    #[test]
    fn test_pc_wraps_at_top_of_memory() {
        let mut bus = MemoryBus::new();
        bus.write(0xFFFF, 0x34);
        bus.write(0x0000, 0x12);
        let mut cpu = Cpu { pc: 0xFFFF, ..Cpu::new() };
        cpu.resolve(AddressingMode::Absolute, &mut bus);
        assert_eq!(cpu.abs_addr, 0x1234);
        assert_eq!(cpu.pc, 0x0001);
    }

    #[test]
    fn test_reset_clears_registers() {
        let mut cpu = Cpu { pc: 0x1234, a: 1, x: 2, y: 3, ..Cpu::new() };
        cpu.reset();
        assert_eq!(cpu, Cpu::new());
    }
}
