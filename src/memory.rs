use std::cmp::Ordering;

use crate::runtime::{Fault, Space};

/// LS-8 can address 256 bytes of memory.
pub const MEMORY_SIZE: usize = 0x100;
pub const REGISTER_COUNT: usize = 8;
/// R7 is reserved for the stack pointer.
pub const SP: u8 = 7;
/// Stack grows down from here, leaving the top of memory free for other data.
pub const STACK_START: u8 = 0xF4;

/// Flat, zero-initialised system memory.
pub struct Memory {
    bytes: [u8; MEMORY_SIZE],
}

impl Memory {
    pub fn new() -> Self {
        Memory {
            bytes: [0; MEMORY_SIZE],
        }
    }

    pub fn read(&self, addr: u16) -> Result<u8, Fault> {
        self.get(addr).ok_or(Fault::OutOfBounds {
            space: Space::Memory,
            address: addr,
        })
    }

    pub fn write(&mut self, addr: u16, value: u8) -> Result<(), Fault> {
        let slot = self.bytes.get_mut(addr as usize).ok_or(Fault::OutOfBounds {
            space: Space::Memory,
            address: addr,
        })?;
        *slot = value;
        Ok(())
    }

    /// Read without faulting, for diagnostics.
    pub fn get(&self, addr: u16) -> Option<u8> {
        self.bytes.get(addr as usize).copied()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

/// 8x 8-bit registers. Arithmetic on them wraps.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Registers([u8; REGISTER_COUNT]);

impl Registers {
    pub fn new() -> Self {
        let mut reg = [0; REGISTER_COUNT];
        reg[SP as usize] = STACK_START;
        Registers(reg)
    }

    pub fn get(&self, index: u8) -> Result<u8, Fault> {
        self.0
            .get(index as usize)
            .copied()
            .ok_or(Fault::OutOfBounds {
                space: Space::Register,
                address: index as u16,
            })
    }

    pub fn set(&mut self, index: u8, value: u8) -> Result<(), Fault> {
        let reg = self.0.get_mut(index as usize).ok_or(Fault::OutOfBounds {
            space: Space::Register,
            address: index as u16,
        })?;
        *reg = value;
        Ok(())
    }

    #[inline]
    pub fn sp(&self) -> u8 {
        self.0[SP as usize]
    }

    #[inline]
    pub fn set_sp(&mut self, value: u8) {
        self.0[SP as usize] = value;
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of the most recent `CMP`.
///
/// Only one relation can hold between two bytes, so the flags register is
/// modelled as a single value rather than three independent bits.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Flag {
    L = 0b100,
    G = 0b010,
    E = 0b001,
    #[default]
    Uninit = 0b000,
}

impl Flag {
    pub fn compare(a: u8, b: u8) -> Flag {
        match a.cmp(&b) {
            Ordering::Less => Flag::L,
            Ordering::Equal => Flag::E,
            Ordering::Greater => Flag::G,
        }
    }

    /// Flags register as stored in hardware: `00000LGE`.
    pub fn bits(self) -> u8 {
        self as u8
    }

    pub fn is_equal(self) -> bool {
        self == Flag::E
    }
}
