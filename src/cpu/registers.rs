//! Register file and condition flags.
//!
//! The machine has:
//! - R0..R7: eight general-purpose 16-bit registers
//! - PC: program counter
//! - RR: link register holding the return address for JSR/RET
//! - N/P/Z: condition flags

use serde::{Serialize, Deserialize};

/// Number of general-purpose registers.
pub const NUM_REGS: usize = 8;

/// Index of a general-purpose register, always in 0..8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct RegIndex(u8);

impl RegIndex {
    pub const R0: RegIndex = RegIndex(0);

    /// Select a register by number.
    ///
    /// Numbers outside 0..8 silently select R0. A bad selector is not an
    /// error: every word has to decode to something runnable.
    pub fn clamped(n: u16) -> Self {
        if (n as usize) < NUM_REGS {
            RegIndex(n as u8)
        } else {
            RegIndex::R0
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for RegIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "R{}", self.0)
    }
}

/// Condition flags.
///
/// Recomputed from every register read as an operand. After a
/// recomputation exactly one flag is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Flags {
    pub n: bool,
    pub p: bool,
    pub z: bool,
}

impl Flags {
    /// Flags for a word interpreted as a signed 16-bit value.
    pub fn from_word(value: u16) -> Self {
        let s = value as i16;
        Self {
            n: s < 0,
            p: s > 0,
            z: s == 0,
        }
    }

    /// True if any flag selected by `mask` (bit 2 = N, bit 1 = P, bit 0 = Z)
    /// is set.
    pub fn test(&self, mask: u16) -> bool {
        (mask & 0b100 != 0 && self.n) || (mask & 0b010 != 0 && self.p) || (mask & 0b001 != 0 && self.z)
    }
}

impl std::fmt::Display for Flags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}{}", self.n as u8, self.p as u8, self.z as u8)
    }
}

/// The register file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registers {
    /// R0..R7
    pub gpr: [u16; NUM_REGS],

    /// Program counter
    pub pc: u16,

    /// Link register, written by JSR and read by RET
    pub rr: u16,
}

impl Registers {
    /// Create a new register file with all values zeroed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset all registers to zero.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    #[inline]
    pub fn get(&self, reg: RegIndex) -> u16 {
        self.gpr[reg.index()]
    }

    #[inline]
    pub fn set(&mut self, reg: RegIndex, value: u16) {
        self.gpr[reg.index()] = value;
    }
}
