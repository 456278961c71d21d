//! Instruction decoder.
//!
//! Word layout (bit 15 = MSB):
//!
//! ```text
//!  15    11 10   8  7  6                 0
//! +--------+------+---+-------------------+
//! | opcode | reg1 | m | imm7 / reg2 (1-0) |
//! +--------+------+---+-------------------+
//! ```
//!
//! - `m = 0`: the low 7 bits are an immediate literal
//! - `m = 1`: bits 1-0 select the second register
//! - low byte `0xFF`: the operand is the next memory word (extended
//!   immediate), which costs one extra PC slot
//!
//! JMP reads its condition mask from bits 2-0 (N, P, Z). Decoding is total:
//! every word produces an instruction.

use crate::cpu::registers::RegIndex;
use serde::{Serialize, Deserialize};

/// Low byte marking an extended immediate.
pub const EXTENDED_SENTINEL: u16 = 0x00FF;

const OPCODE_SHIFT: u16 = 11;
const REG1_SHIFT: u16 = 8;
const MODE_BIT: u16 = 0x0080;
const IMM_MASK: u16 = 0x007F;
const REG2_MASK: u16 = 0x0003;

/// Operation selector from the top five bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Opcode {
    Ld,
    St,
    Mov,
    Add,
    Mul,
    And,
    Not,
    Or,
    Shl,
    Shr,
    Jmp,
    Jsr,
    Ret,
    Nop,
    Hlt,
    /// Opcodes 15..=31. Executed as NOP.
    Reserved(u8),
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Opcode::Reserved(n) => write!(f, "OP{}", n),
            op => f.write_str(op.mnemonic()),
        }
    }
}

impl Opcode {
    const TABLE: [Opcode; 15] = [
        Opcode::Ld,
        Opcode::St,
        Opcode::Mov,
        Opcode::Add,
        Opcode::Mul,
        Opcode::And,
        Opcode::Not,
        Opcode::Or,
        Opcode::Shl,
        Opcode::Shr,
        Opcode::Jmp,
        Opcode::Jsr,
        Opcode::Ret,
        Opcode::Nop,
        Opcode::Hlt,
    ];

    /// Map a 5-bit opcode field to an opcode.
    pub fn from_bits(bits: u16) -> Self {
        let bits = (bits & 0x1F) as u8;
        Self::TABLE
            .get(bits as usize)
            .copied()
            .unwrap_or(Opcode::Reserved(bits))
    }

    /// The 5-bit field value.
    pub fn bits(self) -> u16 {
        match self {
            Opcode::Reserved(n) => (n & 0x1F) as u16,
            op => Self::TABLE.iter().position(|&t| t == op).unwrap_or(0) as u16,
        }
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Ld => "LD",
            Opcode::St => "ST",
            Opcode::Mov => "MOV",
            Opcode::Add => "ADD",
            Opcode::Mul => "MUL",
            Opcode::And => "AND",
            Opcode::Not => "NOT",
            Opcode::Or => "OR",
            Opcode::Shl => "SHL",
            Opcode::Shr => "SHR",
            Opcode::Jmp => "JMP",
            Opcode::Jsr => "JSR",
            Opcode::Ret => "RET",
            Opcode::Nop => "NOP",
            Opcode::Hlt => "HLT",
            Opcode::Reserved(_) => "???",
        }
    }

    /// Whether the instruction resolves an operand.
    pub fn takes_operand(self) -> bool {
        !matches!(
            self,
            Opcode::Not | Opcode::Ret | Opcode::Nop | Opcode::Hlt | Opcode::Reserved(_)
        )
    }
}

/// Where the operand comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AddrMode {
    /// 7-bit literal packed in the word.
    Immediate(u16),
    /// Second register (R0..R3).
    Register(RegIndex),
    /// Full word at PC + 1.
    Extended,
}

/// A decoded instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub opcode: Opcode,
    pub first: RegIndex,
    pub mode: AddrMode,
}

impl Instruction {
    /// `op reg, #value` with a 7-bit literal.
    pub fn imm(opcode: Opcode, reg: u16, value: u16) -> Self {
        Self {
            opcode,
            first: RegIndex::clamped(reg),
            mode: AddrMode::Immediate(value & IMM_MASK),
        }
    }

    /// `op reg, Rsrc`.
    pub fn reg(opcode: Opcode, reg: u16, src: u16) -> Self {
        Self {
            opcode,
            first: RegIndex::clamped(reg),
            mode: AddrMode::Register(RegIndex::clamped(src & REG2_MASK)),
        }
    }

    /// `op reg, <next word>`.
    pub fn ext(opcode: Opcode, reg: u16) -> Self {
        Self {
            opcode,
            first: RegIndex::clamped(reg),
            mode: AddrMode::Extended,
        }
    }

    /// An instruction with no meaningful operand.
    pub fn bare(opcode: Opcode) -> Self {
        Self::imm(opcode, 0, 0)
    }

    /// `JMP` on the flags of `reg` to a 7-bit target.
    ///
    /// The condition mask shares bits 2-0 with the target: the low three
    /// bits of `target` are also the N/P/Z selector.
    pub fn jmp(reg: u16, target: u16) -> Self {
        Self::imm(Opcode::Jmp, reg, target)
    }

    /// N/P/Z condition mask for JMP (bit 2 = N, bit 1 = P, bit 0 = Z).
    ///
    /// An extended JMP has all three bits set and is therefore unconditional.
    pub fn condition_mask(&self) -> u16 {
        match self.mode {
            AddrMode::Immediate(v) => v & 0b111,
            AddrMode::Register(r) => r.index() as u16 & 0b111,
            AddrMode::Extended => 0b111,
        }
    }
}

/// Decode a word.
pub fn decode(word: u16) -> Instruction {
    let opcode = Opcode::from_bits(word >> OPCODE_SHIFT);
    let first = RegIndex::clamped((word >> REG1_SHIFT) & 0x7);
    Instruction {
        opcode,
        first,
        mode: addr_mode(word),
    }
}

/// Resolve the addressing mode from the low byte.
pub fn addr_mode(word: u16) -> AddrMode {
    if word & 0x00FF == EXTENDED_SENTINEL {
        AddrMode::Extended
    } else if word & MODE_BIT != 0 {
        AddrMode::Register(RegIndex::clamped(word & REG2_MASK))
    } else {
        AddrMode::Immediate(word & IMM_MASK)
    }
}

/// Encode an instruction back to a word.
pub fn encode(instr: &Instruction) -> u16 {
    let low = match instr.mode {
        AddrMode::Immediate(v) => v & IMM_MASK,
        AddrMode::Register(r) => MODE_BIT | (r.index() as u16 & REG2_MASK),
        AddrMode::Extended => EXTENDED_SENTINEL,
    };
    (instr.opcode.bits() << OPCODE_SHIFT) | ((instr.first.index() as u16) << REG1_SHIFT) | low
}
