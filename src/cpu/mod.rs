//! CPU emulation.
//!
//! - 1024 sixteen-bit memory cells with wraparound addressing
//! - R0..R7, PC and the RR link register
//! - N/P/Z condition flags
//! - 15-instruction set with register, 7-bit immediate and extended
//!   immediate operands

pub mod memory;
pub mod registers;
pub mod decode;
pub mod execute;

pub use memory::{Memory, MemoryError, MEMORY_SIZE};
pub use registers::{Flags, RegIndex, Registers};
pub use decode::{decode, encode, AddrMode, Instruction, Opcode};
pub use execute::{Cpu, CpuError, CpuState, Snapshot, StepOutcome};
