//! # co16
//!
//! A small 16-bit register machine with a breakpoint debugger.
//!
//! The machine has eight general registers, a program counter, a return
//! register for subroutine calls and 1024 words of memory. A controller
//! drives it one instruction at a time or until a breakpoint, and a shell
//! (plain REPL or terminal UI) drives the controller.

pub mod cpu;
pub mod debugger;
pub mod program;
pub mod shell;

#[cfg(feature = "tui")]
pub mod tui;

// Re-export commonly used types
pub use cpu::{Cpu, CpuError, CpuState, Instruction, Memory, Opcode, Registers};
pub use debugger::{Controller, StopReason};
pub use program::{disassemble, load_image, parse_image, ProgramImage};
pub use shell::{Session, ShellConfig};

#[cfg(feature = "tui")]
pub use tui::run_debugger;
