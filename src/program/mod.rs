//! Program images and their disassembly.
//!
//! This module provides:
//! - A read-only text image format (hex/binary/decimal words)
//! - A disassembler for the debugger views
//! - The built-in demo program

pub mod image;
pub mod disasm;
pub mod demo;

pub use image::{load_image, parse_image, ImageError, ProgramImage, Segment};
pub use disasm::{disassemble, disassemble_word};
pub use demo::demo_program;
