//! TUI debugger.
//!
//! Provides an interactive terminal-based debugger with:
//! - Disassembly around PC with breakpoint marks
//! - Register, flag and memory window views
//! - The shell command line, plus F10/F5/Esc for step, continue and pause

mod app;
mod ui;

pub use app::{DebuggerApp, run_debugger};
