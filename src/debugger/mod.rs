//! Execution control for the debugger.
//!
//! Wraps a [`Cpu`](crate::cpu::Cpu) with a breakpoint set and step/continue
//! semantics. Everything here is synchronous.

pub mod address;
pub mod breakpoints;
pub mod controller;

pub use address::{parse_address, parse_bound, AddressError};
pub use breakpoints::Breakpoints;
pub use controller::{Controller, Mode, ResumeOutcome, StopReason};
