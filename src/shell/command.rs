//! Debugger command language.
//!
//! Every command has a long and a short name:
//!
//! ```text
//! step        s                  execute one instruction
//! continue    c                  run until a breakpoint or halt
//! breakpoint  br s <addr>        set a breakpoint
//!                br l            list breakpoints
//!                br d <addr>     delete a breakpoint
//!                br c            clear all breakpoints
//! configure   cfg m <lo> <hi>    memory cells shown after each command
//!                 e on|off       halt on the first fault
//! reset       r                  reload the program into a fresh machine
//! help        h
//! exit        e
//! ```

use crate::debugger::{parse_address, parse_bound, AddressError};
use thiserror::Error;

pub const HELP_TEXT: &[&str] = &[
    "Available commands:",
    "  step        s    Perform one execution step",
    "  continue    c    Continue execution until a breakpoint or program end",
    "  breakpoint  br   Breakpoint handler, options:",
    "                     s <address>  Set breakpoint at <address>",
    "                     l            List all breakpoints",
    "                     d <address>  Delete the breakpoint at <address>",
    "                     c            Delete all breakpoints",
    "  configure   cfg  Configure the interpreter, options:",
    "                     m <lower> <upper>  Bounds of the memory cells printed",
    "                     e on|off           Halt on the first execution error",
    "  reset       r    Reload the program and reset the machine",
    "  help        h    Display this help message",
    "  exit        e    Exit the debugger",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Step,
    Continue,
    Breakpoint(BreakpointCmd),
    Configure(ConfigureCmd),
    Reset,
    Help,
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakpointCmd {
    Set(u16),
    List,
    Delete(u16),
    Clear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigureCmd {
    MemoryWindow { start: u16, end: u16 },
    ExitOnError(bool),
}

/// Parse one input line. Blank lines give `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<Command>, CommandError> {
    let mut words = line.split_whitespace();
    let Some(name) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();

    let command = match name {
        "step" | "s" => no_args(Command::Step, "step", &args)?,
        "continue" | "c" => no_args(Command::Continue, "continue", &args)?,
        "reset" | "r" => no_args(Command::Reset, "reset", &args)?,
        "help" | "h" => Command::Help,
        "exit" | "e" => Command::Exit,
        "breakpoint" | "br" => Command::Breakpoint(parse_breakpoint(&args)?),
        "configure" | "cfg" => Command::Configure(parse_configure(&args)?),
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

fn no_args(command: Command, name: &'static str, args: &[&str]) -> Result<Command, CommandError> {
    if args.is_empty() {
        Ok(command)
    } else {
        Err(CommandError::Usage(name))
    }
}

fn parse_breakpoint(args: &[&str]) -> Result<BreakpointCmd, CommandError> {
    match args {
        ["s", addr] => Ok(BreakpointCmd::Set(parse_address(addr)?)),
        ["l"] => Ok(BreakpointCmd::List),
        ["d", addr] => Ok(BreakpointCmd::Delete(parse_address(addr)?)),
        ["c"] => Ok(BreakpointCmd::Clear),
        _ => Err(CommandError::Usage("breakpoint")),
    }
}

fn parse_configure(args: &[&str]) -> Result<ConfigureCmd, CommandError> {
    match args {
        ["m", lo, hi] => {
            let start = parse_address(lo)?;
            let end = parse_bound(hi)?;
            if start >= end {
                return Err(CommandError::InvalidWindow { start, end });
            }
            Ok(ConfigureCmd::MemoryWindow { start, end })
        }
        ["e", "on"] => Ok(ConfigureCmd::ExitOnError(true)),
        ["e", "off"] => Ok(ConfigureCmd::ExitOnError(false)),
        _ => Err(CommandError::Usage("configure")),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unknown command {0:?}, use \"h\" for help")]
    Unknown(String),

    #[error("invalid usage for {0:?}, see 'help' for help")]
    Usage(&'static str),

    #[error(transparent)]
    Address(#[from] AddressError),

    #[error("invalid memory bounds: 0x{start:X} must be below 0x{end:X}")]
    InvalidWindow { start: u16, end: u16 },
}
