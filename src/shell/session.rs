//! A debugging session: the controller, its configuration and the loaded
//! program, driven one command at a time.

use crate::cpu::{Cpu, MemoryError};
use crate::debugger::{Controller, ResumeOutcome, StopReason};
use crate::program::ProgramImage;
use super::command::{parse_command, BreakpointCmd, Command, ConfigureCmd, HELP_TEXT};
use super::config::{MemoryWindow, ShellConfig};
use super::display::{format_memory, format_registers};

/// What a command produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reply {
    /// Messages for the user.
    pub lines: Vec<String>,
    /// The user asked to leave.
    pub quit: bool,
    /// Machine state or the memory window changed.
    pub refresh: bool,
}

impl Reply {
    fn message(line: impl Into<String>) -> Self {
        Self {
            lines: vec![line.into()],
            ..Self::default()
        }
    }

    fn refreshed(lines: Vec<String>) -> Self {
        Self {
            lines,
            refresh: true,
            ..Self::default()
        }
    }
}

pub struct Session {
    controller: Controller,
    config: ShellConfig,
    image: ProgramImage,
}

impl Session {
    /// Load `image` into a fresh machine.
    pub fn new(image: ProgramImage, config: ShellConfig) -> Result<Self, MemoryError> {
        let mut cpu = Cpu::new();
        image.load_into(&mut cpu)?;
        let mut controller = Controller::new(cpu);
        controller.set_exit_on_error(config.exit_on_error);

        Ok(Self { controller, config, image })
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut Controller {
        &mut self.controller
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    /// Parse and run one input line. Parse errors become messages.
    pub fn execute_line(&mut self, line: &str) -> Reply {
        match parse_command(line) {
            Ok(Some(command)) => self.execute(command),
            Ok(None) => Reply::default(),
            Err(e) => Reply::message(e.to_string()),
        }
    }

    pub fn execute(&mut self, command: Command) -> Reply {
        match command {
            Command::Step => self.step(),
            Command::Continue => self.resume(),
            Command::Breakpoint(cmd) => self.breakpoint(cmd),
            Command::Configure(cmd) => self.configure(cmd),
            Command::Reset => self.reset(),
            Command::Help => Reply {
                lines: HELP_TEXT.iter().map(|s| s.to_string()).collect(),
                ..Reply::default()
            },
            Command::Exit => Reply {
                quit: true,
                ..Reply::default()
            },
        }
    }

    fn step(&mut self) -> Reply {
        if self.controller.cpu().is_halted() {
            return Reply::message("Program has halted, use \"reset\" to run it again");
        }

        let outcome = self.controller.step();
        let mut lines = Vec::new();
        if let Some(fault) = &outcome.fault {
            lines.push(format!("An error occurred during execution: {}", fault));
        }
        if outcome.halted {
            lines.push("Program halted".to_string());
        }
        Reply::refreshed(lines)
    }

    fn resume(&mut self) -> Reply {
        if self.controller.cpu().is_halted() {
            return Reply::message("Program has halted, use \"reset\" to run it again");
        }

        let outcome = self.controller.resume();
        Reply::refreshed(describe_resume(&outcome))
    }

    fn breakpoint(&mut self, cmd: BreakpointCmd) -> Reply {
        let line = match cmd {
            BreakpointCmd::Set(addr) => {
                if self.controller.add_breakpoint(addr) {
                    format!("Breakpoint added at address 0x{:X}", addr)
                } else {
                    format!("Breakpoint already set at address 0x{:X}", addr)
                }
            }
            BreakpointCmd::List => {
                let addrs = self.controller.breakpoints();
                if addrs.is_empty() {
                    "No breakpoints set".to_string()
                } else {
                    let list: Vec<String> = addrs.iter().map(|a| format!("0x{:X}", a)).collect();
                    format!("Breakpoints set at addresses: {}", list.join(", "))
                }
            }
            BreakpointCmd::Delete(addr) => {
                if self.controller.delete_breakpoint(addr) {
                    "Breakpoint successfully deleted".to_string()
                } else {
                    "Breakpoint not found".to_string()
                }
            }
            BreakpointCmd::Clear => {
                self.controller.clear_breakpoints();
                "All breakpoints deleted".to_string()
            }
        };
        Reply::message(line)
    }

    fn configure(&mut self, cmd: ConfigureCmd) -> Reply {
        match cmd {
            ConfigureCmd::MemoryWindow { start, end } => match MemoryWindow::new(start, end) {
                Ok(window) => {
                    self.config.memory_window = window;
                    Reply::refreshed(vec![format!("Memory window set to 0x{:X}..0x{:X}", start, end)])
                }
                Err(e) => Reply::message(e.to_string()),
            },
            ConfigureCmd::ExitOnError(on) => {
                self.config.exit_on_error = on;
                self.controller.set_exit_on_error(on);
                Reply::message(format!("Exit on error {}", if on { "enabled" } else { "disabled" }))
            }
        }
    }

    /// Reload the program into a fresh machine. Breakpoints survive.
    fn reset(&mut self) -> Reply {
        let mut cpu = Cpu::new();
        if let Err(e) = self.image.load_into(&mut cpu) {
            return Reply::message(format!("Reset failed: {}", e));
        }
        *self.controller.cpu_mut() = cpu;
        self.controller.pause();
        log::info!("machine reset");
        Reply::refreshed(vec!["Machine reset".to_string()])
    }

    /// Registers followed by the configured memory window.
    pub fn status_lines(&self) -> Vec<String> {
        let cpu = self.controller.cpu();
        let mut lines = format_registers(&cpu.snapshot());
        let window = self.config.memory_window;

        match cpu.mem.window(window.start as usize, window.end as usize) {
            Ok(words) => lines.extend(format_memory(
                words,
                window.start,
                cpu.regs.pc,
                self.config.values_per_row,
                self.config.highlight_pc,
            )),
            Err(e) => lines.push(e.to_string()),
        }
        lines
    }
}

/// User-facing messages for a finished continue.
pub fn describe_resume(outcome: &ResumeOutcome) -> Vec<String> {
    let mut lines: Vec<String> = outcome
        .faults
        .iter()
        .map(|fault| format!("An error occurred during execution: {}", fault))
        .collect();

    match &outcome.reason {
        StopReason::Halted => lines.push("Program halted".to_string()),
        StopReason::Breakpoint(addr) => lines.push(format!("Breakpoint reached at address 0x{:X}", addr)),
        StopReason::Fault(fault) => {
            lines.push(format!("An error occurred during execution: {}", fault));
            lines.push("Program halted".to_string());
        }
        StopReason::StepLimit => lines.push(format!("Paused after {} steps", outcome.steps)),
    }
    lines
}
