//! The debugger shell: commands, configuration and the front-end-neutral
//! session they run against.

pub mod command;
pub mod config;
pub mod display;
pub mod session;
pub mod repl;

pub use command::{parse_command, BreakpointCmd, Command, CommandError, ConfigureCmd, HELP_TEXT};
pub use config::{ConfigError, MemoryWindow, ShellConfig};
pub use display::{format_memory, format_registers};
pub use session::{describe_resume, Reply, Session};
pub use repl::run_repl;
