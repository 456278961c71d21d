//! Shell configuration.
//!
//! Defaults can be overridden from a JSON file:
//!
//! ```json
//! { "memory_window": { "start": 0, "end": 64 }, "exit_on_error": true }
//! ```

use crate::cpu::MEMORY_SIZE;
use serde::{Serialize, Deserialize};
use std::path::Path;
use thiserror::Error;

/// The slice of memory shown after every command, `start..end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryWindow {
    pub start: u16,
    pub end: u16,
}

impl MemoryWindow {
    pub fn new(start: u16, end: u16) -> Result<Self, ConfigError> {
        if start >= end || end as usize > MEMORY_SIZE {
            return Err(ConfigError::InvalidWindow { start, end });
        }
        Ok(Self { start, end })
    }
}

impl Default for MemoryWindow {
    fn default() -> Self {
        Self { start: 0, end: 40 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    pub memory_window: MemoryWindow,
    /// Memory cells printed per row.
    pub values_per_row: usize,
    /// Mark the cell PC points at.
    pub highlight_pc: bool,
    /// Halt the machine on the first fault.
    pub exit_on_error: bool,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            memory_window: MemoryWindow::default(),
            values_per_row: 8,
            highlight_pc: true,
            exit_on_error: false,
        }
    }
}

impl ShellConfig {
    /// Read and validate a JSON config file. Missing keys keep their
    /// defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: ShellConfig =
            serde_json::from_str(text).map_err(|e| ConfigError::JsonError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        MemoryWindow::new(self.memory_window.start, self.memory_window.end)?;
        if self.values_per_row == 0 {
            return Err(ConfigError::ZeroValuesPerRow);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("invalid config: {0}")]
    JsonError(String),

    #[error("invalid memory window {start}..{end} (need start < end <= {MEMORY_SIZE})")]
    InvalidWindow { start: u16, end: u16 },

    #[error("values_per_row must be at least 1")]
    ZeroValuesPerRow,
}
