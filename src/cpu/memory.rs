//! Flat word-addressed memory.
//!
//! 1024 sixteen-bit cells. Plain reads and writes wrap the address modulo
//! the memory size; only `window` and `load` check their bounds.

use serde::{Serialize, Deserialize};
use thiserror::Error;

/// The number of memory cells.
pub const MEMORY_SIZE: usize = 1024;

/// Main memory: 1024 sixteen-bit cells.
#[derive(Clone, Serialize, Deserialize)]
pub struct Memory {
    cells: Vec<u16>,
}

impl Memory {
    /// Create a new memory with all cells zeroed.
    pub fn new() -> Self {
        Self {
            cells: vec![0; MEMORY_SIZE],
        }
    }

    /// Reduce any address to a cell index.
    #[inline]
    pub fn wrap(addr: u16) -> usize {
        addr as usize % MEMORY_SIZE
    }

    /// Read a cell. The address wraps.
    #[inline]
    pub fn read(&self, addr: u16) -> u16 {
        self.cells[Self::wrap(addr)]
    }

    /// Write a cell. The address wraps.
    #[inline]
    pub fn write(&mut self, addr: u16, value: u16) {
        self.cells[Self::wrap(addr)] = value;
    }

    /// Clear all memory to zeros.
    pub fn clear(&mut self) {
        self.cells.iter_mut().for_each(|cell| *cell = 0);
    }

    /// Copy a block of words into memory starting at `start`.
    ///
    /// Fails without writing anything if the block would run past the end.
    pub fn load(&mut self, start: usize, words: &[u16]) -> Result<(), MemoryError> {
        let available = MEMORY_SIZE.saturating_sub(start);
        if start > MEMORY_SIZE || words.len() > available {
            return Err(MemoryError::ProgramTooLarge {
                size: words.len(),
                available,
            });
        }

        self.cells[start..start + words.len()].copy_from_slice(words);
        Ok(())
    }

    /// Borrow the cells in `start..end`.
    ///
    /// Requires `start < end <= MEMORY_SIZE`.
    pub fn window(&self, start: usize, end: usize) -> Result<&[u16], MemoryError> {
        if start >= end || end > MEMORY_SIZE {
            return Err(MemoryError::InvalidRange { start, end });
        }
        Ok(&self.cells[start..end])
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let non_zero = self.cells.iter().filter(|&&cell| cell != 0).count();

        f.debug_struct("Memory")
            .field("non_zero_cells", &non_zero)
            .field("total_cells", &MEMORY_SIZE)
            .finish()
    }
}

/// Errors from bounds-checked memory access.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    #[error("invalid memory range {start}..{end} (need start < end <= {MEMORY_SIZE})")]
    InvalidRange { start: usize, end: usize },

    #[error("program size {size} exceeds available space {available}")]
    ProgramTooLarge { size: usize, available: usize },
}
