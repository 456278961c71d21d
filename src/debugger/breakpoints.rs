//! Breakpoint set.

use crate::cpu::MEMORY_SIZE;
use std::collections::BTreeSet;

/// Distinct breakpoint addresses, kept in ascending order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Breakpoints {
    addrs: BTreeSet<u16>,
}

impl Breakpoints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a breakpoint. Returns false if it was already set.
    ///
    /// Addresses are reduced modulo the memory size, like every other
    /// address the machine sees.
    pub fn add(&mut self, addr: u16) -> bool {
        self.addrs.insert(wrap(addr))
    }

    /// Remove a breakpoint. Returns false if none was set.
    pub fn delete(&mut self, addr: u16) -> bool {
        self.addrs.remove(&wrap(addr))
    }

    pub fn has(&self, addr: u16) -> bool {
        self.addrs.contains(&wrap(addr))
    }

    /// All breakpoints, ascending.
    pub fn list(&self) -> Vec<u16> {
        self.addrs.iter().copied().collect()
    }

    pub fn clear(&mut self) {
        self.addrs.clear();
    }
}

fn wrap(addr: u16) -> u16 {
    (addr as usize % MEMORY_SIZE) as u16
}
