//! Text rendering of machine state.

use crate::cpu::Snapshot;

/// Two lines: PC/flags/RR, then R0..R7.
pub fn format_registers(snapshot: &Snapshot) -> Vec<String> {
    let regs = &snapshot.registers;
    let gpr = regs
        .gpr
        .iter()
        .enumerate()
        .map(|(i, value)| format!("R{}: 0x{:04x}", i, value))
        .collect::<Vec<_>>()
        .join(" ");

    vec![
        format!("PC: 0x{:04x} | NPZ: {} | RR: 0x{:04x}", regs.pc, snapshot.flags, regs.rr),
        gpr,
    ]
}

/// Hex dump of `words`, which start at address `start`.
///
/// Each row begins with the address of its first cell. With `highlight`
/// set, the cell at `pc` is bracketed.
pub fn format_memory(words: &[u16], start: u16, pc: u16, per_row: usize, highlight: bool) -> Vec<String> {
    words
        .chunks(per_row.max(1))
        .enumerate()
        .map(|(row, cells)| {
            let row_addr = start as usize + row * per_row.max(1);
            let body = cells
                .iter()
                .enumerate()
                .map(|(i, word)| {
                    if highlight && row_addr + i == pc as usize {
                        format!("[0x{:04x}]", word)
                    } else {
                        format!(" 0x{:04x} ", word)
                    }
                })
                .collect::<String>();
            format!("0x{:04x} :{}", row_addr, body.trim_end())
        })
        .collect()
}
