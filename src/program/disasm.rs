//! Disassembler.
//!
//! Converts memory words back to readable assembly for the debugger views.

use crate::cpu::{decode, AddrMode, Instruction, Opcode};

/// Disassemble a single word. `next` is the word after it, used when the
/// instruction takes an extended immediate.
pub fn disassemble_word(word: u16, next: u16) -> String {
    let instr = decode(word);
    match instr.opcode {
        Opcode::Ld | Opcode::St => {
            format!("{} {}, [{}]", instr.opcode, instr.first, format_operand(&instr, next))
        }
        Opcode::Mov | Opcode::Add | Opcode::Mul | Opcode::And | Opcode::Or | Opcode::Shl | Opcode::Shr => {
            match instr.mode {
                AddrMode::Register(src) => format!("{} {}, {}", instr.opcode, instr.first, src),
                _ => format!("{} {}, #{}", instr.opcode, instr.first, format_operand(&instr, next)),
            }
        }
        Opcode::Not => format!("NOT {}", instr.first),
        Opcode::Jmp => match instr.mode {
            AddrMode::Register(src) => format!("JMP {} ; invalid operand", src),
            _ => {
                let mask = instr.condition_mask();
                let target = format_operand(&instr, next);
                if mask == 0b111 {
                    format!("JMP {}", target)
                } else {
                    format!("JMP.{} {}, {}", condition_suffix(mask), instr.first, target)
                }
            }
        },
        Opcode::Jsr => match instr.mode {
            AddrMode::Register(src) => format!("JSR {} ; invalid operand", src),
            _ => format!("JSR {}", format_operand(&instr, next)),
        },
        Opcode::Ret => "RET".to_string(),
        Opcode::Nop => "NOP".to_string(),
        Opcode::Hlt => "HLT".to_string(),
        Opcode::Reserved(_) => format!(".word 0x{:04X}", word),
    }
}

/// Number of memory words the instruction at `word` occupies.
pub fn instruction_len(word: u16) -> usize {
    let instr = decode(word);
    if instr.opcode.takes_operand() && instr.mode == AddrMode::Extended {
        2
    } else {
        1
    }
}

/// Disassemble a block of memory starting at address `origin`.
///
/// Extended immediates are shown on their instruction's line and listed
/// again as `.word` data.
pub fn disassemble(words: &[u16], origin: usize) -> String {
    let mut output = String::new();
    let mut i = 0;

    while i < words.len() {
        let word = words[i];
        let next = words.get(i + 1).copied().unwrap_or(0);
        output.push_str(&format!(
            "{:04X}: {:04X}  {}\n",
            origin + i,
            word,
            disassemble_word(word, next)
        ));

        if instruction_len(word) == 2 && i + 1 < words.len() {
            output.push_str(&format!("{:04X}: {:04X}  .word 0x{:04X}\n", origin + i + 1, next, next));
            i += 2;
        } else {
            i += 1;
        }
    }

    output
}

fn format_operand(instr: &Instruction, next: u16) -> String {
    match instr.mode {
        AddrMode::Immediate(v) => format!("0x{:02X}", v),
        AddrMode::Register(src) => src.to_string(),
        AddrMode::Extended => format!("0x{:04X}", next),
    }
}

fn condition_suffix(mask: u16) -> String {
    if mask == 0 {
        return "never".to_string();
    }
    [(0b100u16, 'n'), (0b010, 'p'), (0b001, 'z')]
        .iter()
        .filter(|(bit, _)| mask & bit != 0)
        .map(|(_, c)| *c)
        .collect()
}
