//! Built-in demo program, loaded when no image is given.

use crate::cpu::{encode, Instruction, Opcode};
use super::ProgramImage;

/// Address the demo loop stores its result to.
pub const RESULT_ADDR: u16 = 0x30;

/// Sum 3 five times in a countdown loop, store the result, then call a
/// subroutine that marks R7 before halting.
pub fn demo_program() -> ProgramImage {
    let mut words = vec![0u16; 0x23];

    words[0x00] = encode(&Instruction::imm(Opcode::Mov, 0, 5));
    words[0x01] = encode(&Instruction::ext(Opcode::Jmp, 0));
    words[0x02] = 0x000A;

    // loop: R0 -= 1; R1 += 3; repeat while R0 > 0
    words[0x0A] = encode(&Instruction::ext(Opcode::Add, 0));
    words[0x0B] = 0xFFFF;
    words[0x0C] = encode(&Instruction::imm(Opcode::Add, 1, 3));
    words[0x0D] = encode(&Instruction::jmp(0, 0x0A));

    words[0x0E] = encode(&Instruction::imm(Opcode::St, 1, RESULT_ADDR));
    words[0x0F] = encode(&Instruction::ext(Opcode::Jsr, 0));
    words[0x10] = 0x0020;
    words[0x11] = encode(&Instruction::bare(Opcode::Hlt));

    words[0x20] = encode(&Instruction::ext(Opcode::Mov, 7));
    words[0x21] = 0xC0DE;
    words[0x22] = encode(&Instruction::bare(Opcode::Ret));

    ProgramImage::from_words(words)
}
