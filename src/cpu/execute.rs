//! CPU execution engine.
//!
//! Implements the fetch-decode-execute step and all instruction behaviors.

use crate::cpu::decode::{self, AddrMode, Instruction, Opcode};
use crate::cpu::memory::{MemoryError, MEMORY_SIZE};
use crate::cpu::registers::{Flags, RegIndex};
use crate::cpu::{Memory, Registers};
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// CPU execution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CpuState {
    /// CPU is running normally.
    Running,
    /// CPU has halted (executed HLT, or a fault was treated as fatal).
    Halted,
}

/// What a single step produced.
///
/// A fault does not stop the machine: the instruction acts as a NOP and
/// the PC advances normally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    pub halted: bool,
    pub fault: Option<CpuError>,
}

impl StepOutcome {
    fn running(fault: Option<CpuError>) -> Self {
        Self { halted: false, fault }
    }

    fn halted() -> Self {
        Self { halted: true, fault: None }
    }
}

/// Register and flag state handed to the shell for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub registers: Registers,
    pub flags: Flags,
    pub state: CpuState,
    pub cycles: u64,
}

/// A resolved operand.
#[derive(Debug, Clone, Copy)]
struct Operand {
    value: u16,
    from_register: bool,
}

/// The CPU.
#[derive(Clone, Serialize, Deserialize)]
pub struct Cpu {
    /// CPU registers.
    pub regs: Registers,
    /// Condition flags.
    pub flags: Flags,
    /// Main memory.
    pub mem: Memory,
    /// Current execution state.
    pub state: CpuState,
    /// Instruction count.
    pub cycles: u64,
}

impl Cpu {
    /// Create a new CPU with zeroed state.
    pub fn new() -> Self {
        Self {
            regs: Registers::new(),
            flags: Flags::default(),
            mem: Memory::new(),
            state: CpuState::Running,
            cycles: 0,
        }
    }

    /// Reset the CPU to initial state.
    pub fn reset(&mut self) {
        self.regs.reset();
        self.flags = Flags::default();
        self.mem.clear();
        self.state = CpuState::Running;
        self.cycles = 0;
    }

    /// Load a block of words into memory at `start`.
    pub fn load_program(&mut self, start: usize, words: &[u16]) -> Result<(), MemoryError> {
        self.mem.load(start, words)
    }

    /// Copy out registers, flags and state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            registers: self.regs.clone(),
            flags: self.flags,
            state: self.state,
            cycles: self.cycles,
        }
    }

    /// Execute a single instruction.
    ///
    /// Calling this on a halted CPU is a caller error and is not checked:
    /// the instruction at PC simply executes again.
    pub fn step(&mut self) -> StepOutcome {
        let pc = self.regs.pc;
        let instr = decode::decode(self.mem.read(pc));
        log::trace!("{:04X}: {:?}", pc, instr);

        let first = self.read_operand_register(instr.first);

        // One slot for the instruction itself, one more per extended operand.
        let mut advance: u16 = 1;
        let mut jumped = false;
        let mut fault = None;

        match instr.opcode {
            Opcode::Ld => {
                let operand = self.resolve_operand(&instr, &mut advance);
                match self.checked_address(operand, instr.opcode, pc) {
                    Ok(addr) => self.regs.set(instr.first, self.mem.read(addr)),
                    Err(e) => fault = Some(e),
                }
            }

            Opcode::St => {
                let operand = self.resolve_operand(&instr, &mut advance);
                match self.checked_address(operand, instr.opcode, pc) {
                    Ok(addr) => self.mem.write(addr, first),
                    Err(e) => fault = Some(e),
                }
            }

            Opcode::Mov => {
                let operand = self.resolve_operand(&instr, &mut advance);
                self.regs.set(instr.first, operand.value);
            }

            Opcode::Add => self.alu(&instr, first, &mut advance, u16::wrapping_add),
            Opcode::Mul => self.alu(&instr, first, &mut advance, u16::wrapping_mul),
            Opcode::And => self.alu(&instr, first, &mut advance, |a, b| a & b),
            Opcode::Or => self.alu(&instr, first, &mut advance, |a, b| a | b),
            Opcode::Shl => self.alu(&instr, first, &mut advance, |a, b| {
                a.checked_shl(b as u32).unwrap_or(0)
            }),
            Opcode::Shr => self.alu(&instr, first, &mut advance, |a, b| {
                a.checked_shr(b as u32).unwrap_or(0)
            }),

            Opcode::Not => self.regs.set(instr.first, !first),

            Opcode::Jmp => {
                let operand = self.resolve_operand(&instr, &mut advance);
                if operand.from_register {
                    fault = Some(CpuError::InvalidOperand { opcode: instr.opcode, pc });
                } else if self.flags.test(instr.condition_mask()) {
                    self.regs.pc = wrap_pc(operand.value as usize);
                    jumped = true;
                }
            }

            Opcode::Jsr => {
                let operand = self.resolve_operand(&instr, &mut advance);
                if operand.from_register {
                    fault = Some(CpuError::InvalidOperand { opcode: instr.opcode, pc });
                } else {
                    self.regs.rr = wrap_pc(pc as usize + advance as usize);
                    self.regs.pc = wrap_pc(operand.value as usize);
                    jumped = true;
                }
            }

            Opcode::Ret => {
                self.regs.pc = self.regs.rr;
                jumped = true;
            }

            Opcode::Nop | Opcode::Reserved(_) => {}

            Opcode::Hlt => {
                self.state = CpuState::Halted;
                self.cycles += 1;
                log::debug!("halted at {:04X} after {} cycles", pc, self.cycles);
                return StepOutcome::halted();
            }
        }

        if !jumped {
            self.regs.pc = wrap_pc(pc as usize + advance as usize);
        }
        self.cycles += 1;

        if let Some(e) = &fault {
            log::warn!("{}", e);
        }

        StepOutcome::running(fault)
    }

    /// Read a register as an operand, updating the flags from its value.
    ///
    /// Every operand register read goes through here, first register before
    /// second, so the flags always describe the last register read.
    pub fn read_operand_register(&mut self, reg: RegIndex) -> u16 {
        let value = self.regs.get(reg);
        self.flags = Flags::from_word(value);
        value
    }

    /// Resolve the instruction's operand.
    ///
    /// An extended immediate comes from the word after the instruction and
    /// adds one slot to `advance`.
    fn resolve_operand(&mut self, instr: &Instruction, advance: &mut u16) -> Operand {
        match instr.mode {
            AddrMode::Immediate(value) => Operand { value, from_register: false },
            AddrMode::Register(reg) => Operand {
                value: self.read_operand_register(reg),
                from_register: true,
            },
            AddrMode::Extended => {
                *advance += 1;
                Operand {
                    value: self.mem.read(self.regs.pc.wrapping_add(1)),
                    from_register: false,
                }
            }
        }
    }

    /// `first := f(first, operand)`.
    fn alu(&mut self, instr: &Instruction, first: u16, advance: &mut u16, f: impl Fn(u16, u16) -> u16) {
        let operand = self.resolve_operand(instr, advance);
        self.regs.set(instr.first, f(first, operand.value));
    }

    /// Register-supplied addresses must lie inside memory; literals wrap.
    fn checked_address(&self, operand: Operand, opcode: Opcode, pc: u16) -> Result<u16, CpuError> {
        if operand.from_register && operand.value as usize >= MEMORY_SIZE {
            return Err(CpuError::OutOfBounds { opcode, addr: operand.value, pc });
        }
        Ok(operand.value)
    }

    /// Check if the CPU is halted.
    pub fn is_halted(&self) -> bool {
        self.state == CpuState::Halted
    }

    /// Check if the CPU is running.
    pub fn is_running(&self) -> bool {
        self.state == CpuState::Running
    }
}

fn wrap_pc(addr: usize) -> u16 {
    (addr % MEMORY_SIZE) as u16
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Cpu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cpu")
            .field("state", &self.state)
            .field("cycles", &self.cycles)
            .field("regs", &self.regs)
            .field("flags", &self.flags)
            .finish()
    }
}

/// Faults raised while executing an instruction. All of them are
/// recoverable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CpuError {
    #[error("invalid register operand for {opcode} at PC=0x{pc:04X}")]
    InvalidOperand { opcode: Opcode, pc: u16 },

    #[error("{opcode} address 0x{addr:04X} out of bounds at PC=0x{pc:04X}")]
    OutOfBounds { opcode: Opcode, addr: u16, pc: u16 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::decode::encode;

    fn make_program(instructions: &[Instruction]) -> Vec<u16> {
        instructions.iter().map(encode).collect()
    }

    fn cpu_with(program: &[u16]) -> Cpu {
        let mut cpu = Cpu::new();
        cpu.load_program(0, program).unwrap();
        cpu
    }

    fn run(cpu: &mut Cpu) -> u64 {
        let start = cpu.cycles;
        while !cpu.step().halted {}
        cpu.cycles - start
    }

    fn r(cpu: &Cpu, n: u16) -> u16 {
        cpu.regs.get(RegIndex::clamped(n))
    }

    #[test]
    fn test_cpu_halt() {
        let mut cpu = cpu_with(&make_program(&[Instruction::bare(Opcode::Hlt)]));
        cpu.regs.gpr = [1, 2, 3, 4, 5, 6, 7, 8];
        let before = cpu.regs.clone();

        let outcome = cpu.step();

        assert_eq!(outcome, StepOutcome { halted: true, fault: None });
        assert!(cpu.is_halted());
        assert_eq!(cpu.regs, before);
    }

    #[test]
    fn test_cpu_nop_then_halt() {
        let mut cpu = cpu_with(&make_program(&[
            Instruction::bare(Opcode::Nop),
            Instruction::bare(Opcode::Nop),
            Instruction::bare(Opcode::Nop),
            Instruction::bare(Opcode::Hlt),
        ]));

        assert_eq!(run(&mut cpu), 4);
        assert_eq!(cpu.regs.pc, 3);
    }

    #[test]
    fn test_mov_then_load_through_register() {
        let mut cpu = cpu_with(&make_program(&[
            Instruction::imm(Opcode::Mov, 2, 3),
            Instruction::reg(Opcode::Ld, 4, 2),
        ]));
        cpu.mem.write(3, 0x1234);

        cpu.step();
        cpu.step();

        assert_eq!(r(&cpu, 4), 0x1234);
        assert_eq!(cpu.regs.pc, 2);
    }

    #[test]
    fn test_load_store_immediate() {
        let mut cpu = cpu_with(&make_program(&[
            Instruction::imm(Opcode::Ld, 1, 100),
            Instruction::imm(Opcode::St, 1, 101),
            Instruction::bare(Opcode::Hlt),
        ]));
        cpu.mem.write(100, 0xABCD);

        run(&mut cpu);

        assert_eq!(cpu.mem.read(101), 0xABCD);
    }

    #[test]
    fn test_load_register_address_out_of_bounds() {
        let mut cpu = cpu_with(&make_program(&[Instruction::reg(Opcode::Ld, 0, 1)]));
        cpu.regs.set(RegIndex::clamped(0), 77);
        cpu.regs.set(RegIndex::clamped(1), 1024);

        let outcome = cpu.step();

        assert!(!outcome.halted);
        assert!(matches!(outcome.fault, Some(CpuError::OutOfBounds { addr: 1024, .. })));
        assert_eq!(r(&cpu, 0), 77);
        assert_eq!(cpu.regs.pc, 1);
        assert!(cpu.is_running());
    }

    #[test]
    fn test_store_register_address_out_of_bounds() {
        let mut cpu = cpu_with(&make_program(&[Instruction::reg(Opcode::St, 0, 1)]));
        cpu.regs.set(RegIndex::clamped(0), 0x5555);
        cpu.regs.set(RegIndex::clamped(1), 0x0400 + 3);

        let outcome = cpu.step();

        assert!(matches!(outcome.fault, Some(CpuError::OutOfBounds { .. })));
        assert_eq!(cpu.mem.read(3), 0);
    }

    #[test]
    fn test_extended_immediate() {
        let mov = encode(&Instruction::ext(Opcode::Mov, 5));
        let mut cpu = cpu_with(&[mov, 0xBEEF, encode(&Instruction::bare(Opcode::Hlt))]);

        cpu.step();

        assert_eq!(r(&cpu, 5), 0xBEEF);
        assert_eq!(cpu.regs.pc, 2);
        assert!(cpu.step().halted);
    }

    #[test]
    fn test_extended_load_wraps_address() {
        let ld = encode(&Instruction::ext(Opcode::Ld, 0));
        let mut cpu = cpu_with(&[ld, 1024 + 9]);
        cpu.mem.write(9, 42);

        let outcome = cpu.step();

        assert_eq!(outcome.fault, None);
        assert_eq!(r(&cpu, 0), 42);
    }

    #[test]
    fn test_arithmetic_and_logic() {
        let mut cpu = cpu_with(&make_program(&[
            Instruction::imm(Opcode::Mov, 0, 6),
            Instruction::imm(Opcode::Add, 0, 4),   // 10
            Instruction::imm(Opcode::Mul, 0, 3),   // 30
            Instruction::imm(Opcode::Mov, 1, 0x0F),
            Instruction::reg(Opcode::And, 1, 0),   // 30 & 15 = 14
            Instruction::imm(Opcode::Or, 1, 0x10), // 30
            Instruction::imm(Opcode::Shl, 1, 2),   // 120
            Instruction::imm(Opcode::Mov, 2, 0x40),
            Instruction::imm(Opcode::Shr, 2, 3),   // 8
            Instruction::bare(Opcode::Hlt),
        ]));

        run(&mut cpu);

        assert_eq!(r(&cpu, 0), 30);
        assert_eq!(r(&cpu, 1), 120);
        assert_eq!(r(&cpu, 2), 8);
    }

    #[test]
    fn test_wrapping_arithmetic() {
        let mut cpu = cpu_with(&[
            encode(&Instruction::ext(Opcode::Mov, 0)),
            0xFFFF,
            encode(&Instruction::imm(Opcode::Add, 0, 2)),
            encode(&Instruction::ext(Opcode::Mov, 1)),
            0x8000,
            encode(&Instruction::imm(Opcode::Mul, 1, 2)),
            encode(&Instruction::bare(Opcode::Hlt)),
        ]);

        run(&mut cpu);

        assert_eq!(r(&cpu, 0), 1);
        assert_eq!(r(&cpu, 1), 0);
    }

    #[test]
    fn test_not_and_wide_shifts() {
        let mut cpu = cpu_with(&make_program(&[
            Instruction::imm(Opcode::Mov, 3, 1),
            Instruction::imm(Opcode::Shl, 3, 16),
            Instruction::bare(Opcode::Not),
            Instruction::bare(Opcode::Hlt),
        ]));

        run(&mut cpu);

        assert_eq!(r(&cpu, 3), 0);
        assert_eq!(r(&cpu, 0), 0xFFFF);
    }

    #[test]
    fn test_shr_is_logical() {
        let mut cpu = cpu_with(&[
            encode(&Instruction::ext(Opcode::Mov, 0)),
            0x8000,
            encode(&Instruction::imm(Opcode::Shr, 0, 15)),
        ]);

        cpu.step();
        cpu.step();

        assert_eq!(r(&cpu, 0), 1);
    }

    #[test]
    fn test_first_register_read_sets_flags() {
        let mut cpu = cpu_with(&make_program(&[Instruction::bare(Opcode::Nop)]));
        cpu.regs.set(RegIndex::clamped(0), 0xFFFF);

        cpu.step();

        assert_eq!(cpu.flags, Flags { n: true, p: false, z: false });
    }

    #[test]
    fn test_second_register_read_sets_flags_last() {
        // ADD R0, R1: R0 is read first, R1 second
        let mut cpu = cpu_with(&make_program(&[Instruction::reg(Opcode::Add, 0, 1)]));
        cpu.regs.set(RegIndex::clamped(0), 0xFFFF);
        cpu.regs.set(RegIndex::clamped(1), 0);

        cpu.step();

        assert_eq!(cpu.flags, Flags { n: false, p: false, z: true });
        // writes do not update the flags
        assert_eq!(r(&cpu, 0), 0xFFFF);
    }

    #[test]
    fn test_conditional_jump_taken() {
        // JMP on R1 (positive) to 0b0001_010: mask = P
        let mut cpu = cpu_with(&make_program(&[
            Instruction::imm(Opcode::Mov, 1, 1),
            Instruction::jmp(1, 0x0A),
        ]));

        cpu.step();
        let outcome = cpu.step();

        assert_eq!(outcome.fault, None);
        assert_eq!(cpu.regs.pc, 0x0A);
    }

    #[test]
    fn test_conditional_jump_not_taken() {
        // R1 is zero, mask selects N and P only
        let mut cpu = cpu_with(&make_program(&[Instruction::jmp(1, 0x0E)]));

        cpu.step();

        assert_eq!(cpu.regs.pc, 1);
    }

    #[test]
    fn test_extended_jump_is_unconditional() {
        let mut cpu = cpu_with(&[encode(&Instruction::ext(Opcode::Jmp, 0)), 0x0200]);

        cpu.step();

        assert_eq!(cpu.regs.pc, 0x0200);
    }

    #[test]
    fn test_jump_register_operand_is_invalid() {
        let mut cpu = cpu_with(&make_program(&[Instruction::reg(Opcode::Jmp, 0, 1)]));
        cpu.regs.pc = 0;

        let outcome = cpu.step();

        assert!(!outcome.halted);
        assert_eq!(
            outcome.fault,
            Some(CpuError::InvalidOperand { opcode: Opcode::Jmp, pc: 0 })
        );
        assert!(cpu.is_running());
        assert_eq!(cpu.regs.pc, 1);
    }

    #[test]
    fn test_jsr_register_operand_is_invalid() {
        let mut cpu = cpu_with(&make_program(&[Instruction::reg(Opcode::Jsr, 0, 2)]));

        let outcome = cpu.step();

        assert!(matches!(outcome.fault, Some(CpuError::InvalidOperand { opcode: Opcode::Jsr, .. })));
        assert_eq!(cpu.regs.rr, 0);
        assert_eq!(cpu.regs.pc, 1);
    }

    #[test]
    fn test_subroutine_call_and_return() {
        let mut program = vec![0u16; 0x20];
        program[0] = encode(&Instruction::ext(Opcode::Jsr, 0));
        program[1] = 0x10;
        program[2] = encode(&Instruction::bare(Opcode::Hlt));
        program[0x10] = encode(&Instruction::imm(Opcode::Mov, 3, 9));
        program[0x11] = encode(&Instruction::bare(Opcode::Ret));
        let mut cpu = cpu_with(&program);

        cpu.step();
        assert_eq!(cpu.regs.pc, 0x10);
        assert_eq!(cpu.regs.rr, 2);

        assert_eq!(run(&mut cpu), 3);
        assert_eq!(r(&cpu, 3), 9);
        assert_eq!(cpu.regs.pc, 2);
    }

    #[test]
    fn test_reserved_opcode_is_nop() {
        let mut cpu = cpu_with(&[0xF8FF, 0x1234]);

        let outcome = cpu.step();

        assert_eq!(outcome, StepOutcome { halted: false, fault: None });
        assert_eq!(cpu.regs.pc, 1);
        assert_eq!(cpu.regs.gpr, [0; 8]);
    }

    #[test]
    fn test_pc_wraps_at_end_of_memory() {
        let mut cpu = Cpu::new();
        cpu.regs.pc = 1023;

        cpu.step();

        assert_eq!(cpu.regs.pc, 0);
    }

    #[test]
    fn test_extended_operand_wraps_at_end_of_memory() {
        let mut cpu = Cpu::new();
        cpu.mem.write(1023, encode(&Instruction::ext(Opcode::Mov, 1)));
        cpu.mem.write(0, 0x0777);
        cpu.regs.pc = 1023;

        cpu.step();

        assert_eq!(r(&cpu, 1), 0x0777);
        assert_eq!(cpu.regs.pc, 1);
    }

    #[test]
    fn test_reset() {
        let mut cpu = cpu_with(&[1, 2, 3]);
        cpu.step();
        cpu.reset();

        assert_eq!(cpu.snapshot().registers, Registers::default());
        assert_eq!(cpu.mem.read(1), 0);
        assert_eq!(cpu.cycles, 0);
    }
}
