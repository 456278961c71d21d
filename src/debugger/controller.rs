//! Step/continue control over a CPU.

use crate::cpu::{Cpu, CpuError, CpuState, StepOutcome};
use super::Breakpoints;

/// Whether the controller was last asked to step or to continue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Step,
    Continue,
}

/// Why `resume` returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// The CPU executed HLT.
    Halted,
    /// PC reached a breakpoint. The instruction there has not run yet.
    Breakpoint(u16),
    /// A fault occurred with exit-on-error enabled. The CPU is halted.
    Fault(CpuError),
    /// `resume_limited` ran out of steps.
    StepLimit,
}

/// Result of a continue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeOutcome {
    pub reason: StopReason,
    /// Instructions executed.
    pub steps: u64,
    /// Recoverable faults seen on the way.
    pub faults: Vec<CpuError>,
}

/// Drives a CPU for the debugger shell.
#[derive(Debug, Clone, Default)]
pub struct Controller {
    cpu: Cpu,
    breakpoints: Breakpoints,
    mode: Mode,
    exit_on_error: bool,
}

impl Controller {
    pub fn new(cpu: Cpu) -> Self {
        Self {
            cpu,
            breakpoints: Breakpoints::new(),
            mode: Mode::Step,
            exit_on_error: false,
        }
    }

    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Cpu {
        &mut self.cpu
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Drop back to step mode, e.g. when the user pauses a continue.
    pub fn pause(&mut self) {
        self.mode = Mode::Step;
    }

    pub fn exit_on_error(&self) -> bool {
        self.exit_on_error
    }

    /// When set, any fault halts the CPU.
    pub fn set_exit_on_error(&mut self, on: bool) {
        self.exit_on_error = on;
    }

    /// Execute one instruction.
    ///
    /// Must not be called once the CPU has halted.
    pub fn step(&mut self) -> StepOutcome {
        self.mode = Mode::Step;
        self.step_once()
    }

    /// Run until the CPU halts or PC reaches a breakpoint.
    ///
    /// The breakpoint check happens before each instruction, including the
    /// first: resuming while PC sits on a breakpoint returns immediately.
    /// If the program neither halts nor reaches a breakpoint this never
    /// returns; use `resume_limited` when the caller needs control back.
    pub fn resume(&mut self) -> ResumeOutcome {
        self.run(None)
    }

    /// Like `resume`, but gives up after `max_steps` instructions.
    ///
    /// On `StepLimit` the controller stays in continue mode so the caller can
    /// call this again.
    pub fn resume_limited(&mut self, max_steps: u64) -> ResumeOutcome {
        self.run(Some(max_steps))
    }

    fn run(&mut self, limit: Option<u64>) -> ResumeOutcome {
        self.mode = Mode::Continue;
        let mut steps = 0;
        let mut faults = Vec::new();

        let reason = loop {
            let pc = self.cpu.regs.pc;
            if self.breakpoints.has(pc) {
                break StopReason::Breakpoint(pc);
            }
            if limit.is_some_and(|max| steps >= max) {
                break StopReason::StepLimit;
            }

            let outcome = self.step_once();
            steps += 1;

            if let Some(fault) = outcome.fault {
                if self.exit_on_error {
                    break StopReason::Fault(fault);
                }
                faults.push(fault);
            }
            if outcome.halted {
                break StopReason::Halted;
            }
        };

        if reason != StopReason::StepLimit {
            self.mode = Mode::Step;
        }
        log::debug!("stopped after {} steps: {:?}", steps, reason);

        ResumeOutcome { reason, steps, faults }
    }

    fn step_once(&mut self) -> StepOutcome {
        let mut outcome = self.cpu.step();
        if outcome.fault.is_some() && self.exit_on_error {
            self.cpu.state = CpuState::Halted;
            outcome.halted = true;
        }
        outcome
    }

    /// Set a breakpoint. Returns false if it was already set.
    pub fn add_breakpoint(&mut self, addr: u16) -> bool {
        self.breakpoints.add(addr)
    }

    /// Remove a breakpoint. Returns false if none was set.
    pub fn delete_breakpoint(&mut self, addr: u16) -> bool {
        self.breakpoints.delete(addr)
    }

    pub fn has_breakpoint(&self, addr: u16) -> bool {
        self.breakpoints.has(addr)
    }

    pub fn breakpoints(&self) -> Vec<u16> {
        self.breakpoints.list()
    }

    pub fn clear_breakpoints(&mut self) {
        self.breakpoints.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::{encode, Instruction, Opcode, RegIndex};
    use proptest::prelude::*;

    fn controller_with(instructions: &[Instruction]) -> Controller {
        let words: Vec<u16> = instructions.iter().map(encode).collect();
        let mut cpu = Cpu::new();
        cpu.load_program(0, &words).unwrap();
        Controller::new(cpu)
    }

    fn mov_mov_hlt() -> Controller {
        controller_with(&[
            Instruction::imm(Opcode::Mov, 0, 5),
            Instruction::imm(Opcode::Mov, 1, 7),
            Instruction::bare(Opcode::Hlt),
        ])
    }

    fn r(ctl: &Controller, n: u16) -> u16 {
        ctl.cpu().regs.get(RegIndex::clamped(n))
    }

    #[test]
    fn test_resume_stops_before_breakpoint() {
        let mut ctl = mov_mov_hlt();
        ctl.add_breakpoint(1);

        let outcome = ctl.resume();

        assert_eq!(outcome.reason, StopReason::Breakpoint(1));
        assert_eq!(outcome.steps, 1);
        assert_eq!(ctl.cpu().regs.pc, 1);
        assert_eq!(r(&ctl, 0), 5);
        assert_eq!(r(&ctl, 1), 0);
        assert_eq!(ctl.mode(), Mode::Step);
    }

    #[test]
    fn test_resume_stops_before_breakpoint_on_halt() {
        let mut ctl = mov_mov_hlt();
        ctl.add_breakpoint(2);

        let outcome = ctl.resume();

        assert_eq!(outcome.reason, StopReason::Breakpoint(2));
        assert_eq!(ctl.cpu().regs.pc, 2);
        assert!(ctl.cpu().is_running());
        assert_eq!(r(&ctl, 1), 7);
    }

    #[test]
    fn test_resume_at_breakpoint_returns_immediately() {
        let mut ctl = mov_mov_hlt();
        ctl.add_breakpoint(0);

        let outcome = ctl.resume();

        assert_eq!(outcome.reason, StopReason::Breakpoint(0));
        assert_eq!(outcome.steps, 0);

        // stepping moves past it
        ctl.step();
        assert_eq!(ctl.resume().reason, StopReason::Halted);
    }

    #[test]
    fn test_resume_runs_to_halt() {
        let mut ctl = mov_mov_hlt();

        let outcome = ctl.resume();

        assert_eq!(outcome.reason, StopReason::Halted);
        assert_eq!(outcome.steps, 3);
        assert!(ctl.cpu().is_halted());
    }

    #[test]
    fn test_step_reports_halt() {
        let mut ctl = controller_with(&[Instruction::bare(Opcode::Hlt)]);

        let outcome = ctl.step();

        assert!(outcome.halted);
        assert_eq!(ctl.cpu().state, CpuState::Halted);
    }

    #[test]
    fn test_faults_are_collected_and_execution_continues() {
        let mut ctl = controller_with(&[
            Instruction::reg(Opcode::Jmp, 0, 1),
            Instruction::reg(Opcode::Jsr, 0, 1),
            Instruction::bare(Opcode::Hlt),
        ]);

        let outcome = ctl.resume();

        assert_eq!(outcome.reason, StopReason::Halted);
        assert_eq!(outcome.faults.len(), 2);
    }

    #[test]
    fn test_exit_on_error_halts() {
        let mut ctl = controller_with(&[
            Instruction::reg(Opcode::Jmp, 0, 1),
            Instruction::bare(Opcode::Hlt),
        ]);
        ctl.set_exit_on_error(true);

        let outcome = ctl.resume();

        assert!(matches!(outcome.reason, StopReason::Fault(CpuError::InvalidOperand { .. })));
        assert!(ctl.cpu().is_halted());
        assert_eq!(outcome.steps, 1);
    }

    #[test]
    fn test_exit_on_error_step() {
        let mut ctl = controller_with(&[Instruction::reg(Opcode::Jmp, 0, 1)]);
        ctl.set_exit_on_error(true);

        let outcome = ctl.step();

        assert!(outcome.halted);
        assert!(outcome.fault.is_some());
    }

    #[test]
    fn test_resume_limited() {
        // JMP (extended, unconditional) to itself
        let mut cpu = Cpu::new();
        cpu.load_program(0, &[encode(&Instruction::ext(Opcode::Jmp, 0)), 0]).unwrap();
        let mut ctl = Controller::new(cpu);

        let outcome = ctl.resume_limited(100);

        assert_eq!(outcome.reason, StopReason::StepLimit);
        assert_eq!(outcome.steps, 100);
        assert_eq!(ctl.mode(), Mode::Continue);

        ctl.pause();
        assert_eq!(ctl.mode(), Mode::Step);
    }

    #[test]
    fn test_breakpoint_operations() {
        let mut ctl = Controller::default();
        assert!(ctl.add_breakpoint(2));
        assert!(!ctl.add_breakpoint(2));
        assert!(ctl.has_breakpoint(2));
        assert_eq!(ctl.breakpoints(), vec![2]);

        assert!(!ctl.delete_breakpoint(3));
        assert!(ctl.delete_breakpoint(2));

        ctl.add_breakpoint(9);
        ctl.clear_breakpoints();
        assert!(ctl.breakpoints().is_empty());
    }

    proptest! {
        #[test]
        fn prop_resume_stops_at_any_breakpoint(len in 1usize..64, bp_seed: usize) {
            // `len` NOPs followed by HLT
            let mut program = vec![Instruction::bare(Opcode::Nop); len];
            program.push(Instruction::bare(Opcode::Hlt));
            let mut ctl = controller_with(&program);
            let bp = (bp_seed % (len + 1)) as u16;
            ctl.add_breakpoint(bp);

            let outcome = ctl.resume();

            prop_assert_eq!(outcome.reason, StopReason::Breakpoint(bp));
            prop_assert_eq!(outcome.steps, bp as u64);
            prop_assert!(ctl.cpu().is_running());
        }
    }
}
