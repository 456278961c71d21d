//! Debugger application state and logic.

use crate::debugger::{Mode, StopReason};
use crate::program::disassemble_word;
use crate::shell::{describe_resume, parse_command, Command, Session};

/// Instructions executed per frame while continuing.
const BATCH: u64 = 5_000;

/// Messages kept in the log panel.
const MAX_MESSAGES: usize = 200;

/// Debugger application state.
pub struct DebuggerApp {
    pub session: Session,
    /// Command being typed.
    pub input: String,
    /// Output of past commands, oldest first.
    pub messages: Vec<String>,
    pub should_quit: bool,
}

impl DebuggerApp {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            input: String::new(),
            messages: vec!["Ready. F10 step, F5 continue, Esc pause, type \"h\" for commands.".into()],
            should_quit: false,
        }
    }

    pub fn is_continuing(&self) -> bool {
        self.session.controller().mode() == Mode::Continue
    }

    /// Run the command typed so far.
    pub fn submit(&mut self) {
        let line = std::mem::take(&mut self.input);
        if line.trim().is_empty() {
            return;
        }
        self.push(format!("> {}", line.trim()));

        // continue runs in batches from `tick` so the UI stays responsive
        if let Ok(Some(Command::Continue)) = parse_command(&line) {
            self.start_continue();
            return;
        }

        let reply = self.session.execute_line(&line);
        for message in reply.lines {
            self.push(message);
        }
        if reply.quit {
            self.should_quit = true;
        }
    }

    pub fn step(&mut self) {
        let reply = self.session.execute(Command::Step);
        for message in reply.lines {
            self.push(message);
        }
    }

    pub fn start_continue(&mut self) {
        if self.session.controller().cpu().is_halted() {
            self.push("Program has halted, use \"reset\" to run it again");
            return;
        }
        self.run_batch();
    }

    pub fn pause(&mut self) {
        if self.is_continuing() {
            self.session.controller_mut().pause();
            let pc = self.session.controller().cpu().regs.pc;
            self.push(format!("Paused at address 0x{:X}", pc));
        }
    }

    /// Advance a running continue by one batch.
    pub fn tick(&mut self) {
        if self.is_continuing() {
            self.run_batch();
        }
    }

    fn run_batch(&mut self) {
        let outcome = self.session.controller_mut().resume_limited(BATCH);
        let mut lines = describe_resume(&outcome);
        if outcome.reason == StopReason::StepLimit {
            lines.pop();
        }
        for line in lines {
            self.push(line);
        }
    }

    fn push(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
        if self.messages.len() > MAX_MESSAGES {
            self.messages.remove(0);
        }
    }

    /// Disassembly of `lines` words around PC: (address, text, is_pc, has_breakpoint).
    pub fn get_disassembly(&self, lines: usize) -> Vec<(u16, String, bool, bool)> {
        let controller = self.session.controller();
        let cpu = controller.cpu();
        let pc = cpu.regs.pc;
        let start = pc.saturating_sub((lines / 2) as u16);

        (0..lines as u16)
            .map(|i| start + i)
            .filter(|&addr| (addr as usize) < crate::cpu::MEMORY_SIZE)
            .map(|addr| {
                let text = disassemble_word(cpu.mem.read(addr), cpu.mem.read(addr.wrapping_add(1)));
                (addr, text, addr == pc, controller.has_breakpoint(addr))
            })
            .collect()
    }
}

/// Run the debugger on a session.
pub fn run_debugger(session: Session) -> std::io::Result<()> {
    use crossterm::{
        event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
        terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
        ExecutableCommand,
    };
    use ratatui::prelude::*;
    use std::io::stdout;
    use std::time::Duration;

    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut app = DebuggerApp::new(session);

    loop {
        terminal.draw(|frame| {
            super::ui::draw(frame, &app);
        })?;

        let timeout = if app.is_continuing() { Duration::ZERO } else { Duration::from_millis(50) };
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                            app.should_quit = true
                        }
                        KeyCode::F(10) => app.step(),
                        KeyCode::F(5) => app.start_continue(),
                        KeyCode::Esc => app.pause(),
                        KeyCode::Enter => app.submit(),
                        KeyCode::Backspace => {
                            app.input.pop();
                        }
                        KeyCode::Char(c) => app.input.push(c),
                        _ => {}
                    }
                }
            }
        }

        app.tick();

        if app.should_quit {
            break;
        }
    }

    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::{encode, Instruction, Opcode};
    use crate::program::ProgramImage;
    use crate::shell::ShellConfig;

    fn app_with(words: Vec<u16>) -> DebuggerApp {
        let session = Session::new(ProgramImage::from_words(words), ShellConfig::default()).unwrap();
        DebuggerApp::new(session)
    }

    fn type_line(app: &mut DebuggerApp, line: &str) {
        app.input = line.to_string();
        app.submit();
    }

    #[test]
    fn test_continue_runs_in_batches_until_paused() {
        // JMP 0x0000 forever
        let mut app = app_with(vec![encode(&Instruction::ext(Opcode::Jmp, 0)), 0]);

        type_line(&mut app, "c");
        assert!(app.is_continuing());
        app.tick();
        assert!(app.session.controller().cpu().cycles >= 2 * BATCH);

        app.pause();
        assert!(!app.is_continuing());
        assert!(app.messages.last().unwrap().starts_with("Paused at address"));
    }

    #[test]
    fn test_continue_to_halt() {
        let mut app = app_with(vec![encode(&Instruction::bare(Opcode::Hlt))]);

        app.start_continue();

        assert!(!app.is_continuing());
        assert_eq!(app.messages.last().unwrap(), "Program halted");
    }

    #[test]
    fn test_commands_and_quit() {
        let mut app = app_with(vec![encode(&Instruction::imm(Opcode::Mov, 0, 1))]);

        type_line(&mut app, "br s 3");
        assert_eq!(app.messages.last().unwrap(), "Breakpoint added at address 0x3");
        assert!(app.input.is_empty());

        type_line(&mut app, "e");
        assert!(app.should_quit);
    }

    #[test]
    fn test_disassembly_window() {
        let mut app = app_with(vec![encode(&Instruction::imm(Opcode::Mov, 0, 5))]);
        app.session.controller_mut().add_breakpoint(1);

        let lines = app.get_disassembly(4);

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0].0, 0);
        assert!(lines[0].2);
        assert_eq!(lines[0].1, "MOV R0, #0x05");
        assert!(lines[1].3);
    }
}
