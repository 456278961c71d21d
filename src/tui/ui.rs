//! UI rendering for the debugger.

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, List, ListItem},
    style::{Color, Style, Modifier},
};
use crate::shell::{format_memory, format_registers};
use super::app::DebuggerApp;

/// Main draw function.
pub fn draw(frame: &mut Frame, app: &DebuggerApp) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(45),
            Constraint::Percentage(55),
        ])
        .split(frame.area());

    // Left side: code, registers
    let left_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(10),
            Constraint::Length(5),
        ])
        .split(chunks[0]);

    draw_disassembly(frame, left_chunks[0], app);
    draw_registers(frame, left_chunks[1], app);

    // Right side: memory, messages, input, help
    let right_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(8),
            Constraint::Min(6),
            Constraint::Length(3),
            Constraint::Length(4),
        ])
        .split(chunks[1]);

    draw_memory(frame, right_chunks[0], app);
    draw_messages(frame, right_chunks[1], app);
    draw_input(frame, right_chunks[2], app);
    draw_help(frame, right_chunks[3]);
}

fn draw_disassembly(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let disasm = app.get_disassembly((area.height as usize).saturating_sub(2));

    let items: Vec<ListItem> = disasm
        .iter()
        .map(|(addr, text, is_pc, is_bp)| {
            let prefix = if *is_pc { "▶ " } else { "  " };
            let bp = if *is_bp { "●" } else { " " };

            let style = if *is_pc {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else if *is_bp {
                Style::default().fg(Color::Red)
            } else {
                Style::default()
            };

            ListItem::new(format!("{} {}{:04X}: {}", bp, prefix, addr, text)).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default()
            .title(" Disassembly ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)));

    frame.render_widget(list, area);
}

fn draw_registers(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let cpu = app.session.controller().cpu();
    let snapshot = cpu.snapshot();

    let mut content: Vec<Line> = format_registers(&snapshot)
        .into_iter()
        .map(|line| Line::from(Span::styled(line, Style::default().fg(Color::White))))
        .collect();

    let (state, state_style) = if app.is_continuing() {
        ("Continuing", Style::default().fg(Color::Cyan))
    } else if cpu.is_running() {
        ("Running", Style::default().fg(Color::Green))
    } else {
        ("Halted", Style::default().fg(Color::Red))
    };
    content.push(Line::from(vec![
        Span::raw("Cycles: "),
        Span::styled(format!("{}", cpu.cycles), Style::default().fg(Color::Cyan)),
        Span::raw("   State: "),
        Span::styled(state, state_style),
    ]));

    let paragraph = Paragraph::new(content)
        .block(Block::default()
            .title(" Registers ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green)));

    frame.render_widget(paragraph, area);
}

fn draw_memory(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let cpu = app.session.controller().cpu();
    let config = app.session.config();
    let window = config.memory_window;

    let rows = match cpu.mem.window(window.start as usize, window.end as usize) {
        Ok(words) => format_memory(words, window.start, cpu.regs.pc, config.values_per_row, config.highlight_pc),
        Err(e) => vec![e.to_string()],
    };

    let items: Vec<ListItem> = rows
        .into_iter()
        .map(|row| {
            let style = if row.contains('[') {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default().fg(Color::White)
            };
            ListItem::new(row).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default()
            .title(format!(" Memory 0x{:X}..0x{:X} ", window.start, window.end))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta)));

    frame.render_widget(list, area);
}

fn draw_messages(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let visible = (area.height as usize).saturating_sub(2);
    let skip = app.messages.len().saturating_sub(visible);

    let items: Vec<ListItem> = app.messages[skip..]
        .iter()
        .map(|m| ListItem::new(m.as_str()))
        .collect();

    let list = List::new(items)
        .block(Block::default()
            .title(" Messages ")
            .borders(Borders::ALL));

    frame.render_widget(list, area);
}

fn draw_input(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let input = Paragraph::new(format!("> {}_", app.input))
        .style(Style::default().fg(Color::White))
        .block(Block::default()
            .title(" Command ")
            .borders(Borders::ALL));

    frame.render_widget(input, area);
}

fn draw_help(frame: &mut Frame, area: Rect) {
    let help = Paragraph::new(vec![
        Line::from("F10: Step  F5: Continue  Esc: Pause"),
        Line::from("Enter: Run command (h for help)  Ctrl-C: Quit"),
    ])
    .style(Style::default().fg(Color::DarkGray))
    .block(Block::default()
        .title(" Help ")
        .borders(Borders::ALL));

    frame.render_widget(help, area);
}
