//! Line-oriented debugger loop.

use std::io::{self, BufRead, Write};
use super::Session;

/// Read commands from `input` until EOF or `exit`, writing replies and
/// machine state to `out`.
pub fn run_repl<R: BufRead, W: Write>(session: &mut Session, input: R, mut out: W) -> io::Result<()> {
    print_status(session, &mut out)?;

    let mut lines = input.lines();
    loop {
        write!(out, "> ")?;
        out.flush()?;

        let Some(line) = lines.next() else {
            writeln!(out)?;
            break;
        };
        let reply = session.execute_line(&line?);

        for message in &reply.lines {
            writeln!(out, "{}", message)?;
        }
        if reply.quit {
            break;
        }
        if reply.refresh {
            print_status(session, &mut out)?;
        }
    }
    Ok(())
}

fn print_status<W: Write>(session: &Session, out: &mut W) -> io::Result<()> {
    for line in session.status_lines() {
        writeln!(out, "{}", line)?;
    }
    Ok(())
}
