//! Interactive prompt.

use super::frontend::{process, Command};
use seglog_core::Log;
use std::io::{self, BufRead, Write};

/// Reads commands from `input` until `exit` or end of input.
///
/// Each result goes to `output` on its own line; a failed command, a blank
/// line included, prints `Error: ...` and the loop carries on.
pub fn run(log: &Log, input: impl BufRead, mut output: impl Write) -> io::Result<()> {
    writeln!(output, "Enter commands, type 'exit' to quit:")?;

    let mut lines = input.lines();
    loop {
        write!(output, "> ")?;
        output.flush()?;

        let Some(line) = lines.next() else {
            writeln!(output)?;
            break;
        };
        let command = Command::parse(&line?);
        if command.is_exit() {
            writeln!(output, "Exiting...")?;
            break;
        }

        match process(&command, log) {
            Ok(result) => writeln!(output, "{result}")?,
            Err(err) => writeln!(output, "Error: {err}")?,
        }
    }

    Ok(())
}
