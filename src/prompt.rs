//! Interactive y/n confirmation.
//!
//! The workflow takes confirmation as a plain `FnMut(&str) -> bool`;
//! [`confirm`] is the terminal-backed implementation.

use std::io::{self, BufRead, Write};

/// Ask on stdout, read the answer from stdin.
///
/// A read error or end of input counts as "no".
pub fn confirm(prompt: &str) -> bool {
    let stdin = io::stdin();
    let stdout = io::stdout();
    ask(&mut stdin.lock(), &mut stdout.lock(), prompt).unwrap_or_else(|e| {
        tracing::warn!("could not read confirmation: {e}");
        false
    })
}

/// Ask `prompt` until the answer is yes or no.
///
/// Accepts `y`/`yes`/`n`/`no` in any case. Anything else re-asks.
/// End of input answers no.
pub fn ask(input: &mut impl BufRead, output: &mut impl Write, prompt: &str) -> io::Result<bool> {
    loop {
        write!(output, "{prompt} (y/n): ")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            writeln!(output)?;
            return Ok(false);
        }

        match line.trim().to_lowercase().as_str() {
            "y" | "yes" => return Ok(true),
            "n" | "no" => return Ok(false),
            _ => writeln!(output, "Please enter 'y' or 'n'.")?,
        }
    }
}
