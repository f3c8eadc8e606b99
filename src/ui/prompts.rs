//! ui::prompts
//!
//! Interactive prompts and confirmations.
//!
//! # Design
//!
//! Prompts are only shown in interactive mode. In non-interactive mode,
//! operations requiring user input must either have defaults or fail
//! with a clear error message.

use std::io::{self, BufRead, Write};

use thiserror::Error;

/// Errors from prompts.
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("not in interactive mode")]
    NotInteractive,

    #[error("IO error: {0}")]
    IoError(String),
}

/// Prompt for confirmation (yes/no) on stdin.
///
/// Returns `Ok(true)` if the user confirms, `Ok(false)` if they decline.
/// An empty answer or end of input selects `default`.
///
/// # Errors
///
/// [`PromptError::NotInteractive`] if not in interactive mode.
pub fn confirm(message: &str, default: bool, interactive: bool) -> Result<bool, PromptError> {
    if !interactive {
        return Err(PromptError::NotInteractive);
    }
    let stdin = io::stdin();
    confirm_with(message, default, &mut stdin.lock(), &mut io::stdout())
}

fn confirm_with(
    message: &str,
    default: bool,
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> Result<bool, PromptError> {
    let hint = if default { "Y/n" } else { "y/N" };
    write!(output, "{} [{}]: ", message, hint).map_err(io_err)?;
    output.flush().map_err(io_err)?;

    let mut line = String::new();
    let read = input.read_line(&mut line).map_err(io_err)?;
    if read == 0 {
        return Ok(default);
    }
    Ok(parse_answer(&line, default))
}

fn parse_answer(line: &str, default: bool) -> bool {
    match line.trim().to_ascii_lowercase().as_str() {
        "" => default,
        "y" | "yes" => true,
        _ => false,
    }
}

fn io_err(e: io::Error) -> PromptError {
    PromptError::IoError(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ask(answer: &str, default: bool) -> (bool, String) {
        let mut input = io::Cursor::new(answer.as_bytes().to_vec());
        let mut output = Vec::new();
        let result = confirm_with("Proceed?", default, &mut input, &mut output).unwrap();
        (result, String::from_utf8(output).unwrap())
    }

    #[test]
    fn yes_confirms() {
        assert!(ask("y\n", false).0);
        assert!(ask("YES\n", false).0);
    }

    #[test]
    fn anything_else_declines() {
        assert!(!ask("n\n", true).0);
        assert!(!ask("sure\n", true).0);
    }

    #[test]
    fn empty_answer_uses_default() {
        assert!(ask("\n", true).0);
        assert!(!ask("\n", false).0);
    }

    #[test]
    fn end_of_input_uses_default() {
        assert!(!ask("", false).0);
    }

    #[test]
    fn prompt_shows_default_hint() {
        assert_eq!(ask("y\n", false).1, "Proceed? [y/N]: ");
        assert_eq!(ask("y\n", true).1, "Proceed? [Y/n]: ");
    }

    #[test]
    fn non_interactive_errors() {
        assert!(matches!(
            confirm("Proceed?", true, false),
            Err(PromptError::NotInteractive)
        ));
    }
}
