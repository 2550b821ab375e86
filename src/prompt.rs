//! Injected confirmation/message capability.
//!
//! The core never owns UI: destructive operations ask for confirmation and
//! surface save errors through this trait, and whatever shell is attached
//! (console today, a window later) decides how to render the prompt.

use std::io::{BufRead, Write};

/// Blocking confirm/message prompts supplied by the shell.
pub trait Prompter {
    /// Ask a yes/no question; `false` aborts the operation.
    fn confirm(&self, message: &str) -> bool;

    /// Show a message the user has to see (save errors, delete results).
    fn message(&self, message: &str);
}

/// Console prompter for CLI use: `[y/N]` on stdin, messages on stdout.
#[derive(Debug, Default)]
pub struct ConsolePrompter;

impl Prompter for ConsolePrompter {
    fn confirm(&self, message: &str) -> bool {
        print!("{message} [y/N] ");
        if std::io::stdout().flush().is_err() {
            return false;
        }

        let mut answer = String::new();
        let stdin = std::io::stdin();
        if stdin.lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim(), "y" | "Y" | "yes")
    }

    fn message(&self, message: &str) {
        println!("{message}");
    }
}
