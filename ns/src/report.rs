//! Console progress lines
//!
//! Every step prints `[<label>] <symbol> <message>` to stdout so an operator
//! watching the run can tell each outcome apart at a glance. The same line is
//! mirrored to the log file.

use colored::*;
use std::fmt;
use tracing::info;

/// Symbol for each kind of progress line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    Processing,
    Validating,
    Waiting,
    Sending,
    Sent,
    Skipped,
    Error,
}

impl Mark {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Processing => "⚙️",
            Self::Validating => "📱",
            Self::Waiting => "⏳",
            Self::Sending => "📤",
            Self::Sent => "✅",
            Self::Skipped => "⏩",
            Self::Error => "❌",
        }
    }

    fn paint(&self, message: &str) -> ColoredString {
        match self {
            Self::Sent => message.green(),
            Self::Skipped => message.yellow(),
            Self::Error => message.red(),
            Self::Waiting => message.dimmed(),
            _ => message.normal(),
        }
    }
}

/// Format a progress line without colour
pub fn line(label: &str, mark: Mark, message: impl fmt::Display) -> String {
    format!("[{}] {} {}", label, mark.symbol(), message)
}

/// Print a progress line and mirror it to the log
pub fn step(label: &str, mark: Mark, message: impl fmt::Display) {
    let message = message.to_string();
    info!("{}", line(label, mark, &message));
    println!("[{}] {} {}", label.bold(), mark.symbol(), mark.paint(&message));
}

pub fn separator() {
    println!("{}", "-----------------------------------".dimmed());
}
