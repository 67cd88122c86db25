//! Output formatting utilities for CLI commands

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;

/// Print one greeting, either as a JSON line or as decorated text.
pub fn greeting<T: Serialize>(message: &T, text: &str, json: bool) -> Result<()> {
    if json {
        let line = serde_json::to_string(message).context("Failed to encode response")?;
        println!("{}", line);
    } else {
        println!("{} {}", "→".green(), text);
    }
    Ok(())
}

/// Print info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print warning message
pub fn warning(msg: &str) {
    eprintln!("{} {}", "⚠".yellow(), msg);
}

/// Print a method row for `describe`
pub fn method(name: &str, kind: &str, path: &str) {
    println!("  {:<16} {:<18} {}", name.bold(), kind.cyan(), path.dimmed());
}
