//! Colored status output
//!
//! Uses owo-colors for terminal colors. Progress bars live in
//! `helpers::internal::progress`. Everything here respects [`set_quiet`].

use owo_colors::OwoColorize;
use std::sync::atomic::{AtomicBool, Ordering};

static QUIET: AtomicBool = AtomicBool::new(false);

/// Silence status lines and progress bars (e.g. for `--json` output).
/// Warnings and errors still go to stderr.
pub fn set_quiet(quiet: bool) {
    QUIET.store(quiet, Ordering::Relaxed);
}

pub fn is_quiet() -> bool {
    QUIET.load(Ordering::Relaxed)
}

/// Print an action header (blue, bold)
/// Example: "==> Fetching charts"
pub fn action(message: &str) {
    if !is_quiet() {
        println!("{} {}", "==>".blue().bold(), message.bold());
    }
}

/// Print an action with a counter
/// Example: "(1/5) Fetching charts"
pub fn action_numbered(current: usize, total: usize, message: &str) {
    if !is_quiet() {
        println!(
            "{} {}",
            format!("({}/{})", current, total).cyan(),
            message.bold()
        );
    }
}

/// Print a detail line (dimmed)
/// Example: "     GET https://..."
pub fn detail(message: &str) {
    if !is_quiet() {
        println!("     {}", message.dimmed());
    }
}

/// Print a success message (green)
pub fn success(message: &str) {
    if !is_quiet() {
        println!("{} {}", "==>".green().bold(), message.green());
    }
}

/// Print an info message (cyan)
pub fn info(message: &str) {
    if !is_quiet() {
        println!("{} {}", "::".cyan(), message);
    }
}

/// Print a skip message (dimmed)
/// Example: "==> charts cached, skipping"
pub fn skip(message: &str) {
    if !is_quiet() {
        println!("{} {}", "==>".dimmed(), message.dimmed());
    }
}

/// Print a warning message (yellow)
pub fn warning(message: &str) {
    eprintln!("{} {}", "warning:".yellow().bold(), message.yellow());
}

/// Print an error message (red)
pub fn error(message: &str) {
    eprintln!("{} {}", "error:".red().bold(), message.red());
}
