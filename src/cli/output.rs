//! Shared CLI output helpers for consistent operator-facing text.

use std::fmt::Display;
use std::time::Duration;

const RULE_WIDTH: usize = 48;

/// Print a section header and separator.
pub fn section(title: &str) {
    println!();
    println!("{title}");
    println!("{}", "─".repeat(RULE_WIDTH));
}

/// Print a simple key/value line.
pub fn key_value(label: &str, value: impl Display) {
    println!("{label:<16} {value}");
}

/// Print a successful status line.
pub fn ok(message: &str) {
    println!("✓ {message}");
}

/// Print a warning status line.
pub fn warn(message: &str) {
    println!("⚠ {message}");
}

/// Print an error status line.
pub fn error(message: &str) {
    eprintln!("✗ {message}");
}

/// A millisecond setting as written in the config, with a coarser unit
/// alongside when it divides evenly: `30000 ms (30 s)`.
pub fn millis(ms: u64) -> String {
    match coarse(Duration::from_millis(ms)) {
        Some(coarse) => format!("{ms} ms ({coarse})"),
        None => format!("{ms} ms"),
    }
}

/// Reconnect delays in attempt order: `2 s → 4 s → 8 s`.
pub fn schedule(delays: impl IntoIterator<Item = Duration>) -> String {
    let steps: Vec<String> = delays
        .into_iter()
        .map(|delay| coarse(delay).unwrap_or_else(|| format!("{} ms", delay.as_millis())))
        .collect();
    if steps.is_empty() {
        "none".to_string()
    } else {
        steps.join(" → ")
    }
}

fn coarse(duration: Duration) -> Option<String> {
    let ms = duration.as_millis();
    if ms == 0 {
        None
    } else if ms % 60_000 == 0 {
        Some(format!("{} min", ms / 60_000))
    } else if ms % 1_000 == 0 {
        Some(format!("{} s", ms / 1_000))
    } else {
        None
    }
}
