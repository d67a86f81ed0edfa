//! Spinners for long-running API calls.

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Start a spinner with a message. Hidden when `quiet` is set.
pub fn spinner(msg: &str, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

pub fn finish_success(pb: &ProgressBar, msg: &str) {
    pb.finish_and_clear();
    if !pb.is_hidden() {
        println!("{} {}", "✓".green(), msg);
    }
}

pub fn finish_error(pb: &ProgressBar, msg: &str) {
    pb.finish_and_clear();
    eprintln!("{} {}", "✗".red(), msg);
}

pub fn finish_clear(pb: &ProgressBar) {
    pb.finish_and_clear();
}
