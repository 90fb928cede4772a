//! Spinner and timing helpers for the command-line driver.
//!
//! In log-only mode spinners are hidden and phase boundaries go through the
//! logger instead, which keeps output tail-friendly.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::{Duration, Instant};

/// Format duration in human-readable format
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 1.0 {
        format!("{}ms", d.as_millis())
    } else if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.1}m", secs / 60.0)
    }
}

/// Create a spinner for indeterminate progress.
/// In log-only mode, the spinner is hidden.
pub fn create_spinner(msg: &str, log_only: bool) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if log_only {
        pb.set_draw_target(ProgressDrawTarget::hidden());
    } else {
        if let Ok(style) = ProgressStyle::default_spinner().template("{msg} {spinner} [{elapsed_precise}]") {
            pb.set_style(style);
        }
        pb.enable_steady_tick(Duration::from_millis(100));
    }
    pb.set_message(msg.to_string());
    pb
}

/// Run one named phase under a spinner and log how long it took.
pub fn run_phase<T>(name: &str, log_only: bool, phase: impl FnOnce() -> T) -> T {
    let pb = create_spinner(name, log_only);
    let start = Instant::now();
    let result = phase();
    let elapsed = format_duration(start.elapsed());
    pb.finish_and_clear();
    log::info!("[{}] done in {}", name, elapsed);
    result
}
