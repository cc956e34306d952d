//! Logging and output control
//!
//! This module provides the [`Logger`] for controlling output verbosity,
//! formatting logs, and tracking operation timing. It supports quiet and
//! verbose modes.

use std::time::{Duration, Instant};

/// Logger responsible for all operator-facing output
#[derive(Debug, Clone)]
pub struct Logger {
    pub verbose: bool,
    pub quiet: bool,
    start_time: Instant,
}

impl Logger {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            quiet: false,
            start_time: Instant::now(),
        }
    }

    pub fn new_quiet() -> Self {
        Self {
            verbose: false,
            quiet: true,
            start_time: Instant::now(),
        }
    }

    /// Main section heading
    pub fn section(&self, title: &str) {
        if !self.quiet {
            println!("\n=== {} ===", title);
        }
    }

    pub fn debug(&self, message: &str) {
        if self.verbose && !self.quiet {
            self.print_with_timestamp("DEBUG", message);
        }
    }

    pub fn info(&self, message: &str) {
        if !self.quiet {
            self.print_with_timestamp("INFO", message);
        }
    }

    pub fn success(&self, message: &str) {
        if !self.quiet {
            self.print_with_timestamp("SUCCESS", message);
        }
    }

    pub fn warning(&self, message: &str) {
        if !self.quiet {
            self.print_with_timestamp("WARN", message);
        }
    }

    pub fn error(&self, message: &str) {
        eprintln!("ERROR: {}", message);
    }

    /// Individual step within an operation, verbose only
    pub fn step(&self, step: &str) {
        if self.verbose && !self.quiet {
            println!("  - {}", step);
        }
    }

    fn print_with_timestamp(&self, level: &str, message: &str) {
        if self.verbose {
            println!(
                "[{:8.3}s] {} {}",
                self.start_time.elapsed().as_secs_f64(),
                level,
                message
            );
        } else {
            println!("{} {}", level, message);
        }
    }

    pub fn format_duration(&self, duration: Duration) -> String {
        let secs = duration.as_secs();
        if secs < 60 {
            format!("{:.1}s", duration.as_secs_f64())
        } else {
            format!("{}m{:02}s", secs / 60, secs % 60)
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}
