// src/commands/progress.rs
//! Progress display for package operations
//!
//! Bridges package-level events from the operation engine onto indicatif:
//! an overall progress bar on top with a status line below showing the
//! package currently being worked on.

use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use bale::ProgressSink;

/// Terminal progress display for multi-package operations.
///
/// Safe to drive from the fetch worker pool; indicatif bars are
/// internally synchronized.
pub struct ConsoleProgress {
    overall: ProgressBar,
    status: ProgressBar,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        let multi = MultiProgress::new();

        // Overall progress bar
        let overall = ProgressBar::new(0);
        overall.set_style(
            ProgressStyle::default_bar()
                .template("{msg} ({pos}/{len}) [{bar:40.green/dim}] {percent}%")
                .expect("Invalid progress bar template")
                .progress_chars("##-"),
        );

        // Status line below (spinner with message)
        let status = ProgressBar::new_spinner();
        status.set_style(
            ProgressStyle::default_spinner()
                .template("  {spinner:.cyan} {msg}")
                .expect("Invalid spinner template"),
        );

        let overall = multi.add(overall);
        let status = multi.add(status);

        Self { overall, status }
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for ConsoleProgress {
    fn begin(&self, operation: &str, total: usize) {
        let label = match operation {
            "install" => "Installing packages",
            "update" => "Updating packages",
            "uninstall" => "Removing packages",
            "prune" => "Pruning packages",
            "outdated" => "Checking upstream",
            other => other,
        };
        self.overall.set_length(total as u64);
        self.overall.set_message(label.to_string());
        self.status.enable_steady_tick(Duration::from_millis(100));
    }

    fn package_started(&self, import_path: &str) {
        self.status.set_message(format!("{}...", import_path));
    }

    fn package_finished(&self, import_path: &str, success: bool, detail: &str) {
        let msg = if success {
            format!("{} [done]", import_path)
        } else {
            format!("{} [FAILED: {}]", import_path, detail)
        };
        self.status.set_message(msg);
        self.overall.inc(1);
    }

    fn finish(&self, summary: &str) {
        self.status.finish_and_clear();
        self.overall.finish_with_message(summary.to_string());
    }
}
