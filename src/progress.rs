//! Download progress display using indicatif.
//!
//! One bar counts finished downloads; the message shows the latest photo id.
//! In quiet mode nothing is drawn.

use indicatif::{ProgressBar, ProgressStyle};

use crate::download::{DownloadFinished, DownloadOutcome};

/// Progress bar for a batch of downloads.
#[derive(Debug, Clone)]
pub struct DownloadProgress {
    bar: Option<ProgressBar>,
}

impl DownloadProgress {
    /// Create a bar for `total` downloads, or a no-op reporter when `quiet`.
    #[must_use]
    pub fn new(total: usize, quiet: bool) -> Self {
        if quiet {
            return Self { bar: None };
        }
        let bar = ProgressBar::new(total as u64);
        bar.set_style(Self::style());
        bar.set_message("Downloading");
        Self { bar: Some(bar) }
    }

    fn style() -> ProgressStyle {
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█>-")
    }

    /// Change the number of downloads the bar counts towards.
    pub fn set_total(&self, total: usize) {
        if let Some(ref bar) = self.bar {
            bar.set_length(total as u64);
        }
    }

    /// Record one finished download.
    pub fn on_finished(&self, finished: &DownloadFinished) {
        let Some(ref bar) = self.bar else {
            return;
        };
        let status = match finished.outcome {
            DownloadOutcome::Saved { .. } => "saved",
            DownloadOutcome::AlreadySaved { .. } => "already saved",
            DownloadOutcome::Failed(_) => "failed",
        };
        bar.inc(1);
        bar.set_message(format!("{} {}", finished.photo_id, status));
    }

    /// Print a line above the bar without breaking it.
    pub fn println(&self, line: &str) {
        match self.bar {
            Some(ref bar) => bar.println(line),
            None => println!("{line}"),
        }
    }

    /// Finish and clear the bar.
    pub fn finish(&self) {
        if let Some(ref bar) = self.bar {
            bar.finish_and_clear();
        }
    }
}
