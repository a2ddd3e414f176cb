//! Progress reporting over grid rows

use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

/// Optional progress bar advanced once per streamed row
pub struct ProgressReporter {
    progress_bar: Option<ProgressBar>,
}

impl ProgressReporter {
    /// Create a disabled reporter
    pub fn new() -> Self {
        Self { progress_bar: None }
    }

    /// Set up the progress bar once the row count is known from the header
    pub fn setup_progress(&mut self, total_rows: usize, region: &str) {
        let pb = ProgressBar::new(total_rows as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} rows ({percent}%) | {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ");
        pb.set_style(style);
        pb.set_message(format!("Streaming {}", region));

        debug!("Progress bar initialized for {} rows", total_rows);
        self.progress_bar = Some(pb);
    }

    /// Advance by one completed row
    pub fn row_completed(&self) {
        if let Some(ref pb) = self.progress_bar {
            pb.inc(1);
        }
    }

    /// Finish with a completion message
    pub fn finish(&self, cells_emitted: usize) {
        if let Some(ref pb) = self.progress_bar {
            let message = format!("Completed: {} cells", cells_emitted);
            pb.finish_with_message(message.clone());
            debug!("Progress reporting completed: {}", message);
        }
    }

    /// Finish with an error message
    pub fn finish_with_error(&self, error_message: &str) {
        if let Some(ref pb) = self.progress_bar {
            pb.abandon_with_message(format!("Failed: {}", error_message));
            debug!("Progress reporting finished with error: {}", error_message);
        }
    }

}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}
