//! Progress bar utilities for frame processing.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Create a progress bar for annotating the frames of one video.
///
/// Shows a bar when the frame count is known and a spinner otherwise.
pub fn create_frame_progress(
    total_frames: Option<u64>,
    file_name: &str,
    enabled: bool,
) -> Option<ProgressBar> {
    if !enabled {
        return None;
    }

    let pb = match total_frames {
        Some(total) if total > 0 => {
            let pb = ProgressBar::new(total);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template(&format!(
                        "{{spinner:.green}} [{{elapsed_precise}}] {{bar:40.cyan/blue}} {{pos}}/{{len}} frames ({{per_sec}}) - {file_name}"
                    ))
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("█▓▒░ "),
            );
            pb
        }
        _ => {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template(&format!(
                        "{{spinner:.green}} [{{elapsed_precise}}] {{pos}} frames ({{per_sec}}) - {file_name}"
                    ))
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            pb
        }
    };
    pb.enable_steady_tick(Duration::from_millis(100));
    Some(pb)
}

/// Increment a progress bar.
pub fn inc_progress(pb: Option<&ProgressBar>) {
    if let Some(pb) = pb {
        pb.inc(1);
    }
}

/// Ends the wrapped progress bar when dropped.
///
/// A bar marked complete finishes with the success message. Otherwise it is
/// abandoned where the run stopped, so a failed run never reads as done.
pub struct ProgressGuard {
    pb: Option<ProgressBar>,
    message: &'static str,
    completed: bool,
}

impl ProgressGuard {
    /// Wrap an optional progress bar with the message shown on success.
    pub fn new(pb: Option<ProgressBar>, message: &'static str) -> Self {
        Self {
            pb,
            message,
            completed: false,
        }
    }

    /// Borrow the progress bar, if any.
    pub fn get(&self) -> Option<&ProgressBar> {
        self.pb.as_ref()
    }

    /// Mark the run as successful.
    pub fn complete(&mut self) {
        self.completed = true;
    }
}

impl Drop for ProgressGuard {
    fn drop(&mut self) {
        if let Some(pb) = self.pb.take() {
            if self.completed {
                pb.finish_with_message(self.message);
            } else {
                pb.abandon_with_message("stopped");
            }
        }
    }
}
