use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Stepwise progress over the pipeline stages. Hidden entirely when quiet.
pub struct StageProgress {
    progress_bar: Option<ProgressBar>,
}

impl StageProgress {
    pub fn new(total_stages: u64, quiet: bool) -> Self {
        if quiet {
            return Self::hidden();
        }

        let pb = ProgressBar::new(total_stages);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .map(|style| style.progress_chars("#>-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        pb.set_style(style);
        pb.enable_steady_tick(Duration::from_millis(100));

        Self {
            progress_bar: Some(pb),
        }
    }

    pub fn hidden() -> Self {
        Self { progress_bar: None }
    }

    pub fn is_hidden(&self) -> bool {
        self.progress_bar.is_none()
    }

    /// Announce the stage about to run.
    pub fn start_stage(&self, message: &str) {
        if let Some(ref pb) = self.progress_bar {
            pb.set_message(message.to_string());
        }
    }

    pub fn finish_stage(&self) {
        if let Some(ref pb) = self.progress_bar {
            pb.inc(1);
        }
    }

    pub fn finish_with_message(&self, message: &str) {
        if let Some(ref pb) = self.progress_bar {
            pb.finish_with_message(message.to_string());
        }
    }

    pub fn position(&self) -> u64 {
        self.progress_bar.as_ref().map(|pb| pb.position()).unwrap_or(0)
    }
}

impl Drop for StageProgress {
    fn drop(&mut self) {
        if let Some(ref pb) = self.progress_bar {
            if !pb.is_finished() {
                pb.abandon();
            }
        }
    }
}
