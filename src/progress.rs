use indicatif::{ProgressBar, ProgressStyle};

use crate::orchestrator::{CueOutcome, CueStatus, PassKind, PassSummary};
use crate::workflow::PassObserver;

/// Terminal progress bar for translation passes
pub struct ProgressReporter {
    bar: Option<ProgressBar>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self { bar: None }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl PassObserver for ProgressReporter {
    fn pass_started(&mut self, kind: PassKind, total: usize) {
        let pb = ProgressBar::new(total as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb.set_message(match kind {
            PassKind::Run => "translating",
            PassKind::RetryFailed => "retrying failed lines",
        });
        self.bar = Some(pb);
    }

    fn cue_finished(&mut self, outcome: &CueOutcome) {
        if let Some(pb) = &self.bar {
            if let CueStatus::Failed(reason) = &outcome.status {
                pb.println(format!("Line {} failed: {}", outcome.id, reason));
            }
            pb.inc(1);
        }
    }

    fn pass_finished(&mut self, summary: &PassSummary) {
        if let Some(pb) = self.bar.take() {
            pb.finish_with_message(format!(
                "{} translated, {} failed",
                summary.translated, summary.failed
            ));
        }
    }
}
