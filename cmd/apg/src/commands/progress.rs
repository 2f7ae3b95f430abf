//! Terminal progress bar for renders.

use apg_program::{Progress, Stage};
use indicatif::{ProgressBar, ProgressStyle};

/// Renders synthesis progress as an indicatif bar on stderr.
pub struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    pub fn new() -> anyhow::Result<Self> {
        let style = ProgressStyle::with_template(
            "{spinner:.green} {msg:<12} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len}",
        )?
        .progress_chars("#>-");
        let bar = ProgressBar::new(0);
        bar.set_style(style);
        Ok(Self { bar })
    }

    /// Removes the bar from the terminal.
    pub fn clear(&self) {
        self.bar.finish_and_clear();
    }
}

impl Progress for BarProgress {
    fn stage(&self, stage: Stage) {
        self.bar.set_message(stage.to_string());
        if stage == Stage::Done {
            self.bar.finish();
        }
    }

    fn start(&self, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_position(0);
    }

    fn advance(&self, _index: usize) {
        self.bar.inc(1);
    }
}
