use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use once_cell::sync::Lazy;
use strata_fetch::{FetchPhase, Progress};

const PB_STYLE: &str = "{spinner:.blue} {prefix:>12.cyan.bold} [{elapsed_precise}] {wide_bar:.cyan/blue} {bytes}/{total_bytes} ({bytes_per_sec}, {eta}) {msg}";

const TICK: &str = "⠁⠂⠄⡀⢀⠠⠐⠈ ";

const PB_CHARS: &str = "█▓▒░  ";

static PB_TEMPLATE: Lazy<Option<ProgressStyle>> = Lazy::new(|| {
    let pb_style = match ProgressStyle::with_template(PB_STYLE) {
        Ok(pb_style) => pb_style.tick_chars(TICK).progress_chars(PB_CHARS),
        Err(_) => return None,
    };

    Some(pb_style)
});

/// A progress bar fed by the engine's progress events.
///
/// Cloning shares the bar, so one clone can live in the progress callback
/// while another finishes the bar from the caller.
#[derive(Clone)]
pub struct ProgressTracker {
    pb: ProgressBar,
}

impl ProgressTracker {
    pub fn update(&self, progress: &Progress) {
        if let Some(total) = progress.total_bytes {
            if self.pb.length() != Some(total) {
                self.pb.set_length(total);
            }
        }
        self.pb.set_position(progress.bytes_on_disk);

        match progress.phase {
            FetchPhase::Probing => self.pb.set_message("probing"),
            FetchPhase::Downloading => self.pb.set_message(""),
            FetchPhase::Assembling => self.pb.set_message("assembling"),
            FetchPhase::Completed => self.pb.finish_with_message("done"),
            FetchPhase::Skipped => self.pb.finish_with_message("already downloaded"),
        }
    }

    /// Stop drawing, leaving the bar where it is.
    pub fn abandon(&self) {
        if !self.pb.is_finished() {
            self.pb.abandon();
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProgressTrackerBuilder {
    prefix: Option<String>,
    hidden: bool,
}

impl ProgressTrackerBuilder {
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = Some(prefix.to_string());
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    pub fn build(self) -> ProgressTracker {
        let pb = ProgressBar::new(0);
        let pb = if let Some(style) = PB_TEMPLATE.as_ref() {
            pb.with_style(style.clone())
        } else {
            pb
        };
        if self.hidden {
            pb.set_draw_target(ProgressDrawTarget::hidden());
        }
        if let Some(prefix) = self.prefix {
            pb.set_prefix(prefix);
        }
        ProgressTracker { pb }
    }
}
