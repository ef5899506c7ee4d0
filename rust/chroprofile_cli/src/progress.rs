use chroprofile::ProgressReporter;
use indicatif::{
    ProgressBar,
    ProgressStyle,
};
use tracing::debug;

const BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} raw files ({eta}) {msg}";

/// One tick per finished raw file.
///
/// The command line run is never cancelled cooperatively, an interrupt ends
/// the process.
pub struct BarReporter {
    bar: ProgressBar,
}

impl BarReporter {
    pub fn new(num_files: u64) -> Self {
        let style =
            ProgressStyle::with_template(BAR_TEMPLATE).unwrap_or_else(|_| ProgressStyle::default_bar());
        Self {
            bar: ProgressBar::new(num_files).with_style(style),
        }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressReporter for BarReporter {
    fn set_message(&self, msg: &str) {
        debug!("{}", msg);
        self.bar.set_message(msg.to_string());
    }

    fn file_started(&self, file: &str) {
        self.bar.set_message(file.to_string());
    }

    fn file_finished(&self, _file: &str) {
        self.bar.inc(1);
    }

    fn is_cancellation_pending(&self) -> bool {
        false
    }
}
