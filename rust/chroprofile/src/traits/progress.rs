use std::sync::Arc;
use std::sync::atomic::{
    AtomicBool,
    Ordering,
};
use tracing::{
    debug,
    info,
};

use crate::errors::{
    ChroProfileError,
    Result,
};

/// Progress sink and cancellation source for an extraction run.
///
/// Called from every worker thread. Cancellation is polled: before a file is
/// started and at every scan step of a profile walk.
pub trait ProgressReporter: Send + Sync {
    fn set_message(&self, _msg: &str) {}

    fn file_started(&self, _file: &str) {}

    fn file_finished(&self, _file: &str) {}

    fn is_cancellation_pending(&self) -> bool;

    fn check_cancelled(&self) -> Result<()> {
        if self.is_cancellation_pending() {
            Err(ChroProfileError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Shared flag that cancels a run once set, progress goes to the log.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag {
    cancelled: Arc<AtomicBool>,
}

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }
}

impl ProgressReporter for CancellationFlag {
    fn set_message(&self, msg: &str) {
        debug!("{}", msg);
    }

    fn file_started(&self, file: &str) {
        info!("Processing {}", file);
    }

    fn file_finished(&self, file: &str) {
        info!("Finished {}", file);
    }

    fn is_cancellation_pending(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}
