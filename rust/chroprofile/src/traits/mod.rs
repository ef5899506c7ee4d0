pub mod progress;
pub mod raw_reader;

pub use progress::{
    CancellationFlag,
    ProgressReporter,
};
pub use raw_reader::{
    RawFileOpener,
    RawReader,
};
