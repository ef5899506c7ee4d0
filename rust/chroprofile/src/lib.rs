#![doc = include_str!("../README.md")]

pub mod data_sources;
pub mod dedup;
pub mod errors;
pub mod matching;
pub mod models;
pub mod scan_index;
pub mod scheduler;
pub mod traits;
pub mod utils;
pub mod walker;
pub mod writer;

pub use data_sources::{
    DefaultOpener,
    read_identifications,
};
pub use dedup::{
    ApexDeduplicator,
    GroupProfiles,
};
pub use errors::{
    ChroProfileError,
    Result,
};
pub use matching::{
    EnvelopeMatcher,
    PpmEnvelopeMatcher,
};
pub use models::{
    ChromatographProfile,
    ExtractionSettings,
    IdentifiedPeptide,
    ManifestRow,
    ProfileScan,
};
pub use scan_index::{
    ScanIndex,
    ScanRecord,
};
pub use scheduler::{
    ExtractionJob,
    FileScheduler,
    plan_jobs,
    run_extraction,
};
pub use traits::{
    CancellationFlag,
    ProgressReporter,
    RawFileOpener,
    RawReader,
};
pub use walker::ProfileWalker;
pub use writer::ProfileWriter;
