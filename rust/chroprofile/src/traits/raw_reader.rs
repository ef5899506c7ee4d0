use std::path::Path;

use crate::errors::Result;
use crate::models::Peak;

/// Read access to the spectra of one acquisition file.
///
/// Implementations own their file handle; the scheduler never shares a
/// reader between threads.
pub trait RawReader {
    fn first_spectrum_number(&self) -> u32;
    fn last_spectrum_number(&self) -> u32;

    /// MS level of a spectrum, `None` if there is no spectrum with that number.
    fn ms_level(&mut self, scan: u32) -> Result<Option<u8>>;

    /// Retention time in minutes.
    fn retention_time(&mut self, scan: u32) -> Result<f64>;

    /// Centroided peaks, sorted by ascending m/z.
    fn peak_list(&mut self, scan: u32) -> Result<Vec<Peak>>;
}

/// Opens raw files for the scheduler, one reader per worker.
pub trait RawFileOpener: Send + Sync {
    type Reader: RawReader;

    fn open(&self, path: &Path) -> Result<Self::Reader>;
}
