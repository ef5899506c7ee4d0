pub mod discovery;
pub mod identifications;
pub mod in_memory;
#[cfg(feature = "mzdata")]
pub mod mzml;

pub use discovery::discover_raw_files;
pub use identifications::read_identifications;
pub use in_memory::{
    InMemoryOpener,
    InMemoryRawFile,
    InMemorySpectrum,
};

use std::path::Path;

use crate::errors::{
    RawReadingError,
    Result,
};
use crate::models::Peak;
use crate::traits::{
    RawFileOpener,
    RawReader,
};

/// Reader picked from the file extension.
pub enum AnyRawReader {
    InMemory(InMemoryRawFile),
    #[cfg(feature = "mzdata")]
    MzML(Box<mzml::MzMLRawReader>),
}

impl RawReader for AnyRawReader {
    fn first_spectrum_number(&self) -> u32 {
        match self {
            Self::InMemory(r) => r.first_spectrum_number(),
            #[cfg(feature = "mzdata")]
            Self::MzML(r) => r.first_spectrum_number(),
        }
    }

    fn last_spectrum_number(&self) -> u32 {
        match self {
            Self::InMemory(r) => r.last_spectrum_number(),
            #[cfg(feature = "mzdata")]
            Self::MzML(r) => r.last_spectrum_number(),
        }
    }

    fn ms_level(&mut self, scan: u32) -> Result<Option<u8>> {
        match self {
            Self::InMemory(r) => r.ms_level(scan),
            #[cfg(feature = "mzdata")]
            Self::MzML(r) => r.ms_level(scan),
        }
    }

    fn retention_time(&mut self, scan: u32) -> Result<f64> {
        match self {
            Self::InMemory(r) => r.retention_time(scan),
            #[cfg(feature = "mzdata")]
            Self::MzML(r) => r.retention_time(scan),
        }
    }

    fn peak_list(&mut self, scan: u32) -> Result<Vec<Peak>> {
        match self {
            Self::InMemory(r) => r.peak_list(scan),
            #[cfg(feature = "mzdata")]
            Self::MzML(r) => r.peak_list(scan),
        }
    }
}

/// Opens `.json` spectrum dumps in memory and `.mzML` files through mzdata.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultOpener;

impl RawFileOpener for DefaultOpener {
    type Reader = AnyRawReader;

    fn open(&self, path: &Path) -> Result<Self::Reader> {
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "json" => Ok(AnyRawReader::InMemory(InMemoryRawFile::from_json_file(
                path,
            )?)),
            #[cfg(feature = "mzdata")]
            "mzml" => Ok(AnyRawReader::MzML(Box::new(mzml::MzMLRawReader::open(
                path,
            )?))),
            _ => Err(RawReadingError::Open {
                path: path.to_path_buf(),
                source: format!("unsupported raw file extension '{}'", extension),
            }
            .into()),
        }
    }
}
