use serde::{
    Deserialize,
    Serialize,
};
use std::collections::{
    BTreeMap,
    HashMap,
};
use std::path::{
    Path,
    PathBuf,
};

use crate::errors::{
    ChroProfileError,
    RawReadingError,
    Result,
};
use crate::models::Peak;
use crate::traits::{
    RawFileOpener,
    RawReader,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InMemorySpectrum {
    pub scan: u32,
    pub ms_level: u8,
    pub retention_time: f64,
    #[serde(default)]
    pub peaks: Vec<Peak>,
}

/// A raw file held entirely in memory.
///
/// Mostly useful for tests and for small synthetic runs stored as json
/// (a list of [`InMemorySpectrum`]).
#[derive(Debug, Clone, Default)]
pub struct InMemoryRawFile {
    spectra: BTreeMap<u32, InMemorySpectrum>,
    peak_reads: usize,
}

impl InMemoryRawFile {
    pub fn new(spectra: Vec<InMemorySpectrum>) -> Self {
        let spectra = spectra
            .into_iter()
            .map(|mut s| {
                s.peaks.sort_by(|a, b| a.mz.total_cmp(&b.mz));
                (s.scan, s)
            })
            .collect();
        Self {
            spectra,
            peak_reads: 0,
        }
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|e| ChroProfileError::io(e, path))?;
        let spectra: Vec<InMemorySpectrum> =
            serde_json::from_reader(std::io::BufReader::new(file))?;
        Ok(Self::new(spectra))
    }

    /// Number of peak lists handed out so far.
    pub fn peak_reads(&self) -> usize {
        self.peak_reads
    }

    fn get(&self, scan: u32) -> Result<&InMemorySpectrum> {
        self.spectra
            .get(&scan)
            .ok_or_else(|| RawReadingError::SpectrumNotFound { scan }.into())
    }
}

impl RawReader for InMemoryRawFile {
    fn first_spectrum_number(&self) -> u32 {
        self.spectra.keys().next().copied().unwrap_or(0)
    }

    fn last_spectrum_number(&self) -> u32 {
        self.spectra.keys().next_back().copied().unwrap_or(0)
    }

    fn ms_level(&mut self, scan: u32) -> Result<Option<u8>> {
        Ok(self.spectra.get(&scan).map(|s| s.ms_level))
    }

    fn retention_time(&mut self, scan: u32) -> Result<f64> {
        Ok(self.get(scan)?.retention_time)
    }

    fn peak_list(&mut self, scan: u32) -> Result<Vec<Peak>> {
        let peaks = self.get(scan)?.peaks.clone();
        self.peak_reads += 1;
        Ok(peaks)
    }
}

/// Hands out copies of pre-registered in-memory raw files by path.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOpener {
    files: HashMap<PathBuf, InMemoryRawFile>,
}

impl InMemoryOpener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>, file: InMemoryRawFile) -> Self {
        self.files.insert(path.into(), file);
        self
    }
}

impl RawFileOpener for InMemoryOpener {
    type Reader = InMemoryRawFile;

    fn open(&self, path: &Path) -> Result<Self::Reader> {
        self.files.get(path).cloned().ok_or_else(|| {
            RawReadingError::Open {
                path: path.to_path_buf(),
                source: "file was not registered".to_string(),
            }
            .into()
        })
    }
}
