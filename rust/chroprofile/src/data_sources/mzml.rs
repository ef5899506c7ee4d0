//! [`RawReader`] over mzML files, backed by `mzdata`.
//!
//! Spectrum numbers are taken from the `scan=N` part of the native id when
//! there is one (Thermo conversions), otherwise they are `index + 1`.

use mzdata::io::{
    DetailLevel,
    MzMLReader,
};
use mzdata::prelude::*;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;
use tracing::debug;

use crate::errors::{
    RawReadingError,
    Result,
};
use crate::models::Peak;
use crate::traits::RawReader;

static NATIVE_SCAN_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"scan=(\d+)").expect("scan number pattern is valid"));

#[derive(Debug, Clone, Copy)]
struct SpectrumHeader {
    index: usize,
    ms_level: u8,
    retention_time: f64,
}

pub struct MzMLRawReader {
    reader: MzMLReader<File>,
    headers: BTreeMap<u32, SpectrumHeader>,
}

fn scan_number_from_id(id: &str, index: usize) -> u32 {
    NATIVE_SCAN_NUMBER
        .captures(id)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(index as u32 + 1)
}

impl MzMLRawReader {
    pub fn open(path: &Path) -> Result<Self> {
        let mut reader = MzMLReader::open_path(path).map_err(|e| RawReadingError::Open {
            path: path.to_path_buf(),
            source: e.to_string(),
        })?;

        // Headers only, the binary arrays are decoded on demand.
        reader.set_detail_level(DetailLevel::MetadataOnly);
        let mut headers = BTreeMap::new();
        for index in 0..reader.len() {
            let Some(spectrum) = reader.get_spectrum_by_index(index) else {
                continue;
            };
            headers.insert(
                scan_number_from_id(spectrum.id(), index),
                SpectrumHeader {
                    index,
                    ms_level: spectrum.ms_level(),
                    retention_time: spectrum.start_time(),
                },
            );
        }
        reader.set_detail_level(DetailLevel::Full);
        debug!("Read {} spectrum headers from {}", headers.len(), path.display());

        Ok(Self { reader, headers })
    }

    fn header(&self, scan: u32) -> Result<SpectrumHeader> {
        self.headers
            .get(&scan)
            .copied()
            .ok_or_else(|| RawReadingError::SpectrumNotFound { scan }.into())
    }
}

impl RawReader for MzMLRawReader {
    fn first_spectrum_number(&self) -> u32 {
        self.headers.keys().next().copied().unwrap_or(0)
    }

    fn last_spectrum_number(&self) -> u32 {
        self.headers.keys().next_back().copied().unwrap_or(0)
    }

    fn ms_level(&mut self, scan: u32) -> Result<Option<u8>> {
        Ok(self.headers.get(&scan).map(|h| h.ms_level))
    }

    fn retention_time(&mut self, scan: u32) -> Result<f64> {
        Ok(self.header(scan)?.retention_time)
    }

    fn peak_list(&mut self, scan: u32) -> Result<Vec<Peak>> {
        let header = self.header(scan)?;
        let spectrum = self
            .reader
            .get_spectrum_by_index(header.index)
            .ok_or(RawReadingError::SpectrumNotFound { scan })?;
        let Some(arrays) = spectrum.raw_arrays() else {
            return Ok(Vec::new());
        };
        let mzs = arrays
            .mzs()
            .map_err(|e| RawReadingError::Other(format!("scan {}: {}", scan, e)))?;
        let intensities = arrays
            .intensities()
            .map_err(|e| RawReadingError::Other(format!("scan {}: {}", scan, e)))?;

        let mut peaks: Vec<Peak> = mzs
            .iter()
            .zip(intensities.iter())
            .filter(|(_, inten)| **inten > 0.0)
            .map(|(&mz, &intensity)| Peak { mz, intensity })
            .collect();
        peaks.sort_by(|a, b| a.mz.total_cmp(&b.mz));
        Ok(peaks)
    }
}
