//! MS1 scan index of a single raw file.
//!
//! Only scan numbers and retention times are read up front, peak lists are
//! decoded the first time a profile walk needs them and then kept for the
//! lifetime of the index (profiles of the same file overlap a lot).

use tracing::{
    debug,
    warn,
};

use crate::errors::Result;
use crate::models::Peak;
use crate::traits::RawReader;

#[derive(Debug, Clone, PartialEq)]
pub struct ScanRecord {
    pub scan: u32,
    pub retention_time: f64,
    peaks: Option<Vec<Peak>>,
}

impl ScanRecord {
    pub fn new(scan: u32, retention_time: f64) -> Self {
        Self {
            scan,
            retention_time,
            peaks: None,
        }
    }

    /// Record with its peaks already in memory. Peaks must be sorted by m/z.
    pub fn with_peaks(scan: u32, retention_time: f64, peaks: Vec<Peak>) -> Self {
        Self {
            scan,
            retention_time,
            peaks: Some(peaks),
        }
    }

    /// Cached peaks, empty until loaded through [`ScanIndex::load`].
    pub fn peaks(&self) -> &[Peak] {
        self.peaks.as_deref().unwrap_or(&[])
    }

    pub fn is_loaded(&self) -> bool {
        self.peaks.is_some()
    }
}

pub struct ScanIndex<R: RawReader> {
    reader: R,
    records: Vec<ScanRecord>,
}

impl<R: RawReader> std::fmt::Debug for ScanIndex<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanIndex")
            .field("num_ms1_scans", &self.records.len())
            .field("first", &self.records.first().map(|r| r.scan))
            .field("last", &self.records.last().map(|r| r.scan))
            .finish()
    }
}

impl<R: RawReader> ScanIndex<R> {
    /// Enumerates the MS1 scans of `reader`, in ascending scan order.
    pub fn build(mut reader: R) -> Result<Self> {
        let first = reader.first_spectrum_number();
        let last = reader.last_spectrum_number();
        let mut records: Vec<ScanRecord> = Vec::new();

        for scan in first..=last {
            if reader.ms_level(scan)? != Some(1) {
                continue;
            }
            let retention_time = reader.retention_time(scan)?;
            if let Some(prev) = records.last() {
                if retention_time < prev.retention_time {
                    warn!(
                        "Retention time goes backwards at scan {} ({} < {})",
                        scan, retention_time, prev.retention_time
                    );
                }
            }
            records.push(ScanRecord::new(scan, retention_time));
        }
        debug!("Indexed {} MS1 scans ({}..={})", records.len(), first, last);

        Ok(Self { reader, records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[ScanRecord] {
        &self.records
    }

    pub(crate) fn record(&self, index: usize) -> &ScanRecord {
        &self.records[index]
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    /// Makes sure the peaks of the scan at `index` are cached.
    pub(crate) fn load(&mut self, index: usize) -> Result<&ScanRecord> {
        if !self.records[index].is_loaded() {
            let peaks = self.reader.peak_list(self.records[index].scan)?;
            self.records[index].peaks = Some(peaks);
        }
        Ok(&self.records[index])
    }

    pub(crate) fn peaks_at(&mut self, index: usize) -> Result<&[Peak]> {
        Ok(self.load(index)?.peaks())
    }

    /// Retention time of an MS1 scan, `None` if `scan` is not an MS1 scan.
    pub fn retention_time_at(&self, scan: u32) -> Option<f64> {
        self.records
            .binary_search_by_key(&scan, |r| r.scan)
            .ok()
            .map(|i| self.records[i].retention_time)
    }

    /// Index of the first MS1 scan at or after `retention_time`.
    ///
    /// Scans sharing a retention time resolve to the lowest scan number.
    /// Times past the last scan resolve to the last scan.
    pub fn master_scan_index_for(&self, retention_time: f64) -> Option<usize> {
        if self.records.is_empty() {
            return None;
        }
        let pos = self
            .records
            .partition_point(|r| r.retention_time < retention_time);
        Some(pos.min(self.records.len() - 1))
    }

    /// Index of the last MS1 scan at or before `scan`, the survey scan that
    /// precedes an MS/MS event. Scans before the first MS1 resolve to it.
    pub fn master_scan_index_for_scan(&self, scan: u32) -> Option<usize> {
        if self.records.is_empty() {
            return None;
        }
        let pos = self.records.partition_point(|r| r.scan <= scan);
        Some(pos.saturating_sub(1))
    }
}
