//! Isotopic envelope matching over a single MS1 scan.

use crate::models::peak::first_peak_at_or_above;
use crate::models::{
    ChromatographProfile,
    IsotopicReference,
    Peak,
    ProfileScan,
};
use crate::scan_index::ScanRecord;
use crate::utils::{
    PpmWindow,
    pearson_correlation,
};

pub trait EnvelopeMatcher: Send + Sync {
    /// Looks for the isotopic envelope of `profile` in `record`.
    ///
    /// `record` must have its peaks loaded. The returned scan is never
    /// flagged as identified, the walker decides that.
    fn find(
        &self,
        record: &ScanRecord,
        profile: &ChromatographProfile,
        ppm_tolerance: f64,
        isotope_count: usize,
    ) -> Option<ProfileScan>;
}

/// Takes the most intense peak within a ppm window of every expected
/// isotope m/z.
#[derive(Debug, Clone, Copy, Default)]
pub struct PpmEnvelopeMatcher;

impl PpmEnvelopeMatcher {
    /// Most intense peak in `window`, scanning forward from `start`.
    /// Returns the intensity (if any) and the index to resume from.
    fn most_intense_in(peaks: &[Peak], start: usize, window: &PpmWindow) -> (Option<f64>, usize) {
        let first = start + first_peak_at_or_above(&peaks[start..], window.start());
        let mut best: Option<f64> = None;
        for peak in &peaks[first..] {
            if peak.mz > window.end() {
                break;
            }
            let intensity = peak.intensity as f64;
            if best.is_none_or(|b| intensity > b) {
                best = Some(intensity);
            }
        }
        (best, first)
    }
}

impl EnvelopeMatcher for PpmEnvelopeMatcher {
    fn find(
        &self,
        record: &ScanRecord,
        profile: &ChromatographProfile,
        ppm_tolerance: f64,
        isotope_count: usize,
    ) -> Option<ProfileScan> {
        let peaks = record.peaks();
        if peaks.is_empty() || isotope_count == 0 {
            return None;
        }

        let mut intensities = Vec::with_capacity(isotope_count);
        let mut cursor = 0;
        for (i, mz) in profile.isotope_mzs(isotope_count).into_iter().enumerate() {
            let window = PpmWindow::new(mz, ppm_tolerance);
            let (best, next) = Self::most_intense_in(peaks, cursor, &window);
            cursor = next;
            match best {
                Some(intensity) => intensities.push(intensity),
                None if i == 0 => return None,
                None => intensities.push(0.0),
            }
        }

        Some(ProfileScan {
            scan: record.scan,
            retention_time: record.retention_time,
            isotope_intensities: intensities,
            identified: false,
        })
    }
}

/// Whether the observed envelope looks enough like the reference.
///
/// Undefined correlations (flat envelopes) never pass.
pub fn passes_correlation(
    observed: &ProfileScan,
    reference: &IsotopicReference,
    minimum_correlation: f64,
) -> bool {
    let corr = pearson_correlation(&observed.isotope_intensities, reference.intensities());
    corr >= minimum_correlation
}
