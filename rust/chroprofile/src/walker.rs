//! Scan-by-scan extension of a profile around its master scan.

use tracing::trace;

use crate::errors::Result;
use crate::matching::{
    EnvelopeMatcher,
    passes_correlation,
};
use crate::models::{
    ChromatographProfile,
    ExtractionSettings,
    ProfileScan,
};
use crate::scan_index::ScanIndex;
use crate::traits::{
    ProgressReporter,
    RawReader,
};

/// Slack on the retention time window comparison, so a scan sitting exactly
/// on the window edge is not lost to rounding of the retention times.
const RETENTION_TIME_EPSILON: f64 = 1e-9;

/// Index of the master scan of `profile`.
///
/// Profiles with a retention time use the first MS1 scan at or after it,
/// profiles without one use the MS1 scan preceding the identified scan.
pub fn master_index_for<R: RawReader>(
    index: &ScanIndex<R>,
    profile: &ChromatographProfile,
) -> Option<usize> {
    if profile.has_retention_time() {
        index.master_scan_index_for(profile.identified_retention_time)
    } else {
        index.master_scan_index_for_scan(profile.identified_scan)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Backward,
    Forward,
}

pub struct ProfileWalker<'a, M: EnvelopeMatcher + ?Sized> {
    matcher: &'a M,
    settings: &'a ExtractionSettings,
}

impl<'a, M: EnvelopeMatcher + ?Sized> ProfileWalker<'a, M> {
    pub fn new(matcher: &'a M, settings: &'a ExtractionSettings) -> Self {
        Self { matcher, settings }
    }

    /// Fills `profile.profiles` starting from the scan at `master_index`.
    ///
    /// Leaves the profile empty when the master scan itself does not match or
    /// `master_index` is outside the index. A cancellation request aborts the walk with `Cancelled` and the
    /// profile is left untouched.
    pub fn walk<R: RawReader>(
        &self,
        index: &mut ScanIndex<R>,
        profile: &mut ChromatographProfile,
        master_index: usize,
        progress: &dyn ProgressReporter,
    ) -> Result<()> {
        progress.check_cancelled()?;
        if master_index >= index.len() {
            profile.profiles.clear();
            return Ok(());
        }
        let Some(mut master) = self.match_at(index, profile, master_index)? else {
            trace!(
                "No envelope of {} at master scan {}",
                profile.peptide_id,
                index.record(master_index).scan
            );
            profile.profiles.clear();
            return Ok(());
        };
        master.identified = true;
        let master_rt = master.retention_time;

        let mut backward =
            self.extend(index, profile, master_index, master_rt, Direction::Backward, progress)?;
        let forward =
            self.extend(index, profile, master_index, master_rt, Direction::Forward, progress)?;

        backward.reverse();
        backward.push(master);
        backward.extend(forward);
        profile.profiles = backward;
        Ok(())
    }

    fn extend<R: RawReader>(
        &self,
        index: &mut ScanIndex<R>,
        profile: &ChromatographProfile,
        master_index: usize,
        master_rt: f64,
        direction: Direction,
        progress: &dyn ProgressReporter,
    ) -> Result<Vec<ProfileScan>> {
        let mut out = Vec::new();
        let mut current = master_index;
        loop {
            current = match direction {
                Direction::Backward if current == 0 => break,
                Direction::Backward => current - 1,
                Direction::Forward if current + 1 >= index.len() => break,
                Direction::Forward => current + 1,
            };
            progress.check_cancelled()?;

            let gap = (index.record(current).retention_time - master_rt).abs();
            if gap > self.settings.retention_time_window + RETENTION_TIME_EPSILON {
                break;
            }
            match self.match_at(index, profile, current)? {
                Some(scan) => out.push(scan),
                None => break,
            }
        }
        Ok(out)
    }

    fn match_at<R: RawReader>(
        &self,
        index: &mut ScanIndex<R>,
        profile: &ChromatographProfile,
        scan_index: usize,
    ) -> Result<Option<ProfileScan>> {
        let record = index.load(scan_index)?;
        let found = self.matcher.find(
            record,
            profile,
            self.settings.mz_tolerance_ppm,
            self.settings.profile_length,
        );
        Ok(found.filter(|scan| {
            passes_correlation(
                scan,
                &profile.isotopic_reference,
                self.settings.minimum_correlation,
            )
        }))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::data_sources::{
        InMemoryRawFile,
        InMemorySpectrum,
    };
    use crate::errors::ChroProfileError;
    use crate::matching::PpmEnvelopeMatcher;
    use crate::models::Peak;
    use crate::models::identification::sample_identification;
    use crate::traits::CancellationFlag;

    /// Peaks of an ideal envelope of `profile`, scaled by `scale`.
    pub(crate) fn envelope_peaks(profile: &ChromatographProfile, scale: f32) -> Vec<Peak> {
        let reference = profile.isotopic_reference.intensities();
        profile
            .isotope_mzs(reference.len())
            .into_iter()
            .zip(reference.iter())
            .map(|(mz, rel)| Peak::new(mz, *rel as f32 * scale))
            .collect()
    }

    /// MS1 scans every 0.05 minutes (scan `k` at `k / 20` minutes), each with
    /// the full envelope of `profile` when `has_envelope(k)` holds.
    pub(crate) fn synthetic_run(
        profile: &ChromatographProfile,
        num_scans: u32,
        has_envelope: impl Fn(u32) -> bool,
    ) -> InMemoryRawFile {
        let spectra = (0..num_scans)
            .map(|k| InMemorySpectrum {
                scan: k + 1,
                ms_level: 1,
                retention_time: k as f64 / 20.0,
                peaks: if has_envelope(k) {
                    envelope_peaks(profile, 1000.0)
                } else {
                    vec![Peak::new(150.0, 10.0)]
                },
            })
            .collect();
        InMemoryRawFile::new(spectra)
    }

    fn profile_at(retention_time: f64) -> ChromatographProfile {
        ChromatographProfile::from_identification(
            &sample_identification(retention_time, 0),
            &ExtractionSettings::default(),
        )
    }

    fn settings(window: f64) -> ExtractionSettings {
        ExtractionSettings {
            retention_time_window: window,
            ..Default::default()
        }
    }

    fn walk(
        profile: &mut ChromatographProfile,
        file: InMemoryRawFile,
        settings: &ExtractionSettings,
        progress: &dyn ProgressReporter,
    ) -> Result<()> {
        let mut index = ScanIndex::build(file).unwrap();
        let master = master_index_for(&index, profile).unwrap();
        ProfileWalker::new(&PpmEnvelopeMatcher, settings).walk(&mut index, profile, master, progress)
    }

    #[test]
    fn test_window_bounds_the_walk() {
        let mut profile = profile_at(10.0);
        let file = synthetic_run(&profile, 401, |_| true);
        walk(&mut profile, file, &settings(0.5), &CancellationFlag::new()).unwrap();

        assert_eq!(profile.scan_count(), 21);
        let identified: Vec<u32> = profile
            .profiles
            .iter()
            .filter(|p| p.identified)
            .map(|p| p.scan)
            .collect();
        // scan k + 1 sits at k / 20 minutes
        assert_eq!(identified, vec![201]);
        assert_eq!(profile.profiles.first().unwrap().scan, 191);
        assert_eq!(profile.profiles.last().unwrap().scan, 211);
        assert!(profile.profiles.windows(2).all(|w| w[0].scan < w[1].scan));
    }

    #[test]
    fn test_identification_after_last_scan() {
        let mut profile = profile_at(50.0);
        let file = synthetic_run(&profile, 401, |_| true);
        walk(&mut profile, file, &settings(0.5), &CancellationFlag::new()).unwrap();

        assert_eq!(profile.master_scan(), Some(401));
        assert_eq!(profile.profiles.last().unwrap().scan, 401);
        assert_eq!(profile.scan_count(), 11);
    }

    #[test]
    fn test_walk_stops_at_first_miss() {
        let mut profile = profile_at(10.0);
        // envelope between 9.8 and 10.1 minutes only
        let file = synthetic_run(&profile, 401, |k| (196..=202).contains(&k));
        walk(&mut profile, file, &settings(2.0), &CancellationFlag::new()).unwrap();

        let scans: Vec<u32> = profile.profiles.iter().map(|p| p.scan).collect();
        assert_eq!(scans, (197..=203).collect::<Vec<u32>>());
    }

    #[test]
    fn test_unmatched_master_gives_empty_profile() {
        let mut profile = profile_at(10.0);
        let file = synthetic_run(&profile, 401, |k| k != 200);
        walk(&mut profile, file, &settings(2.0), &CancellationFlag::new()).unwrap();
        assert!(profile.profiles.is_empty());
        assert_eq!(profile.master_scan(), None);
    }

    #[test]
    fn test_master_outside_the_index_gives_empty_profile() {
        let mut profile = profile_at(10.0);
        let mut index = ScanIndex::build(synthetic_run(&profile, 20, |_| true)).unwrap();
        ProfileWalker::new(&PpmEnvelopeMatcher, &settings(0.5))
            .walk(&mut index, &mut profile, 20, &CancellationFlag::new())
            .unwrap();
        assert!(profile.profiles.is_empty());
    }

    #[test]
    fn test_poorly_correlated_scan_ends_the_walk() {
        let mut profile = profile_at(10.0);
        let mut spectra: Vec<InMemorySpectrum> = (0..401)
            .map(|k| InMemorySpectrum {
                scan: k + 1,
                ms_level: 1,
                retention_time: k as f64 / 20.0,
                peaks: envelope_peaks(&profile, 1000.0),
            })
            .collect();
        // inverted envelope two scans after the master
        for peak in spectra[202].peaks.iter_mut() {
            peak.intensity = 1000.0 - peak.intensity + 1.0;
        }
        let file = InMemoryRawFile::new(spectra);
        walk(&mut profile, file, &settings(0.5), &CancellationFlag::new()).unwrap();

        assert_eq!(profile.profiles.last().unwrap().scan, 202);
        assert_eq!(profile.profiles.first().unwrap().scan, 191);
    }

    #[test]
    fn test_cancellation_aborts_the_walk() {
        let mut profile = profile_at(10.0);
        let file = synthetic_run(&profile, 401, |_| true);
        let flag = CancellationFlag::new();
        flag.cancel();
        let err = walk(&mut profile, file, &settings(0.5), &flag).unwrap_err();
        assert!(matches!(err, ChroProfileError::Cancelled));
        assert!(profile.profiles.is_empty());
    }
}
