//! Apex collision handling within a peptide-identity group.
//!
//! Several identifications of the same peptide (other charge states, or
//! repeated MS/MS events) often point at the same elution peak. Only the
//! first of them is walked, the others are folded into its profile.

use tracing::debug;

use crate::errors::Result;
use crate::matching::EnvelopeMatcher;
use crate::models::{
    ChromatographProfile,
    ExtractionSettings,
    IdentifiedPeptide,
};
use crate::scan_index::ScanIndex;
use crate::traits::{
    ProgressReporter,
    RawReader,
};
use crate::walker::{
    ProfileWalker,
    master_index_for,
};

/// Profiles kept for one peptide-identity group.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupProfiles {
    pub main: Option<ChromatographProfile>,
    pub subs: Vec<ChromatographProfile>,
}

impl GroupProfiles {
    pub fn is_empty(&self) -> bool {
        self.main.is_none()
    }

    pub fn len(&self) -> usize {
        self.main.iter().count() + self.subs.len()
    }
}

pub struct ApexDeduplicator<'a, M: EnvelopeMatcher + ?Sized> {
    walker: ProfileWalker<'a, M>,
    settings: &'a ExtractionSettings,
}

impl<'a, M: EnvelopeMatcher + ?Sized> ApexDeduplicator<'a, M> {
    pub fn new(matcher: &'a M, settings: &'a ExtractionSettings) -> Self {
        Self {
            walker: ProfileWalker::new(matcher, settings),
            settings,
        }
    }

    /// Extracts the profiles of one peptide-identity group.
    ///
    /// All `identifications` must share the same peptide id and raw file.
    pub fn process_group<R: RawReader>(
        &self,
        index: &mut ScanIndex<R>,
        identifications: &[&IdentifiedPeptide],
        progress: &dyn ProgressReporter,
    ) -> Result<GroupProfiles> {
        let mut candidates: Vec<(ChromatographProfile, usize)> = Vec::new();
        for ident in identifications {
            let mut profile = ChromatographProfile::from_identification(ident, self.settings);
            let Some(master_index) = master_index_for(index, &profile) else {
                continue;
            };
            if profile.identified_scan == 0 {
                profile.identified_scan = index.record(master_index).scan;
            }
            candidates.push((profile, master_index));
        }
        candidates.sort_by(|(a, _), (b, _)| {
            a.identified_retention_time
                .total_cmp(&b.identified_retention_time)
                .then(a.identified_scan.cmp(&b.identified_scan))
        });

        let mut walked: Vec<ChromatographProfile> = Vec::with_capacity(candidates.len());
        for (mut profile, master_index) in candidates {
            let master_scan = index.record(master_index).scan;
            if let Some(absorbing) = walked.iter_mut().find(|p| p.contains_scan(master_scan)) {
                debug!(
                    "{} at scan {} shares the elution peak of scan {}",
                    profile.peptide_id, profile.identified_scan, absorbing.identified_scan
                );
                absorbing.merged_identifications.push(profile.identified_scan);
                continue;
            }
            self.walker.walk(index, &mut profile, master_index, progress)?;
            walked.push(profile);
        }

        walked.retain(|p| p.scan_count() >= self.settings.minimum_scan_count);
        walked.sort_by(|a, b| {
            b.scan_count()
                .cmp(&a.scan_count())
                .then(a.master_scan().cmp(&b.master_scan()))
        });

        let mut walked = walked.into_iter();
        Ok(GroupProfiles {
            main: walked.next(),
            subs: walked.collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_sources::InMemoryRawFile;
    use crate::matching::PpmEnvelopeMatcher;
    use crate::models::identification::sample_identification;
    use crate::traits::CancellationFlag;
    use crate::walker::tests::synthetic_run;

    fn reference_profile() -> ChromatographProfile {
        ChromatographProfile::from_identification(
            &sample_identification(10.0, 0),
            &ExtractionSettings::default(),
        )
    }

    fn run(
        file: InMemoryRawFile,
        identifications: &[IdentifiedPeptide],
        settings: &ExtractionSettings,
    ) -> GroupProfiles {
        let mut index = ScanIndex::build(file).unwrap();
        let refs: Vec<&IdentifiedPeptide> = identifications.iter().collect();
        ApexDeduplicator::new(&PpmEnvelopeMatcher, settings)
            .process_group(&mut index, &refs, &CancellationFlag::new())
            .unwrap()
    }

    #[test]
    fn test_identifications_on_the_same_peak_are_merged() {
        let settings = ExtractionSettings {
            retention_time_window: 0.5,
            minimum_scan_count: 3,
            ..Default::default()
        };
        let file = synthetic_run(&reference_profile(), 401, |_| true);
        // master scans 201 and 203
        let idents = vec![
            sample_identification(10.1, 205),
            sample_identification(10.0, 202),
        ];
        let result = run(file, &idents, &settings);

        let main = result.main.unwrap();
        assert!(result.subs.is_empty());
        assert_eq!(main.identified_scan, 202);
        assert_eq!(main.master_scan(), Some(201));
        assert_eq!(main.merged_identifications, vec![205]);
        assert_eq!(main.profiles.iter().filter(|p| p.identified).count(), 1);
    }

    #[test]
    fn test_short_profiles_are_dropped() {
        let settings = ExtractionSettings {
            retention_time_window: 2.0,
            minimum_scan_count: 3,
            ..Default::default()
        };
        // two scans of envelope only
        let file = synthetic_run(&reference_profile(), 401, |k| k == 200 || k == 201);
        let result = run(file, &[sample_identification(10.0, 202)], &settings);
        assert!(result.is_empty());
        assert_eq!(result.len(), 0);
    }

    #[test]
    fn test_separate_peaks_give_main_and_sub() {
        let settings = ExtractionSettings {
            retention_time_window: 2.0,
            minimum_scan_count: 3,
            ..Default::default()
        };
        // a wide peak around 10 min and a narrower one around 15 min
        let file = synthetic_run(&reference_profile(), 401, |k| {
            (190..=210).contains(&k) || (298..=302).contains(&k)
        });
        let idents = vec![
            sample_identification(15.0, 301),
            sample_identification(10.0, 202),
        ];
        let result = run(file, &idents, &settings);

        let main = result.main.unwrap();
        assert_eq!(main.scan_count(), 21);
        assert_eq!(main.identified_scan, 202);
        assert_eq!(result.subs.len(), 1);
        assert_eq!(result.subs[0].scan_count(), 5);
        assert_eq!(result.subs[0].master_scan(), Some(301));
    }

    #[test]
    fn test_missing_scan_number_is_back_filled() {
        let settings = ExtractionSettings {
            retention_time_window: 0.5,
            minimum_scan_count: 1,
            ..Default::default()
        };
        let file = synthetic_run(&reference_profile(), 401, |_| true);
        let result = run(file, &[sample_identification(10.0, 0)], &settings);
        assert_eq!(result.main.unwrap().identified_scan, 201);
    }
}
