use serde::{
    Deserialize,
    Serialize,
};

use super::identification::IdentifiedPeptide;
use super::isotopes::{
    C13_SPACING,
    IsotopicReference,
};
use super::settings::ExtractionSettings;

/// Isotopic envelope observed in a single MS1 scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileScan {
    pub scan: u32,
    pub retention_time: f64,
    pub isotope_intensities: Vec<f64>,
    pub identified: bool,
}

/// Extracted ion chromatogram of one peptide identification.
///
/// Scans are kept in ascending scan order once the profile is finished,
/// and the master scan (the MS1 scan matching the identification) is the
/// only entry flagged as `identified`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChromatographProfile {
    pub experiment: String,
    pub sequence: String,
    pub peptide_id: String,
    pub charge: u8,
    pub theoretical_mz: f64,
    pub observed_mz: f64,
    pub identified_scan: u32,
    pub identified_retention_time: f64,
    pub isotopic_reference: IsotopicReference,
    pub profiles: Vec<ProfileScan>,
    /// Identified scans of other identifications that landed on this
    /// elution peak and were folded into it.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub merged_identifications: Vec<u32>,
}

impl ChromatographProfile {
    pub fn from_identification(ident: &IdentifiedPeptide, settings: &ExtractionSettings) -> Self {
        let isotopic_reference = IsotopicReference::averagine(
            ident.theoretical_mz,
            ident.charge,
            settings.profile_length,
            settings.minimum_isotopic_percentage,
        );
        Self {
            experiment: ident.experiment.clone(),
            sequence: ident.pure_sequence(),
            peptide_id: ident.peptide_id(),
            charge: ident.charge,
            theoretical_mz: ident.theoretical_mz,
            observed_mz: ident.observed_mz,
            identified_scan: ident.first_scan,
            identified_retention_time: ident.retention_time,
            isotopic_reference,
            profiles: Vec::new(),
            merged_identifications: Vec::new(),
        }
    }

    /// Expected m/z of the first `count` isotopes.
    pub fn isotope_mzs(&self, count: usize) -> Vec<f64> {
        let charge = self.charge.max(1) as f64;
        (0..count)
            .map(|i| self.theoretical_mz + (i as f64) * C13_SPACING / charge)
            .collect()
    }

    /// Whether the master scan is located by retention time rather than by
    /// the identified scan.
    pub fn has_retention_time(&self) -> bool {
        self.identified_retention_time > 0.0
    }

    pub fn scan_count(&self) -> usize {
        self.profiles.len()
    }

    pub fn master_scan(&self) -> Option<u32> {
        self.profiles.iter().find(|p| p.identified).map(|p| p.scan)
    }

    pub fn contains_scan(&self, scan: u32) -> bool {
        self.profiles.binary_search_by_key(&scan, |p| p.scan).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::identification::sample_identification;

    #[test]
    fn test_isotope_mzs_follow_charge() {
        let ident = sample_identification(10.0, 100);
        let profile = ChromatographProfile::from_identification(&ident, &Default::default());
        let mzs = profile.isotope_mzs(3);
        assert_eq!(mzs.len(), 3);
        assert_eq!(mzs[0], 500.0);
        assert!((mzs[1] - 500.0 - C13_SPACING / 2.0).abs() < 1e-9);
        assert!((mzs[2] - mzs[1] - C13_SPACING / 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_identity_comes_from_identification() {
        let ident = sample_identification(10.0, 100);
        let profile = ChromatographProfile::from_identification(&ident, &Default::default());
        assert_eq!(profile.sequence, "PEPTIDEK");
        assert_eq!(profile.peptide_id, "PEPTIDEK");
        assert_eq!(profile.identified_scan, 100);
        assert!(profile.profiles.is_empty());
        assert_eq!(profile.master_scan(), None);
        assert!(profile.has_retention_time());

        let scan_only = sample_identification(0.0, 100);
        let profile = ChromatographProfile::from_identification(&scan_only, &Default::default());
        assert!(!profile.has_retention_time());
    }
}
