use once_cell::sync::Lazy;
use regex::Regex;
use serde::{
    Deserialize,
    Serialize,
};

static FLANKED_SEQUENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z\-]\.(.+)\.[A-Za-z\-]$").expect("flanking residue pattern is valid")
});

/// An identified MS/MS spectrum as handed over by the search engine parsers.
///
/// `first_scan == 0` means the scan number is unknown and has to be
/// recovered from `retention_time`; `retention_time <= 0` means the
/// retention time is unknown and the scan number is used instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentifiedPeptide {
    pub experiment: String,
    /// Sequence as reported, may carry flanking residues (`K.PEPT*IDE.R`)
    /// and modification symbols.
    pub sequence: String,
    pub charge: u8,
    pub theoretical_mz: f64,
    pub observed_mz: f64,
    pub first_scan: u32,
    pub retention_time: f64,
}

impl IdentifiedPeptide {
    /// Sequence without the flanking residues, modifications kept.
    pub fn modified_sequence(&self) -> &str {
        match FLANKED_SEQUENCE.captures(&self.sequence) {
            Some(caps) => caps.get(1).map_or(self.sequence.as_str(), |m| m.as_str()),
            None => self.sequence.as_str(),
        }
    }

    /// Only the amino acid letters.
    pub fn pure_sequence(&self) -> String {
        self.modified_sequence()
            .chars()
            .filter(|c| c.is_ascii_uppercase())
            .collect()
    }

    /// Key of the peptide-identity group this identification belongs to.
    ///
    /// Different charge states of the same modified peptide share the key.
    pub fn peptide_id(&self) -> String {
        self.modified_sequence().to_string()
    }

    /// Case-insensitive key used to pair identifications with raw files.
    pub fn experiment_key(&self) -> String {
        self.experiment.to_lowercase()
    }
}

#[cfg(test)]
pub(crate) fn sample_identification(retention_time: f64, first_scan: u32) -> IdentifiedPeptide {
    IdentifiedPeptide {
        experiment: "Sample_01".to_string(),
        sequence: "K.PEPTIDEK.A".to_string(),
        charge: 2,
        theoretical_mz: 500.0,
        observed_mz: 500.001,
        first_scan,
        retention_time,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_forms() {
        let mut ident = sample_identification(1.0, 10);
        ident.sequence = "R.SAM*PLER.G".to_string();
        assert_eq!(ident.modified_sequence(), "SAM*PLER");
        assert_eq!(ident.pure_sequence(), "SAMPLER");
        assert_eq!(ident.peptide_id(), "SAM*PLER");

        ident.sequence = "SAMPLER".to_string();
        assert_eq!(ident.modified_sequence(), "SAMPLER");

        ident.sequence = "-.SAMPLER.-".to_string();
        assert_eq!(ident.pure_sequence(), "SAMPLER");
    }

    #[test]
    fn test_experiment_key_is_case_insensitive() {
        let mut ident = sample_identification(1.0, 10);
        ident.experiment = "Run_A".to_string();
        assert_eq!(ident.experiment_key(), "run_a");
    }
}
