use serde::{
    Deserialize,
    Serialize,
};
use std::path::PathBuf;

/// One row of the manifest handed to the boundary-fitting step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestRow {
    pub output_path: PathBuf,
    pub experiment: String,
    pub peptide_id: String,
    pub theoretical_mz: f64,
    pub charge: u8,
    pub identified_scan: u32,
}

pub const MANIFEST_HEADER: [&str; 7] = [
    "directory",
    "file",
    "experiment",
    "peptideId",
    "theoreticalMz",
    "charge",
    "identifiedScan",
];

impl ManifestRow {
    /// Directory of the scan table, with forward slashes.
    pub fn directory(&self) -> String {
        self.output_path
            .parent()
            .map(|p| p.to_string_lossy().replace('\\', "/"))
            .unwrap_or_default()
    }

    /// File name of the scan table without its last extension.
    pub fn file_stem(&self) -> String {
        self.output_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    pub fn to_record(&self) -> [String; 7] {
        [
            self.directory(),
            self.file_stem(),
            self.experiment.clone(),
            self.peptide_id.clone(),
            self.theoretical_mz.to_string(),
            self.charge.to_string(),
            self.identified_scan.to_string(),
        ]
    }
}
