//! Tab-delimited identification tables.
//!
//! The header is sniffed to pick the retention time column: tables produced
//! by a retention time predictor carry a `PredictionRetentionTime` column and
//! that value is used as identification time.
//!
//! Experiment and scan can either come from their own columns or from a
//! `FileScan` column in the `experiment.firstscan.lastscan.charge[.dta]`
//! form. Precursor m/z can be given directly or as MH+.

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use tracing::info;

use crate::errors::{
    ChroProfileError,
    PreconditionError,
    Result,
};
use crate::models::IdentifiedPeptide;
use crate::models::isotopes::PROTON_MASS;

pub const PREDICTION_MARKER: &str = "PredictionRetentionTime";

static FILE_SCAN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(.+)\.(\d+)\.(\d+)\.(\d+)(\.[A-Za-z]+)?$").expect("file scan pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentificationFormat {
    SearchResult,
    RetentionTimePrediction,
}

impl IdentificationFormat {
    pub fn sniff(header: &csv::StringRecord) -> Self {
        if header.iter().any(|c| c == PREDICTION_MARKER) {
            Self::RetentionTimePrediction
        } else {
            Self::SearchResult
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum MzColumn {
    Mz(usize),
    MhPlus(usize),
}

#[derive(Debug)]
struct ColumnLayout {
    experiment: Option<usize>,
    first_scan: Option<usize>,
    file_scan: Option<usize>,
    sequence: usize,
    charge: usize,
    theoretical: MzColumn,
    observed: MzColumn,
    retention_time: Option<usize>,
}

fn find(header: &csv::StringRecord, names: &[&str]) -> Option<usize> {
    header
        .iter()
        .position(|c| names.iter().any(|n| c.trim().eq_ignore_ascii_case(n)))
}

fn find_mz(header: &csv::StringRecord, mz_names: &[&str], mh_names: &[&str]) -> Option<MzColumn> {
    find(header, mz_names)
        .map(MzColumn::Mz)
        .or_else(|| find(header, mh_names).map(MzColumn::MhPlus))
}

impl ColumnLayout {
    fn from_header(
        header: &csv::StringRecord,
        format: IdentificationFormat,
        path: &Path,
    ) -> Result<Self> {
        let experiment = find(header, &["Experimental", "Experiment", "RawFile"]);
        let first_scan = find(header, &["FirstScan", "Scan", "ScanNumber"]);
        let file_scan = find(header, &["FileScan"]);
        let sequence = find(header, &["Sequence", "Peptide"]);
        let charge = find(header, &["Charge"]);
        let theoretical = find_mz(header, &["TheoreticalMz"], &["TheoreticalMH+", "MH+"]);
        let observed = find_mz(
            header,
            &["ObservedMz", "PrecursorMz"],
            &["ObservedMH+", "ExperimentalMH+"],
        );
        let retention_time = match format {
            IdentificationFormat::RetentionTimePrediction => find(header, &[PREDICTION_MARKER]),
            IdentificationFormat::SearchResult => find(header, &["RetentionTime", "RT"]),
        };

        let mut missing = Vec::new();
        if experiment.is_none() && file_scan.is_none() {
            missing.push("Experimental (or FileScan)");
        }
        if first_scan.is_none() && file_scan.is_none() && retention_time.is_none() {
            missing.push("FirstScan (or FileScan, or RetentionTime)");
        }
        if sequence.is_none() {
            missing.push("Sequence");
        }
        if charge.is_none() {
            missing.push("Charge");
        }
        if theoretical.is_none() {
            missing.push("TheoreticalMz");
        }
        if observed.is_none() {
            missing.push("ObservedMz");
        }

        match (sequence, charge, theoretical, observed) {
            (Some(sequence), Some(charge), Some(theoretical), Some(observed))
                if missing.is_empty() =>
            {
                Ok(Self {
                    experiment,
                    first_scan,
                    file_scan,
                    sequence,
                    charge,
                    theoretical,
                    observed,
                    retention_time,
                })
            }
            _ => Err(PreconditionError::MissingColumns {
                path: path.to_path_buf(),
                columns: missing,
            }
            .into()),
        }
    }
}

fn field<'a>(record: &'a csv::StringRecord, idx: usize, name: &str) -> std::result::Result<&'a str, String> {
    record
        .get(idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("missing {}", name))
}

fn parse_field<T: std::str::FromStr>(
    record: &csv::StringRecord,
    idx: usize,
    name: &str,
) -> std::result::Result<T, String> {
    let value = field(record, idx, name)?;
    value
        .parse()
        .map_err(|_| format!("invalid {} '{}'", name, value))
}

fn mh_to_mz(mh: f64, charge: u8) -> f64 {
    (mh - PROTON_MASS) / charge.max(1) as f64 + PROTON_MASS
}

fn parse_mz(
    record: &csv::StringRecord,
    column: MzColumn,
    charge: u8,
    name: &str,
) -> std::result::Result<f64, String> {
    match column {
        MzColumn::Mz(idx) => parse_field(record, idx, name),
        MzColumn::MhPlus(idx) => parse_field(record, idx, name).map(|mh| mh_to_mz(mh, charge)),
    }
}

fn parse_row(
    record: &csv::StringRecord,
    layout: &ColumnLayout,
) -> std::result::Result<IdentifiedPeptide, String> {
    let file_scan = match layout.file_scan {
        Some(idx) => {
            let value = field(record, idx, "FileScan")?;
            let caps = FILE_SCAN
                .captures(value)
                .ok_or_else(|| format!("invalid FileScan '{}'", value))?;
            let scan: u32 = caps[2]
                .parse()
                .map_err(|_| format!("invalid FileScan '{}'", value))?;
            Some((caps[1].to_string(), scan))
        }
        None => None,
    };

    let experiment = match (layout.experiment, &file_scan) {
        (Some(idx), _) => field(record, idx, "Experimental")?.to_string(),
        (None, Some((exp, _))) => exp.clone(),
        (None, None) => return Err("missing experiment".to_string()),
    };
    let first_scan = match (layout.first_scan, &file_scan) {
        (Some(idx), _) => parse_field(record, idx, "FirstScan")?,
        (None, Some((_, scan))) => *scan,
        (None, None) => 0,
    };
    let retention_time: f64 = match layout.retention_time {
        Some(idx) => parse_field(record, idx, "RetentionTime")?,
        None => 0.0,
    };
    if !retention_time.is_finite() {
        return Err(format!("invalid RetentionTime '{}'", retention_time));
    }
    if first_scan == 0 && retention_time <= 0.0 {
        return Err("neither scan number nor retention time is known".to_string());
    }

    let charge: u8 = parse_field(record, layout.charge, "Charge")?;
    if charge == 0 {
        return Err("charge must be positive".to_string());
    }

    Ok(IdentifiedPeptide {
        experiment,
        sequence: field(record, layout.sequence, "Sequence")?.to_string(),
        charge,
        theoretical_mz: parse_mz(record, layout.theoretical, charge, "TheoreticalMz")?,
        observed_mz: parse_mz(record, layout.observed, charge, "ObservedMz")?,
        first_scan,
        retention_time,
    })
}

/// Reads every identification of a tab-delimited table.
///
/// All malformed rows are reported together; an empty table is an error.
pub fn read_identifications<T: AsRef<Path>>(path: T) -> Result<Vec<IdentifiedPeptide>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|e| ChroProfileError::io(e, path))?;
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .from_reader(file);

    let header = rdr.headers()?.clone();
    let format = IdentificationFormat::sniff(&header);
    let layout = ColumnLayout::from_header(&header, format, path)?;
    info!(
        "Reading identifications from {} as {:?}",
        path.display(),
        format
    );

    let mut identifications = Vec::new();
    let mut problems = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        // Line 1 is the header.
        let line = i + 2;
        let record = result?;
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        match parse_row(&record, &layout) {
            Ok(ident) => identifications.push(ident),
            Err(msg) => problems.push(format!("line {}: {}", line, msg)),
        }
    }

    if !problems.is_empty() {
        return Err(PreconditionError::MalformedIdentifications {
            path: path.to_path_buf(),
            problems,
        }
        .into());
    }
    if identifications.is_empty() {
        return Err(PreconditionError::EmptyIdentifications {
            path: Some(path.to_path_buf()),
        }
        .into());
    }

    info!("Read {} identifications", identifications.len());
    Ok(identifications)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_tmp(content: &str) -> tempfile::NamedTempFile {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), content).unwrap();
        file
    }

    #[test]
    fn test_reads_plain_columns() {
        let file = write_tmp(
            "Experimental\tSequence\tCharge\tTheoreticalMz\tObservedMz\tFirstScan\tRetentionTime\n\
             Run_A\tK.PEPTIDEK.A\t2\t500.25\t500.251\t1200\t10.5\n\
             Run_B\tSAMPLER\t3\t400.1\t400.1\t88\t3.25\n",
        );
        let idents = read_identifications(file.path()).unwrap();
        assert_eq!(idents.len(), 2);
        assert_eq!(idents[0].experiment, "Run_A");
        assert_eq!(idents[0].charge, 2);
        assert_eq!(idents[0].first_scan, 1200);
        assert_eq!(idents[0].retention_time, 10.5);
        assert_eq!(idents[1].pure_sequence(), "SAMPLER");
    }

    #[test]
    fn test_prediction_marker_selects_predicted_time() {
        let file = write_tmp(
            "Experimental\tSequence\tCharge\tTheoreticalMz\tObservedMz\tFirstScan\tRetentionTime\tPredictionRetentionTime\n\
             Run_A\tPEPTIDEK\t2\t500.25\t500.251\t0\t10.5\t12.0\n",
        );
        let idents = read_identifications(file.path()).unwrap();
        assert_eq!(idents[0].retention_time, 12.0);
        assert_eq!(idents[0].first_scan, 0);
    }

    #[test]
    fn test_file_scan_and_mh_columns() {
        let file = write_tmp(
            "FileScan\tSequence\tCharge\tTheoreticalMH+\tObservedMH+\n\
             Run_C.2001.2001.2.dta\tR.SAMPLER.G\t2\t1001.0\t1001.0\n",
        );
        let idents = read_identifications(file.path()).unwrap();
        assert_eq!(idents[0].experiment, "Run_C");
        assert_eq!(idents[0].first_scan, 2001);
        let expected = (1001.0 - PROTON_MASS) / 2.0 + PROTON_MASS;
        assert!((idents[0].theoretical_mz - expected).abs() < 1e-9);
    }

    #[test]
    fn test_all_malformed_rows_are_reported() {
        let file = write_tmp(
            "Experimental\tSequence\tCharge\tTheoreticalMz\tObservedMz\tFirstScan\tRetentionTime\n\
             Run_A\tPEPTIDEK\tx\t500.25\t500.251\t10\t1.0\n\
             Run_A\tPEPTIDEK\t2\t500.25\t500.251\t10\t1.0\n\
             Run_A\tPEPTIDEK\t2\tabc\t500.251\t10\t1.0\n",
        );
        match read_identifications(file.path()).unwrap_err() {
            ChroProfileError::Precondition(PreconditionError::MalformedIdentifications {
                problems,
                ..
            }) => {
                assert_eq!(problems.len(), 2);
                assert!(problems[0].starts_with("line 2"));
                assert!(problems[1].starts_with("line 4"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_non_finite_retention_time_is_rejected() {
        let file = write_tmp(
            "Experimental\tSequence\tCharge\tTheoreticalMz\tObservedMz\tFirstScan\tRetentionTime\n\
             Run_A\tPEPTIDEK\t2\t500.25\t500.251\t0\tNaN\n\
             Run_A\tPEPTIDEK\t2\t500.25\t500.251\t12\tinf\n\
             Run_A\tPEPTIDEK\t2\t500.25\t500.251\t0\t10.5\n",
        );
        match read_identifications(file.path()).unwrap_err() {
            ChroProfileError::Precondition(PreconditionError::MalformedIdentifications {
                problems,
                ..
            }) => {
                assert_eq!(problems.len(), 2);
                assert!(problems[0].starts_with("line 2: invalid RetentionTime"));
                assert!(problems[1].starts_with("line 3: invalid RetentionTime"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_empty_and_incomplete_tables() {
        let file = write_tmp(
            "Experimental\tSequence\tCharge\tTheoreticalMz\tObservedMz\tFirstScan\tRetentionTime\n",
        );
        assert!(matches!(
            read_identifications(file.path()),
            Err(ChroProfileError::Precondition(
                PreconditionError::EmptyIdentifications { .. }
            ))
        ));

        let file = write_tmp("Experimental\tSequence\nRun_A\tPEPTIDEK\n");
        match read_identifications(file.path()).unwrap_err() {
            ChroProfileError::Precondition(PreconditionError::MissingColumns { columns, .. }) => {
                assert!(columns.contains(&"Charge"));
                assert!(columns.contains(&"TheoreticalMz"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }
}
