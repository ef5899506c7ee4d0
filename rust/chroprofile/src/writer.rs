//! On-disk layout of extracted profiles and of the manifest.
//!
//! For an output file `run/result.tsv` the layout is:
//!
//! ```text
//! run/result.chros/<experiment>/<experiment>_<sequence>_<mz>_<scan>.chro.tsv
//! run/result.chros/<experiment>/<experiment>_<sequence>_<mz>_<scan>.chro.tsv.json
//! run/result.chros/<experiment>/sub/<experiment>_<sequence>_<mz>_<scan>.chro.sub.tsv
//! run/result.chros.tsv  (manifest)
//! ```
//!
//! Positional isomers share the pure sequence and m/z, and may share the
//! identified scan when it was recovered from the retention time. The names
//! claimed while writing one raw file are tracked so that such a profile gets
//! a `_2`, `_3`, ... suffix instead of overwriting another one.

use std::collections::HashSet;
use std::fs::File;
use std::io::BufWriter;
use std::path::{
    Path,
    PathBuf,
};
use tracing::{
    debug,
    warn,
};

use crate::dedup::GroupProfiles;
use crate::errors::{
    ChroProfileError,
    Result,
};
use crate::models::manifest::MANIFEST_HEADER;
use crate::models::{
    ChromatographProfile,
    ManifestRow,
};

const PROFILE_EXTENSION: &str = "chro.tsv";
const SUB_PROFILE_EXTENSION: &str = "chro.sub.tsv";

/// Directory holding the profiles written for `output_file`.
pub fn profile_directory(output_file: &Path) -> PathBuf {
    output_file.with_extension("chros")
}

/// Path of the manifest written for `output_file`.
pub fn manifest_path(output_file: &Path) -> PathBuf {
    output_file.with_extension("chros.tsv")
}

#[derive(Debug, Clone)]
pub struct ProfileWriter {
    root: PathBuf,
}

impl ProfileWriter {
    pub fn new(output_file: &Path) -> Self {
        Self {
            root: profile_directory(output_file),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn profile_path(&self, profile: &ChromatographProfile, sub: bool, copy: usize) -> PathBuf {
        let experiment = profile.experiment.replace(' ', "_");
        let mut name = format!(
            "{}_{}_{}_{}",
            experiment,
            profile.sequence,
            profile.theoretical_mz.round(),
            profile.identified_scan
        );
        if copy > 1 {
            name.push_str(&format!("_{}", copy));
        }
        let directory = self.root.join(experiment);
        if sub {
            directory
                .join("sub")
                .join(format!("{}.{}", name, SUB_PROFILE_EXTENSION))
        } else {
            directory.join(format!("{}.{}", name, PROFILE_EXTENSION))
        }
    }

    pub fn target_file(&self, profile: &ChromatographProfile) -> PathBuf {
        self.profile_path(profile, false, 1)
    }

    pub fn target_sub_file(&self, profile: &ChromatographProfile) -> PathBuf {
        self.profile_path(profile, true, 1)
    }

    /// First free path for `profile`, recorded in `claimed`.
    fn claim(
        &self,
        profile: &ChromatographProfile,
        sub: bool,
        claimed: &mut HashSet<PathBuf>,
    ) -> PathBuf {
        let mut copy = 1;
        loop {
            let path = self.profile_path(profile, sub, copy);
            if claimed.insert(path.clone()) {
                return path;
            }
            copy += 1;
        }
    }

    /// Writes the main and sub profiles of a group.
    ///
    /// `claimed` holds the paths already written for the same raw file.
    /// Returns the manifest row of the main profile, if there is one.
    pub fn write_group(
        &self,
        group: &GroupProfiles,
        claimed: &mut HashSet<PathBuf>,
    ) -> Result<Option<ManifestRow>> {
        let Some(main) = &group.main else {
            return Ok(None);
        };
        let main_path = self.claim(main, false, claimed);
        if main_path != self.target_file(main) {
            warn!(
                "{} shares its name with another profile, written as {}",
                main.peptide_id,
                main_path.display()
            );
        }
        write_profile(main, &main_path)?;
        for sub in &group.subs {
            let sub_path = self.claim(sub, true, claimed);
            write_profile(sub, &sub_path)?;
        }

        Ok(Some(ManifestRow {
            output_path: main_path,
            experiment: main.experiment.clone(),
            peptide_id: main.peptide_id.clone(),
            theoretical_mz: main.theoretical_mz,
            charge: main.charge,
            identified_scan: main.identified_scan,
        }))
    }
}

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ChroProfileError::io(e, parent))?;
    }
    Ok(())
}

/// Scan table at `path` and its json sibling at `<path>.json`.
pub fn write_profile(profile: &ChromatographProfile, path: &Path) -> Result<()> {
    create_parent(path)?;
    write_scan_table(profile, path)?;

    let mut json_path = path.as_os_str().to_owned();
    json_path.push(".json");
    let json_path = PathBuf::from(json_path);
    let file = File::create(&json_path).map_err(|e| ChroProfileError::io(e, &json_path))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, profile)?;
    std::io::Write::flush(&mut writer).map_err(|e| ChroProfileError::io(e, &json_path))?;
    debug!("Wrote {}", path.display());
    Ok(())
}

fn write_scan_table(profile: &ChromatographProfile, path: &Path) -> Result<()> {
    let isotope_count = profile
        .profiles
        .iter()
        .map(|p| p.isotope_intensities.len())
        .max()
        .unwrap_or(0);

    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(path)?;

    let mut header = vec!["scan".to_string(), "retentionTime".to_string()];
    header.extend((0..isotope_count).map(|i| format!("isotope_{}", i)));
    header.push("identified".to_string());
    wtr.write_record(&header)?;

    for scan in &profile.profiles {
        let mut record = Vec::with_capacity(isotope_count + 3);
        record.push(scan.scan.to_string());
        record.push(scan.retention_time.to_string());
        for i in 0..isotope_count {
            let intensity = scan.isotope_intensities.get(i).copied().unwrap_or(0.0);
            record.push(intensity.to_string());
        }
        record.push(scan.identified.to_string());
        wtr.write_record(&record)?;
    }
    wtr.flush().map_err(|e| ChroProfileError::io(e, path))?;
    Ok(())
}

/// Sorts `rows` by output path and writes them as the manifest.
pub fn write_manifest(rows: &mut [ManifestRow], path: &Path) -> Result<()> {
    rows.sort_by(|a, b| a.output_path.cmp(&b.output_path));
    create_parent(path)?;

    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(path)?;
    wtr.write_record(MANIFEST_HEADER)?;
    for row in rows.iter() {
        wtr.write_record(row.to_record())?;
    }
    wtr.flush().map_err(|e| ChroProfileError::io(e, path))?;
    Ok(())
}
