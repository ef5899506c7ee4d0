//! Per raw file dispatch of the extraction.
//!
//! Every raw file is one unit of work: it gets its own reader and scan
//! index, and only the manifest rows of its main profiles leave the worker.

use rayon::prelude::*;
use std::collections::{
    BTreeMap,
    HashSet,
};
use std::path::{
    Path,
    PathBuf,
};
use std::sync::{
    Mutex,
    PoisonError,
};
use std::time::Instant;
use tracing::{
    error,
    info,
    instrument,
    warn,
};

use crate::data_sources::discover_raw_files;
use crate::dedup::ApexDeduplicator;
use crate::errors::{
    ChroProfileError,
    PreconditionError,
    Result,
};
use crate::matching::EnvelopeMatcher;
use crate::models::{
    ExtractionSettings,
    IdentifiedPeptide,
    ManifestRow,
};
use crate::scan_index::ScanIndex;
use crate::traits::{
    ProgressReporter,
    RawFileOpener,
};
use crate::writer::{
    ProfileWriter,
    manifest_path,
    write_manifest,
};

/// Identifications of one raw file.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionJob {
    pub experiment: String,
    pub raw_file: PathBuf,
    pub identifications: Vec<IdentifiedPeptide>,
}

impl ExtractionJob {
    /// Identifications grouped by peptide id, in peptide id order.
    pub fn peptide_groups(&self) -> BTreeMap<String, Vec<&IdentifiedPeptide>> {
        let mut groups: BTreeMap<String, Vec<&IdentifiedPeptide>> = BTreeMap::new();
        for ident in &self.identifications {
            groups.entry(ident.peptide_id()).or_default().push(ident);
        }
        groups
    }
}

/// Pairs identifications with raw files.
///
/// Fails listing every experiment without a raw file, before anything is
/// opened.
pub fn plan_jobs(
    identifications: Vec<IdentifiedPeptide>,
    raw_files: &BTreeMap<String, PathBuf>,
    raw_directory: &Path,
) -> Result<Vec<ExtractionJob>> {
    if identifications.is_empty() {
        return Err(PreconditionError::EmptyIdentifications { path: None }.into());
    }

    let mut by_experiment: BTreeMap<String, Vec<IdentifiedPeptide>> = BTreeMap::new();
    for ident in identifications {
        by_experiment
            .entry(ident.experiment_key())
            .or_default()
            .push(ident);
    }

    let missing: Vec<String> = by_experiment
        .iter()
        .filter(|(key, _)| !raw_files.contains_key(*key))
        .map(|(_, idents)| idents[0].experiment.clone())
        .collect();
    if !missing.is_empty() {
        return Err(PreconditionError::MissingRawFiles {
            experiments: missing,
            directory: raw_directory.to_path_buf(),
        }
        .into());
    }

    Ok(by_experiment
        .into_iter()
        .filter_map(|(key, identifications)| {
            raw_files.get(&key).map(|raw_file| ExtractionJob {
                experiment: identifications[0].experiment.clone(),
                raw_file: raw_file.clone(),
                identifications,
            })
        })
        .collect())
}

pub struct FileScheduler<'a, O: RawFileOpener, M: EnvelopeMatcher + ?Sized> {
    opener: &'a O,
    matcher: &'a M,
    settings: &'a ExtractionSettings,
    writer: ProfileWriter,
}

impl<'a, O: RawFileOpener, M: EnvelopeMatcher + ?Sized> FileScheduler<'a, O, M> {
    pub fn new(
        opener: &'a O,
        matcher: &'a M,
        settings: &'a ExtractionSettings,
        writer: ProfileWriter,
    ) -> Self {
        Self {
            opener,
            matcher,
            settings,
            writer,
        }
    }

    /// Runs every job and returns the manifest rows, sorted by output path.
    ///
    /// A failing file does not stop the others, but the first error seen is
    /// returned once all workers are done.
    #[instrument(skip_all, fields(num_files = jobs.len()))]
    pub fn run(
        &self,
        jobs: &[ExtractionJob],
        progress: &dyn ProgressReporter,
    ) -> Result<Vec<ManifestRow>> {
        let num_threads = self.settings.effective_thread_count(jobs.len());
        info!("Extracting profiles from {} raw files on {} threads", jobs.len(), num_threads);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build()?;

        let aggregate: Mutex<Vec<ManifestRow>> = Mutex::new(Vec::new());
        let first_error: Mutex<Option<ChroProfileError>> = Mutex::new(None);

        pool.install(|| {
            jobs.par_iter().for_each(|job| match self.process_file(job, progress) {
                Ok(rows) => aggregate
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .extend(rows),
                Err(e) => {
                    if e.is_cancelled() {
                        warn!("Extraction of {} cancelled", job.experiment);
                    } else {
                        error!("Extraction of {} failed: {}", job.experiment, e);
                    }
                    let mut slot = first_error.lock().unwrap_or_else(PoisonError::into_inner);
                    if slot.is_none() {
                        *slot = Some(e);
                    }
                }
            })
        });

        if let Some(e) = first_error
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
        {
            return Err(e);
        }

        let mut rows = aggregate.into_inner().unwrap_or_else(PoisonError::into_inner);
        if rows.is_empty() {
            return Err(ChroProfileError::NoProfileFound);
        }
        rows.sort_by(|a, b| a.output_path.cmp(&b.output_path));
        Ok(rows)
    }

    #[instrument(skip_all, fields(experiment = %job.experiment))]
    fn process_file(
        &self,
        job: &ExtractionJob,
        progress: &dyn ProgressReporter,
    ) -> Result<Vec<ManifestRow>> {
        progress.check_cancelled()?;
        progress.file_started(&job.experiment);
        let start = Instant::now();

        progress.set_message(&format!("Reading MS1 scans of {}", job.raw_file.display()));
        let reader = self.opener.open(&job.raw_file)?;
        let mut index = ScanIndex::build(reader)?;

        let deduplicator = ApexDeduplicator::new(self.matcher, self.settings);
        let mut rows = Vec::new();
        let mut num_subs = 0;
        let mut claimed = HashSet::new();
        for (_, group) in job.peptide_groups() {
            let profiles = deduplicator.process_group(&mut index, &group, progress)?;
            num_subs += profiles.subs.len();
            if let Some(row) = self.writer.write_group(&profiles, &mut claimed)? {
                rows.push(row);
            }
        }

        info!(
            "{}: {} profiles ({} sub) from {} identifications in {:?}",
            job.experiment,
            rows.len(),
            num_subs,
            job.identifications.len(),
            start.elapsed()
        );
        progress.file_finished(&job.experiment);
        Ok(rows)
    }
}

/// Full extraction run: raw file discovery, per file extraction and the
/// manifest next to `output_file`.
///
/// Returns the manifest rows, in manifest order.
#[instrument(skip_all)]
pub fn run_extraction<O: RawFileOpener, M: EnvelopeMatcher + ?Sized>(
    identifications: Vec<IdentifiedPeptide>,
    raw_directory: &Path,
    output_file: &Path,
    settings: &ExtractionSettings,
    opener: &O,
    matcher: &M,
    progress: &dyn ProgressReporter,
) -> Result<Vec<ManifestRow>> {
    settings.validate()?;
    let raw_files = discover_raw_files(raw_directory, &settings.raw_extensions)?;
    let jobs = plan_jobs(identifications, &raw_files, raw_directory)?;

    let scheduler = FileScheduler::new(opener, matcher, settings, ProfileWriter::new(output_file));
    let mut rows = scheduler.run(&jobs, progress)?;

    let manifest = manifest_path(output_file);
    progress.set_message(&format!("Writing manifest {}", manifest.display()));
    write_manifest(&mut rows, &manifest)?;
    info!("Wrote {} profiles to {}", rows.len(), manifest.display());
    Ok(rows)
}
