use std::collections::BTreeMap;
use std::path::{
    Path,
    PathBuf,
};
use tracing::{
    debug,
    info,
};

use crate::errors::{
    ChroProfileError,
    PreconditionError,
    Result,
};

fn collect_files(dir: &Path, extensions: &[String], out: &mut Vec<PathBuf>) -> Result<()> {
    let entries = std::fs::read_dir(dir).map_err(|e| ChroProfileError::io(e, dir))?;
    for entry in entries {
        let path = entry.map_err(|e| ChroProfileError::io(e, dir))?.path();
        if path.is_dir() {
            collect_files(&path, extensions, out)?;
            continue;
        }
        let matches = path.extension().is_some_and(|ext| {
            let ext = ext.to_string_lossy();
            extensions.iter().any(|x| x.eq_ignore_ascii_case(&ext))
        });
        if matches {
            out.push(path);
        }
    }
    Ok(())
}

/// Finds raw files under `dir` (recursively), keyed by lower-cased file stem.
///
/// Extensions are compared case-insensitively and given without the dot.
/// Two files sharing a stem cannot be told apart by experiment name and
/// are reported together as a precondition failure.
pub fn discover_raw_files(dir: &Path, extensions: &[String]) -> Result<BTreeMap<String, PathBuf>> {
    let mut files = Vec::new();
    collect_files(dir, extensions, &mut files)?;
    files.sort();

    let mut by_stem: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    for path in files {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        by_stem.entry(stem).or_default().push(path);
    }

    let duplicates: Vec<(String, Vec<PathBuf>)> = by_stem
        .iter()
        .filter(|(_, paths)| paths.len() > 1)
        .map(|(stem, paths)| (stem.clone(), paths.clone()))
        .collect();
    if !duplicates.is_empty() {
        return Err(PreconditionError::AmbiguousRawFiles { duplicates }.into());
    }

    let found: BTreeMap<String, PathBuf> = by_stem
        .into_iter()
        .filter_map(|(stem, mut paths)| paths.pop().map(|p| (stem, p)))
        .collect();
    for (stem, path) in found.iter() {
        debug!("Raw file {} -> {}", stem, path.display());
    }
    info!("Found {} raw files in {}", found.len(), dir.display());
    Ok(found)
}
