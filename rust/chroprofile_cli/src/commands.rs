use chroprofile::writer::manifest_path;
use chroprofile::{
    DefaultOpener,
    PpmEnvelopeMatcher,
    read_identifications,
    run_extraction,
};
use std::collections::BTreeSet;
use std::path::{
    Path,
    PathBuf,
};
use std::process::Command;
use std::time::Instant;
use tracing::{
    info,
    instrument,
};

use crate::cli::{
    ExtractArgs,
    WriteTemplateArgs,
};
use crate::config::{
    BoundaryConfig,
    Config,
};
use crate::error::CliError;
use crate::progress::BarReporter;

/// Main function for the 'extract' subcommand.
#[instrument(skip_all)]
pub fn main_extract(args: ExtractArgs) -> Result<(), CliError> {
    let mut config = Config::from_file(&args.config)?;
    config.apply_args(&args)?;
    info!("Parsed configuration: {:#?}", config);

    let (Some(input), Some(output)) = (&config.input, &config.output) else {
        return Err(CliError::Config("Input and output are required".to_string()));
    };

    if let Some(existing) = existing_result(&config, &output.file) {
        info!(
            "{} already exists and overwrite is disabled, nothing to do",
            existing.display()
        );
        return Ok(());
    }

    let start = Instant::now();
    let identifications = read_identifications(&input.identifications)?;
    let num_files = identifications
        .iter()
        .map(|x| x.experiment_key())
        .collect::<BTreeSet<_>>()
        .len();

    let reporter = BarReporter::new(num_files as u64);
    let result = run_extraction(
        identifications,
        &input.raw_directory,
        &output.file,
        &config.analysis,
        &DefaultOpener,
        &PpmEnvelopeMatcher,
        &reporter,
    );
    reporter.finish();
    let rows = result?;
    println!(
        "Extracted {} profiles in {:?}, manifest at {}",
        rows.len(),
        start.elapsed(),
        manifest_path(&output.file).display()
    );

    if let Some(boundary) = &config.boundary {
        run_boundary(boundary, &manifest_path(&output.file), &output.file)?;
    }
    Ok(())
}

/// The result that makes a run unnecessary, when overwriting is disabled.
///
/// With a boundary step the final output file counts, otherwise the manifest.
fn existing_result(config: &Config, output_file: &Path) -> Option<PathBuf> {
    if config.analysis.overwrite {
        return None;
    }
    let target = match config.boundary {
        Some(_) => output_file.to_path_buf(),
        None => manifest_path(output_file),
    };
    target.exists().then_some(target)
}

#[instrument(skip(boundary))]
fn run_boundary(boundary: &BoundaryConfig, manifest: &Path, output_file: &Path) -> Result<(), CliError> {
    info!(
        "Finding boundaries with {} {}",
        boundary.executable.display(),
        boundary.script.display()
    );
    let status = Command::new(&boundary.executable)
        .arg(&boundary.script)
        .arg(manifest)
        .arg(output_file)
        .status()
        .map_err(|e| {
            CliError::Boundary(format!(
                "unable to start {}: {}",
                boundary.executable.display(),
                e
            ))
        })?;
    if !status.success() {
        return Err(CliError::Boundary(format!(
            "{} exited with {}",
            boundary.script.display(),
            status
        )));
    }
    Ok(())
}

pub fn main_write_template(args: WriteTemplateArgs) -> Result<(), CliError> {
    let path = args.output_path;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, serde_json::to_string_pretty(&Config::template())?)?;
    println!("Wrote configuration template to: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_written_template_is_readable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        main_write_template(WriteTemplateArgs {
            output_path: path.clone(),
        })
        .unwrap();
        assert_eq!(Config::from_file(&path).unwrap(), Config::template());
    }

    #[test]
    fn test_existing_result_only_without_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("result.tsv");
        let mut config = Config::template();
        config.boundary = None;

        std::fs::write(manifest_path(&output), "").unwrap();
        assert_eq!(existing_result(&config, &output), None);

        config.analysis.overwrite = false;
        assert_eq!(existing_result(&config, &output), Some(manifest_path(&output)));

        config.boundary = Config::template().boundary;
        assert_eq!(existing_result(&config, &output), None);
        std::fs::write(&output, "").unwrap();
        assert_eq!(existing_result(&config, &output), Some(output.clone()));
    }

    #[cfg(unix)]
    #[test]
    fn test_boundary_step_receives_manifest_and_output() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("boundary.sh");
        std::fs::write(&script, "cp \"$1\" \"$2\"\n").unwrap();
        let manifest = dir.path().join("result.chros.tsv");
        std::fs::write(&manifest, "directory\tfile\n").unwrap();
        let output = dir.path().join("result.tsv");

        let boundary = BoundaryConfig {
            executable: PathBuf::from("sh"),
            script: script.clone(),
        };
        run_boundary(&boundary, &manifest, &output).unwrap();
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "directory\tfile\n");

        std::fs::write(&script, "exit 3\n").unwrap();
        assert!(matches!(
            run_boundary(&boundary, &manifest, &output),
            Err(CliError::Boundary(_))
        ));
    }
}
