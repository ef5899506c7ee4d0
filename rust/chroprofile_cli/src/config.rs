use chroprofile::ExtractionSettings;
use serde::{
    Deserialize,
    Serialize,
};
use std::path::{
    Path,
    PathBuf,
};

use crate::cli::ExtractArgs;
use crate::error::CliError;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    pub input: Option<InputConfig>,
    #[serde(default)]
    pub analysis: ExtractionSettings,
    pub output: Option<OutputConfig>,
    /// External boundary fitting step, run on the manifest once it is written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boundary: Option<BoundaryConfig>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct InputConfig {
    pub identifications: PathBuf,
    pub raw_directory: PathBuf,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct OutputConfig {
    pub file: PathBuf,
}

/// Runs `executable script <manifest> <output file>`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct BoundaryConfig {
    pub executable: PathBuf,
    pub script: PathBuf,
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, CliError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CliError::Config(format!("Unable to read {}: {}", path.display(), e))
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn template() -> Self {
        Self {
            input: Some(InputConfig {
                identifications: PathBuf::from("peptides.tsv"),
                raw_directory: PathBuf::from("raw"),
            }),
            analysis: ExtractionSettings::default(),
            output: Some(OutputConfig {
                file: PathBuf::from("result/peptides.lfq.tsv"),
            }),
            boundary: Some(BoundaryConfig {
                executable: PathBuf::from("Rscript"),
                script: PathBuf::from("find_boundary.r"),
            }),
        }
    }

    /// Command line values take precedence over the file.
    pub fn apply_args(&mut self, args: &ExtractArgs) -> Result<(), CliError> {
        if let Some(input) = self.input.as_mut() {
            if let Some(idents) = &args.identifications {
                input.identifications = idents.clone();
            }
            if let Some(raw) = &args.raw_directory {
                input.raw_directory = raw.clone();
            }
        } else if let (Some(idents), Some(raw)) = (&args.identifications, &args.raw_directory) {
            self.input = Some(InputConfig {
                identifications: idents.clone(),
                raw_directory: raw.clone(),
            });
        } else {
            return Err(CliError::Config(
                "No input provided, please provide one in either the config file or with the --identifications and --raw-directory flags".to_string(),
            ));
        }

        if let Some(file) = &args.output_file {
            self.output = Some(OutputConfig { file: file.clone() });
        }
        if self.output.is_none() {
            return Err(CliError::Config(
                "No output provided, please provide one in either the config file or with the --output-file flag".to_string(),
            ));
        }

        if let Some(threads) = args.threads {
            self.analysis.thread_count = threads;
        }
        if let Some(overwrite) = args.overwrite {
            self.analysis.overwrite = overwrite;
        }
        self.analysis.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_round_trips() {
        let text = serde_json::to_string_pretty(&Config::template()).unwrap();
        let config: Config = serde_json::from_str(&text).unwrap();
        assert_eq!(config, Config::template());
    }

    #[test]
    fn test_partial_analysis_uses_defaults() {
        let config: Config = serde_json::from_str(
            r#"{
                "input": {"identifications": "a.tsv", "raw_directory": "raw"},
                "analysis": {"mz_tolerance_ppm": 5.0},
                "output": {"file": "out.tsv"}
            }"#,
        )
        .unwrap();
        assert_eq!(config.analysis.mz_tolerance_ppm, 5.0);
        assert_eq!(config.analysis.minimum_scan_count, 5);
        assert!(config.boundary.is_none());
    }

    #[test]
    fn test_args_override_file_values() {
        let mut config = Config::template();
        let args = ExtractArgs {
            raw_directory: Some(PathBuf::from("other_raw")),
            output_file: Some(PathBuf::from("other.tsv")),
            threads: Some(3),
            overwrite: Some(false),
            ..Default::default()
        };
        config.apply_args(&args).unwrap();
        let input = config.input.unwrap();
        assert_eq!(input.identifications, PathBuf::from("peptides.tsv"));
        assert_eq!(input.raw_directory, PathBuf::from("other_raw"));
        assert_eq!(config.output.unwrap().file, PathBuf::from("other.tsv"));
        assert_eq!(config.analysis.thread_count, 3);
        assert!(!config.analysis.overwrite);
    }

    #[test]
    fn test_missing_input_is_reported() {
        let mut config = Config {
            input: None,
            analysis: ExtractionSettings::default(),
            output: None,
            boundary: None,
        };
        let args = ExtractArgs {
            identifications: Some(PathBuf::from("a.tsv")),
            ..Default::default()
        };
        assert!(matches!(config.apply_args(&args), Err(CliError::Config(_))));
    }
}
