use clap::{
    Parser,
    Subcommand,
};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract chromatographic profiles of identified peptides.
    Extract(ExtractArgs),
    /// Write a template configuration file.
    WriteTemplate(WriteTemplateArgs),
}

#[derive(Parser, Debug, Clone, Default)]
pub struct ExtractArgs {
    /// Path to the JSON configuration file
    #[arg(short, long)]
    pub config: PathBuf,

    /// Tab-delimited identifications (will over-write the config file)
    #[arg(short, long)]
    pub identifications: Option<PathBuf>,

    /// Directory searched for raw files (will over-write the config file)
    #[arg(short, long)]
    pub raw_directory: Option<PathBuf>,

    /// Output file, profiles are written next to it (will over-write the config file)
    #[arg(short, long)]
    pub output_file: Option<PathBuf>,

    /// Number of worker threads, 0 uses all processors
    #[arg(short, long)]
    pub threads: Option<usize>,

    /// Re-run even if the output already exists
    #[arg(long)]
    pub overwrite: Option<bool>,
}

#[derive(Parser, Debug)]
pub struct WriteTemplateArgs {
    /// The path to the output file.
    #[arg(short, long)]
    pub output_path: PathBuf,
}
