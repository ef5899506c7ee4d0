use std::path::PathBuf;

/// Problems found before any raw file is opened.
///
/// Every variant carries the full list of offending entries, so a single run
/// reports everything that has to be fixed at once.
#[derive(Debug)]
pub enum PreconditionError {
    MissingRawFiles {
        experiments: Vec<String>,
        directory: PathBuf,
    },
    AmbiguousRawFiles {
        duplicates: Vec<(String, Vec<PathBuf>)>,
    },
    EmptyIdentifications {
        path: Option<PathBuf>,
    },
    MalformedIdentifications {
        path: PathBuf,
        problems: Vec<String>,
    },
    MissingColumns {
        path: PathBuf,
        columns: Vec<&'static str>,
    },
}

impl std::fmt::Display for PreconditionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingRawFiles {
                experiments,
                directory,
            } => write!(
                f,
                "Cannot find raw file of {} in directory {}",
                experiments.join("/"),
                directory.display()
            ),
            Self::AmbiguousRawFiles { duplicates } => {
                writeln!(f, "Raw file names are ambiguous:")?;
                for (stem, paths) in duplicates {
                    let paths: Vec<String> =
                        paths.iter().map(|p| p.display().to_string()).collect();
                    writeln!(f, "  {}: {}", stem, paths.join(", "))?;
                }
                Ok(())
            }
            Self::EmptyIdentifications { path } => match path {
                Some(path) => write!(f, "No identifications found in {}", path.display()),
                None => write!(f, "No identifications provided"),
            },
            Self::MalformedIdentifications { path, problems } => write!(
                f,
                "Malformed identifications in {}:\n{}",
                path.display(),
                problems.join("\n")
            ),
            Self::MissingColumns { path, columns } => write!(
                f,
                "Identification file {} is missing columns: {}",
                path.display(),
                columns.join(", ")
            ),
        }
    }
}

#[derive(Debug)]
pub enum RawReadingError {
    Open {
        path: PathBuf,
        source: String,
    },
    SpectrumNotFound {
        scan: u32,
    },
    Other(String),
}

impl std::fmt::Display for RawReadingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open { path, source } => {
                write!(f, "Unable to open raw file {}: {}", path.display(), source)
            }
            Self::SpectrumNotFound { scan } => write!(f, "Spectrum {} not found", scan),
            Self::Other(msg) => write!(f, "{}", msg),
        }
    }
}

#[derive(Debug)]
pub enum ChroProfileError {
    Precondition(PreconditionError),
    RawReading(RawReadingError),
    Io {
        source: std::io::Error,
        path: Option<PathBuf>,
    },
    Csv(csv::Error),
    Json(serde_json::Error),
    InvalidSettings {
        field: &'static str,
        msg: String,
    },
    ThreadPool(rayon::ThreadPoolBuildError),
    /// The run was stopped on request. Not a fault.
    Cancelled,
    /// Nothing passed the filters anywhere, the boundary step has no input.
    NoProfileFound,
}

impl ChroProfileError {
    pub fn io(source: std::io::Error, path: impl Into<PathBuf>) -> Self {
        Self::Io {
            source,
            path: Some(path.into()),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl std::fmt::Display for ChroProfileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Precondition(e) => write!(f, "{}", e),
            Self::RawReading(e) => write!(f, "Error reading raw data: {}", e),
            Self::Io { source, path } => match path {
                Some(path) => write!(f, "Error accessing {}: {}", path.display(), source),
                None => write!(f, "I/O error: {}", source),
            },
            Self::Csv(e) => write!(f, "Error in tab-delimited data: {}", e),
            Self::Json(e) => write!(f, "Error in json data: {}", e),
            Self::InvalidSettings { field, msg } => {
                write!(f, "Invalid setting {}: {}", field, msg)
            }
            Self::ThreadPool(e) => write!(f, "Unable to start worker threads: {}", e),
            Self::Cancelled => write!(f, "Operation cancelled"),
            Self::NoProfileFound => write!(f, "Cannot find chromatograph!"),
        }
    }
}

impl std::error::Error for ChroProfileError {}

pub type Result<T> = std::result::Result<T, ChroProfileError>;

impl From<PreconditionError> for ChroProfileError {
    fn from(x: PreconditionError) -> Self {
        Self::Precondition(x)
    }
}

impl From<RawReadingError> for ChroProfileError {
    fn from(x: RawReadingError) -> Self {
        Self::RawReading(x)
    }
}

impl From<std::io::Error> for ChroProfileError {
    fn from(x: std::io::Error) -> Self {
        Self::Io {
            source: x,
            path: None,
        }
    }
}

impl From<csv::Error> for ChroProfileError {
    fn from(x: csv::Error) -> Self {
        Self::Csv(x)
    }
}

impl From<serde_json::Error> for ChroProfileError {
    fn from(x: serde_json::Error) -> Self {
        Self::Json(x)
    }
}

impl From<rayon::ThreadPoolBuildError> for ChroProfileError {
    fn from(x: rayon::ThreadPoolBuildError) -> Self {
        Self::ThreadPool(x)
    }
}
