use serde::{
    Deserialize,
    Serialize,
};

use crate::errors::{
    ChroProfileError,
    Result,
};

/// Parameters of a profile extraction run.
///
/// Example:
/// ```
/// use chroprofile::ExtractionSettings;
///
/// let settings = ExtractionSettings::default();
/// assert!(settings.validate().is_ok());
/// ```
///
/// Retention times (and so `retention_time_window`) are in minutes, the same
/// unit the raw readers report. `minimum_isotopic_percentage` is a percentage
/// of the most abundant isotope (eg. 5.0 means 5%).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExtractionSettings {
    pub mz_tolerance_ppm: f64,
    pub minimum_isotopic_percentage: f64,
    pub retention_time_window: f64,
    pub minimum_scan_count: usize,
    pub minimum_correlation: f64,
    /// Number of isotopes tracked per scan.
    pub profile_length: usize,
    /// 0 means "use all available processors".
    pub thread_count: usize,
    pub raw_extensions: Vec<String>,
    pub overwrite: bool,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            mz_tolerance_ppm: 10.0,
            minimum_isotopic_percentage: 5.0,
            retention_time_window: 2.0,
            minimum_scan_count: 5,
            minimum_correlation: 0.8,
            profile_length: 4,
            thread_count: 0,
            raw_extensions: vec!["mzML".to_string()],
            overwrite: true,
        }
    }
}

fn invalid(field: &'static str, msg: impl Into<String>) -> ChroProfileError {
    ChroProfileError::InvalidSettings {
        field,
        msg: msg.into(),
    }
}

impl ExtractionSettings {
    pub fn validate(&self) -> Result<()> {
        if !(self.mz_tolerance_ppm.is_finite() && self.mz_tolerance_ppm > 0.0) {
            return Err(invalid(
                "mz_tolerance_ppm",
                format!("expected a positive value, got {}", self.mz_tolerance_ppm),
            ));
        }
        if !(0.0..100.0).contains(&self.minimum_isotopic_percentage) {
            return Err(invalid(
                "minimum_isotopic_percentage",
                format!(
                    "expected a value in [0, 100), got {}",
                    self.minimum_isotopic_percentage
                ),
            ));
        }
        if !(self.retention_time_window.is_finite() && self.retention_time_window >= 0.0) {
            return Err(invalid(
                "retention_time_window",
                format!(
                    "expected a non-negative value, got {}",
                    self.retention_time_window
                ),
            ));
        }
        if self.minimum_scan_count == 0 {
            return Err(invalid("minimum_scan_count", "must be at least 1"));
        }
        if !(-1.0..=1.0).contains(&self.minimum_correlation) {
            return Err(invalid(
                "minimum_correlation",
                format!(
                    "expected a value in [-1, 1], got {}",
                    self.minimum_correlation
                ),
            ));
        }
        // A correlation needs at least two points.
        if self.profile_length < 2 {
            return Err(invalid("profile_length", "must be at least 2"));
        }
        if self.raw_extensions.is_empty() {
            return Err(invalid("raw_extensions", "at least one extension is needed"));
        }
        Ok(())
    }

    /// Number of workers for `file_count` raw files.
    pub fn effective_thread_count(&self, file_count: usize) -> usize {
        let configured = if self.thread_count == 0 {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        } else {
            self.thread_count
        };
        configured.min(file_count).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(ExtractionSettings::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings: ExtractionSettings =
            serde_json::from_str(r#"{"mz_tolerance_ppm": 20.0, "thread_count": 3}"#).unwrap();
        assert_eq!(settings.mz_tolerance_ppm, 20.0);
        assert_eq!(settings.thread_count, 3);
        assert_eq!(settings.profile_length, 4);
    }

    #[test]
    fn test_invalid_settings_are_rejected() {
        let mut settings = ExtractionSettings::default();
        settings.profile_length = 1;
        assert!(matches!(
            settings.validate(),
            Err(ChroProfileError::InvalidSettings {
                field: "profile_length",
                ..
            })
        ));

        let mut settings = ExtractionSettings::default();
        settings.minimum_scan_count = 0;
        assert!(settings.validate().is_err());

        let mut settings = ExtractionSettings::default();
        settings.mz_tolerance_ppm = f64::NAN;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_thread_count_is_bounded_by_files() {
        let mut settings = ExtractionSettings::default();
        settings.thread_count = 8;
        assert_eq!(settings.effective_thread_count(3), 3);
        assert_eq!(settings.effective_thread_count(20), 8);
        assert_eq!(settings.effective_thread_count(0), 1);

        settings.thread_count = 0;
        assert!(settings.effective_thread_count(1) == 1);
    }
}
