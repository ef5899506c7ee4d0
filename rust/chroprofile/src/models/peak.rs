use serde::{
    Deserialize,
    Serialize,
};

/// A centroided peak of an MS1 spectrum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Peak {
    pub mz: f64,
    pub intensity: f32,
}

impl Peak {
    pub fn new(mz: f64, intensity: f32) -> Self {
        Self { mz, intensity }
    }
}

/// Index of the first peak with `mz >= lower_mz`.
///
/// `peaks` must be sorted by m/z.
pub fn first_peak_at_or_above(peaks: &[Peak], lower_mz: f64) -> usize {
    peaks.partition_point(|p| p.mz < lower_mz)
}
