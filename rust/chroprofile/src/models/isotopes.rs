//! Theoretical isotopic distributions for the correlation gate.
//!
//! Peptides are approximated with the averagine model: the isotope
//! abundances follow a Poisson distribution whose mean grows linearly with
//! the neutral mass.

use serde::{
    Deserialize,
    Serialize,
};

pub const PROTON_MASS: f64 = 1.007_276_466_88;
/// Mass difference between 13C and 12C.
pub const C13_SPACING: f64 = 1.003_354_835;

const AVERAGINE_LAMBDA_SLOPE: f64 = 0.000594;
const AVERAGINE_LAMBDA_INTERCEPT: f64 = -0.03091;
const MIN_LAMBDA: f64 = 1e-3;

/// Expected relative intensities of an isotopic series at a given charge.
///
/// Intensities are normalized so the most abundant isotope is 1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsotopicReference {
    charge: u8,
    intensities: Vec<f64>,
}

impl IsotopicReference {
    /// Averagine reference for a precursor m/z.
    ///
    /// At most `max_isotopes` isotopes are kept. Trailing isotopes below
    /// `minimum_percentage` of the base isotope are dropped, but the first two
    /// are always kept.
    ///
    /// ```
    /// use chroprofile::models::IsotopicReference;
    ///
    /// let reference = IsotopicReference::averagine(800.0, 2, 4, 5.0);
    /// assert_eq!(reference.len(), 4);
    /// assert_eq!(reference.charge(), 2);
    /// ```
    pub fn averagine(mz: f64, charge: u8, max_isotopes: usize, minimum_percentage: f64) -> Self {
        let neutral_mass = (mz - PROTON_MASS) * charge.max(1) as f64;
        let lambda =
            (AVERAGINE_LAMBDA_SLOPE * neutral_mass + AVERAGINE_LAMBDA_INTERCEPT).max(MIN_LAMBDA);

        let mut weights = Vec::with_capacity(max_isotopes);
        let mut current = (-lambda).exp();
        for k in 0..max_isotopes {
            if k > 0 {
                current *= lambda / k as f64;
            }
            weights.push(current);
        }
        Self::from_intensities(charge, weights, minimum_percentage)
    }

    pub fn from_intensities(charge: u8, intensities: Vec<f64>, minimum_percentage: f64) -> Self {
        let max = intensities.iter().cloned().fold(0.0, f64::max);
        let mut intensities: Vec<f64> = if max > 0.0 {
            intensities.into_iter().map(|x| x / max).collect()
        } else {
            intensities
        };

        let cutoff = minimum_percentage / 100.0;
        while intensities.len() > 2 && intensities.last().is_some_and(|&x| x < cutoff) {
            intensities.pop();
        }

        Self {
            charge,
            intensities,
        }
    }

    pub fn charge(&self) -> u8 {
        self.charge
    }

    pub fn intensities(&self) -> &[f64] {
        &self.intensities
    }

    pub fn len(&self) -> usize {
        self.intensities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intensities.is_empty()
    }
}
