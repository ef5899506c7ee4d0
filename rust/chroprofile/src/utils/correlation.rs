/// Pearson correlation between two series.
///
/// Only the common prefix of both slices is used. Returns NaN when fewer
/// than two points are available or when either series has no variance,
/// so callers must not treat the result as a plain number without checking.
///
/// # Example
///
/// ```
/// use chroprofile::utils::correlation::pearson_correlation;
///
/// let a = vec![1.0, 2.0, 3.0];
/// let b = vec![2.0, 4.0, 6.5];
/// let result = pearson_correlation(&a, &b);
/// assert!(result > 0.99);
/// ```
pub fn pearson_correlation(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len());
    if n < 2 {
        return f64::NAN;
    }
    let a = &a[..n];
    let b = &b[..n];

    let mean_a = a.iter().sum::<f64>() / n as f64;
    let mean_b = b.iter().sum::<f64>() / n as f64;

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (&x, &y) in a.iter().zip(b.iter()) {
        let dx = x - mean_a;
        let dy = y - mean_b;
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }

    if var_a == 0.0 || var_b == 0.0 {
        return f64::NAN;
    }
    cov / (var_a.sqrt() * var_b.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_correlations() {
        let a = [1.0, 0.5, 0.25];
        let scaled: Vec<f64> = a.iter().map(|x| x * 1000.0).collect();
        assert!((pearson_correlation(&a, &scaled) - 1.0).abs() < 1e-12);

        let inverted: Vec<f64> = a.iter().map(|x| -x).collect();
        assert!((pearson_correlation(&a, &inverted) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_inputs_are_nan() {
        assert!(pearson_correlation(&[1.0], &[1.0]).is_nan());
        assert!(pearson_correlation(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]).is_nan());
        assert!(pearson_correlation(&[], &[]).is_nan());
    }

    #[test]
    fn test_uses_common_prefix() {
        let a = [1.0, 2.0, 3.0, 100.0];
        let b = [1.0, 2.0, 3.0];
        assert!((pearson_correlation(&a, &b) - 1.0).abs() < 1e-12);
    }
}
