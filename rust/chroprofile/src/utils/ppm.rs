/// Closed m/z interval around a target, in parts-per-million of the target.
///
/// ```
/// use chroprofile::utils::PpmWindow;
///
/// // For 500 Da at 20 ppm: +/- 0.01 Da
/// let window = PpmWindow::new(500.0, 20.0);
/// assert!((window.start() - 499.99).abs() < 1e-9);
/// assert!((window.end() - 500.01).abs() < 1e-9);
/// assert!(window.contains(500.005));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PpmWindow {
    start: f64,
    end: f64,
}

impl PpmWindow {
    pub fn new(mz: f64, ppm: f64) -> Self {
        let delta = mz * ppm.abs() / 1e6;
        Self {
            start: mz - delta,
            end: mz + delta,
        }
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn contains(&self, mz: f64) -> bool {
        self.start <= mz && mz <= self.end
    }
}
