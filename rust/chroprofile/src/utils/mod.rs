pub mod correlation;
pub mod ppm;

pub use correlation::pearson_correlation;
pub use ppm::PpmWindow;
