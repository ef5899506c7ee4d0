pub mod identification;
pub mod isotopes;
pub mod manifest;
pub mod peak;
pub mod profile;
pub mod settings;

pub use identification::IdentifiedPeptide;
pub use isotopes::IsotopicReference;
pub use manifest::ManifestRow;
pub use peak::Peak;
pub use profile::{
    ChromatographProfile,
    ProfileScan,
};
pub use settings::ExtractionSettings;
