pub mod analysis;
pub mod dataset;
pub mod feature;

pub use analysis::{AnalysisConfig, SiteCandidate};
pub use dataset::{m2_to_ha, CandidateParcel, ExclusionCategory, ExclusionZone, GridSegment};
pub use feature::{RawFeature, Tags};
