//! Domain layer: Core screening types and validation.
//!
//! Pure Rust types with no I/O. Categorical codes are decoded here, so the
//! rest of the crate only ever sees typed values.

mod assessment;
mod observation;

pub use assessment::{
    AssessmentReport, Evaluation, RemotePrediction, RiskAssessment, RiskFactor, RiskTier, Strategy,
};
pub use observation::{
    ranges, Category, ChestPain, ClinicalObservation, Coding, Field, FieldError, ObservationInput,
    RestingEcg, Sex, StSlope, Thalassemia,
};
