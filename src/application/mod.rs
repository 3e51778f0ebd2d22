//! Application layer: Use cases and services.
//!
//! Orchestrates domain validation with an evaluator port.

mod assessment;

pub use assessment::AssessmentService;
