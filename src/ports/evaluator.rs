//! Evaluator port: Trait for risk-evaluation strategies.
//!
//! This trait abstracts the scoring strategy (in-process heuristic or remote
//! endpoint) from the application logic.

use crate::domain::{ClinicalObservation, Evaluation, Strategy};

/// Trait for risk evaluation.
///
/// Implementations must not keep per-request state: one evaluator is shared
/// across submissions and every call is independent.
pub trait RiskEvaluator: Send + Sync {
    /// Error type for evaluation failures.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Which strategy this evaluator implements.
    fn strategy(&self) -> Strategy;

    /// Evaluate a validated observation.
    ///
    /// # Errors
    /// Returns error if the evaluation could not be produced (remote failures).
    fn evaluate(&self, observation: &ClinicalObservation) -> Result<Evaluation, Self::Error>;
}
