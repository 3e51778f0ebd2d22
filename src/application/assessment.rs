//! Assessment service: validates input and runs one evaluation.

use std::sync::Arc;

use crate::domain::{
    AssessmentReport, ClinicalObservation, Coding, Evaluation, ObservationInput, Strategy,
};
use crate::ports::RiskEvaluator;
use crate::CardioriskError;

/// Service for running a risk evaluation through an evaluator port.
///
/// Holds no per-request state, so one instance can be shared across threads.
pub struct AssessmentService<E>
where
    E: RiskEvaluator,
{
    evaluator: Arc<E>,
}

impl<E> Clone for AssessmentService<E>
where
    E: RiskEvaluator,
{
    fn clone(&self) -> Self {
        Self {
            evaluator: Arc::clone(&self.evaluator),
        }
    }
}

impl<E> AssessmentService<E>
where
    E: RiskEvaluator,
    E::Error: Into<CardioriskError>,
{
    /// Create a new assessment service.
    pub fn new(evaluator: Arc<E>) -> Self {
        Self { evaluator }
    }

    #[must_use]
    pub fn strategy(&self) -> Strategy {
        self.evaluator.strategy()
    }

    /// Evaluate a validated observation.
    ///
    /// # Errors
    /// Returns error if the evaluator fails (remote strategy only).
    pub fn assess(&self, observation: &ClinicalObservation) -> Result<AssessmentReport, CardioriskError> {
        let strategy = self.evaluator.strategy();
        tracing::debug!("Evaluating observation with {} strategy", strategy);

        let evaluation = self.evaluator.evaluate(observation).map_err(|e| {
            let err: CardioriskError = e.into();
            tracing::warn!("{} evaluation failed: {}", strategy, err);
            err
        })?;

        match &evaluation {
            Evaluation::Local(a) => tracing::info!(
                "Assessment complete: strategy=local, tier={}, score={}, factors={}",
                a.tier,
                a.score,
                a.factors.len()
            ),
            Evaluation::Remote(r) => tracing::info!(
                "Assessment complete: strategy=remote, prediction={}, confidence={}",
                r.prediction,
                r.confidence
                    .map(|c| format!("{:.2}%", c * 100.0))
                    .unwrap_or_else(|| "n/a".to_string())
            ),
        }

        Ok(AssessmentReport::new(evaluation))
    }

    /// Validate raw input decoded with `coding`, then evaluate it.
    ///
    /// # Errors
    /// Returns `CardioriskError::Validation` with one entry per invalid field,
    /// or the evaluator's error.
    pub fn assess_input(
        &self,
        input: &ObservationInput,
        coding: Coding,
    ) -> Result<AssessmentReport, CardioriskError> {
        let observation = ClinicalObservation::from_input(input, coding).map_err(|errors| {
            tracing::debug!("Observation rejected: {} invalid field(s)", errors.len());
            CardioriskError::Validation(errors)
        })?;
        self.assess(&observation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::heuristic::HeuristicScorer;
    use crate::adapters::RemoteError;
    use crate::domain::{Field, RiskTier};

    /// Evaluator that always fails the way an unreachable service would.
    struct Unreachable;

    impl RiskEvaluator for Unreachable {
        type Error = RemoteError;

        fn strategy(&self) -> Strategy {
            Strategy::Remote
        }

        fn evaluate(&self, _observation: &ClinicalObservation) -> Result<Evaluation, Self::Error> {
            Err(RemoteError::Rejected {
                status: 503,
                message: "service unavailable".to_string(),
            })
        }
    }

    fn sample_input() -> ObservationInput {
        ObservationInput {
            age: 58.0,
            sex: 1.0,
            cp: 2.0,
            trestbps: 140.0,
            chol: 211.0,
            fbs: 1.0,
            restecg: 0.0,
            thalach: 165.0,
            exang: 0.0,
            oldpeak: 0.0,
            slope: 1.0,
            ca: 0.0,
            thal: 3.0,
        }
    }

    #[test]
    fn test_local_assessment_pipeline() {
        let service = AssessmentService::new(Arc::new(HeuristicScorer::new()));
        let report = service
            .assess_input(&sample_input(), Coding::Cleveland)
            .expect("Should assess");

        // age + sex + cp + trestbps + chol + fbs; heart rate is above 85% of predicted
        match report.evaluation {
            Evaluation::Local(a) => {
                assert_eq!(a.raw_score, 63);
                assert_eq!(a.score, 32);
                assert_eq!(a.tier, RiskTier::Moderate);
                assert!(!a.prediction);
            }
            Evaluation::Remote(_) => panic!("Expected local evaluation"),
        }
        assert_eq!(service.strategy(), Strategy::Local);
    }

    #[test]
    fn test_invalid_input_never_reaches_evaluator() {
        let service = AssessmentService::new(Arc::new(Unreachable));
        let mut input = sample_input();
        input.age = 150.0;

        let err = service
            .assess_input(&input, Coding::Cleveland)
            .expect_err("Should reject");
        match err {
            CardioriskError::Validation(errors) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].field, Field::Age);
            }
            other => panic!("Expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_remote_failure_is_surfaced() {
        let service = AssessmentService::new(Arc::new(Unreachable));
        let err = service
            .assess_input(&sample_input(), Coding::Cleveland)
            .expect_err("Should fail");
        assert!(matches!(err, CardioriskError::Remote(RemoteError::Rejected { status: 503, .. })));
        assert_eq!(err.to_string(), "service unavailable");
    }

    #[test]
    fn test_coding_changes_interpretation() {
        let service = AssessmentService::new(Arc::new(HeuristicScorer::new()));

        // cp=2 is atypical angina in Cleveland coding but non-anginal when zero-based.
        let mut input = sample_input();
        input.slope = 0.0;
        input.thal = 0.0;
        let report = service
            .assess_input(&input, Coding::ZeroBased)
            .expect("Should assess");
        match report.evaluation {
            Evaluation::Local(a) => assert_eq!(a.raw_score, 58),
            Evaluation::Remote(_) => panic!("Expected local evaluation"),
        }

        let err = service
            .assess_input(&sample_input(), Coding::ZeroBased)
            .expect_err("thal=3 is not a zero-based code");
        assert!(matches!(err, CardioriskError::Validation(ref e) if e[0].field == Field::Thalassemia));
    }
}
