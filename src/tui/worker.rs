//! Background evaluation worker.
//!
//! Runs one evaluation off the UI thread so a slow prediction service never
//! freezes the event loop.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use crate::application::AssessmentService;
use crate::domain::{AssessmentReport, ClinicalObservation, Strategy};
use crate::ports::RiskEvaluator;
use crate::CardioriskError;

/// Progress updates from the evaluation worker.
#[derive(Debug, Clone)]
pub enum EvaluationProgress {
    /// Evaluation dispatched to the given strategy
    Started(Strategy),
    /// Evaluation finished
    Complete(AssessmentReport),
    /// Evaluation failed; the message is ready for display
    Error(String),
}

/// Handle to a running evaluation worker.
pub struct EvaluationWorkerHandle {
    /// Receiver for progress updates
    pub progress_rx: Receiver<EvaluationProgress>,
    _handle: JoinHandle<()>,
}

impl EvaluationWorkerHandle {
    /// Try to receive the next progress update (non-blocking).
    #[must_use]
    pub fn try_recv(&self) -> Option<EvaluationProgress> {
        self.progress_rx.try_recv().ok()
    }
}

pub struct EvaluationWorker;

impl EvaluationWorker {
    /// Spawn a background evaluation.
    ///
    /// Returns a handle to receive progress updates.
    pub fn spawn<E>(
        service: AssessmentService<E>,
        observation: ClinicalObservation,
    ) -> EvaluationWorkerHandle
    where
        E: RiskEvaluator + 'static,
        E::Error: Into<CardioriskError>,
    {
        let (tx, rx) = mpsc::channel();

        let handle = thread::spawn(move || {
            Self::run_with_progress(&service, &observation, &tx);
        });

        EvaluationWorkerHandle {
            progress_rx: rx,
            _handle: handle,
        }
    }

    fn run_with_progress<E>(
        service: &AssessmentService<E>,
        observation: &ClinicalObservation,
        tx: &Sender<EvaluationProgress>,
    ) where
        E: RiskEvaluator,
        E::Error: Into<CardioriskError>,
    {
        // The receiver may already be gone if the user quit; nothing to do then.
        let _ = tx.send(EvaluationProgress::Started(service.strategy()));

        let update = match service.assess(observation) {
            Ok(report) => EvaluationProgress::Complete(report),
            Err(e) => EvaluationProgress::Error(e.to_string()),
        };
        let _ = tx.send(update);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use crate::adapters::HeuristicScorer;
    use crate::domain::{ChestPain, Evaluation, RestingEcg, Sex, StSlope, Thalassemia};

    fn observation() -> ClinicalObservation {
        ClinicalObservation {
            age: 50,
            sex: Sex::Female,
            chest_pain: ChestPain::Asymptomatic,
            resting_bp: 120,
            cholesterol: 190,
            fasting_blood_sugar: false,
            resting_ecg: RestingEcg::Normal,
            max_heart_rate: 165,
            exercise_angina: false,
            st_depression: 0.0,
            st_slope: StSlope::Upsloping,
            vessels: 0,
            thalassemia: Thalassemia::Normal,
        }
    }

    #[test]
    fn test_worker_reports_start_then_result() {
        let service = AssessmentService::new(Arc::new(HeuristicScorer::new()));
        let handle = EvaluationWorker::spawn(service, observation());

        let first = handle
            .progress_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("Started update");
        assert!(matches!(first, EvaluationProgress::Started(Strategy::Local)));

        let second = handle
            .progress_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("Complete update");
        match second {
            EvaluationProgress::Complete(report) => {
                assert!(matches!(report.evaluation, Evaluation::Local(_)));
            }
            other => panic!("Expected completion, got {other:?}"),
        }
    }
}
