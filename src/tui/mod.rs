//! TUI module: Terminal User Interface using Ratatui.
//!
//! Provides a clinical-themed interface for:
//! - Entering the thirteen observation fields
//! - Choosing between local scoring and the remote predictor
//! - Reviewing the assessment

mod app;
mod styles;
mod ui;
mod worker;

pub use app::App;
pub use styles::ClinicalTheme;
pub use worker::{EvaluationProgress, EvaluationWorker, EvaluationWorkerHandle};
