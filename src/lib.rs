//! # Cardiorisk
//!
//! Heart-disease risk screening over the thirteen UCI Cleveland features.
//!
//! This crate provides:
//! - A deterministic local heuristic scorer (band model, four risk tiers)
//! - A client for a remote prediction endpoint
//! - Terminal UI for entering an observation and reviewing the result
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core types (ClinicalObservation, RiskAssessment, codings)
//! - `ports`: Trait definitions for evaluation strategies
//! - `adapters`: Concrete implementations (heuristic scorer, HTTP client, log sanitizer)
//! - `application`: Use cases orchestrating validation and evaluation
//! - `config`: Environment-driven settings
//! - `tui`: Terminal user interface

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod tui;

pub use domain::{ClinicalObservation, Evaluation, RiskAssessment, RiskTier};

/// Result type for Cardiorisk operations
pub type Result<T> = std::result::Result<T, CardioriskError>;

/// Main error type for Cardiorisk
#[derive(Debug, thiserror::Error)]
pub enum CardioriskError {
    #[error("Invalid observation: {}", format_field_errors(.0))]
    Validation(Vec<domain::FieldError>),

    #[error(transparent)]
    Remote(#[from] adapters::RemoteError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<std::convert::Infallible> for CardioriskError {
    fn from(never: std::convert::Infallible) -> Self {
        match never {}
    }
}

fn format_field_errors(errors: &[domain::FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
