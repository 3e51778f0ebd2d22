//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundary between
//! the application and the evaluation strategies.

mod evaluator;

pub use evaluator::RiskEvaluator;
