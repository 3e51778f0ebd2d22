//! Adapters layer: Concrete implementations of ports.
//!
//! - `heuristic`: in-process band scorer
//! - `remote`: blocking HTTP client for the prediction endpoint
//! - `sanitize`: redaction for log output

pub mod heuristic;
pub mod remote;
pub mod sanitize;

pub use heuristic::HeuristicScorer;
pub use remote::{HttpPredictor, RemoteError};
