//! Application layer - pipeline orchestration and batch execution.
//!
//! Coordinates domain state with the agent ports. Nothing here knows about
//! concrete providers.

mod batch;
mod orchestrator;

pub use batch::{BatchOutcome, BatchRunner, ExtractionRequest};
pub use orchestrator::{get_trace, Orchestrator, OrchestratorBuildError, RequestOptions};
