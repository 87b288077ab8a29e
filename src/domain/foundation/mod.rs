//! Foundation module - Shared domain primitives.
//!
//! Identifiers, timestamps and the state machine trait used by the
//! extraction pipeline.

mod ids;
mod state_machine;
mod timestamp;

pub use ids::RequestId;
pub use state_machine::{StateMachine, TransitionError};
pub use timestamp::Timestamp;
