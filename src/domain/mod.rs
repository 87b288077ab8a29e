//! Domain layer containing extraction logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, state machines)
//! - `extraction` - Category routing, pipeline state, grounding, and response parsing
pub mod extraction;
pub mod foundation;
