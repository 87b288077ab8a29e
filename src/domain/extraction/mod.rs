//! Extraction Domain Module
//!
//! Pure domain logic for routing clause categories to specialists and for
//! the per-request pipeline state. No provider or network knowledge.
//!
//! # Architecture
//!
//! - **Categories**: the fixed 41-category partition and `SpecialistId`
//! - **CategoryRouter**: read-only category → specialist table
//! - **GraphState**: per-request state merged from stage updates
//! - **Grounding**: whitespace-insensitive verbatim checks
//! - **ResponseParser / PromptTemplate**: helpers shared by LLM-backed agents
//!
//! # Example
//!
//! ```ignore
//! use extraction::{CategoryRouter, SpecialistId};
//!
//! let router = CategoryRouter::standard();
//! assert_eq!(router.route("Governing Law")?, SpecialistId::TemporalRenewal);
//! ```

pub mod categories;
pub mod errors;
pub mod grounding;
pub mod prompt;
pub mod response_parser;
pub mod result;
pub mod routing;
pub mod state;

pub use categories::*;
pub use errors::*;
pub use grounding::*;
pub use prompt::*;
pub use response_parser::*;
pub use result::*;
pub use routing::*;
pub use state::*;
