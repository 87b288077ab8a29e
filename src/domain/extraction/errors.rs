//! Error types for the extraction domain

use super::categories::SpecialistId;

/// Category is not present in the routing table.
///
/// Caller input error; never retried.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("Unknown category: {0}")]
pub struct UnknownCategoryError(pub String);

/// Routing table construction errors
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum RoutingError {
    #[error("Category {category:?} claimed by both {first} and {second}")]
    DuplicateCategory {
        category: String,
        first: SpecialistId,
        second: SpecialistId,
    },

    #[error("Routing table is empty")]
    Empty,
}

/// Prompt rendering errors
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum PromptError {
    #[error("Missing required variable: {0}")]
    MissingVariable(String),

    #[error("Prompt not found: {0}")]
    NotFound(String),

    #[error("Invalid prompt definition: {0}")]
    InvalidDefinition(String),
}

/// Structured response parsing errors
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("No JSON object found in response")]
    NoJson,

    #[error("JSON parse error: {0}")]
    InvalidJson(String),
}
