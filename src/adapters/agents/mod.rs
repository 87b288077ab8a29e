//! Agent Adapters.
//!
//! Implementations of the SpecialistAgent and ValidationAgent ports.
//!
//! ## Available Adapters
//!
//! - `LlmSpecialist` - Routed specialist (risk/liability, temporal/renewal, IP/commercial)
//! - `ZeroShotBaseline`, `ChainOfThoughtBaseline`, `CombinedPromptsBaseline` - Unrouted baselines
//! - `GroundingValidator` - Verbatim grounding check with optional model re-check
//! - `PromptLibrary` - YAML prompt templates with built-in specialist defaults

mod baselines;
mod grounding_validator;
mod invoker;
mod llm_specialist;
mod prompt_library;

pub use baselines::{
    ChainOfThoughtBaseline, CombinedPromptsBaseline, ZeroShotBaseline, BASELINE_CONFIDENCE,
    COMBINED_PROMPT, CONTRACTEVAL_PROMPT, COT_PROMPT,
};
pub use grounding_validator::GroundingValidator;
pub use llm_specialist::LlmSpecialist;
pub use prompt_library::PromptLibrary;
