//! Per-request pipeline state.
//!
//! A `GraphState` is created fresh for each request and threaded through the
//! pipeline stages. Stages never mutate it directly: each returns a
//! `StateUpdate` that `GraphState::apply` merges. `trace` is appended, every
//! other field is last-write-wins, and `error` keeps the first value set.

use serde::{Deserialize, Serialize};

use super::categories::SpecialistId;
use super::result::ExtractionResult;
use crate::domain::foundation::{RequestId, StateMachine};

/// A pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Route,
    Specialist(SpecialistId),
    /// Short-circuit after a routing failure.
    Error,
    Validate,
    Finalize,
}

impl PipelineStage {
    /// Node name as it appears in the trace.
    pub fn node_name(&self) -> &'static str {
        match self {
            PipelineStage::Route => "route",
            PipelineStage::Specialist(_) => "specialist",
            PipelineStage::Error => "error",
            PipelineStage::Validate => "validate",
            PipelineStage::Finalize => "finalize",
        }
    }
}

impl StateMachine for PipelineStage {
    fn can_transition_to(&self, target: &Self) -> bool {
        use PipelineStage::*;
        matches!(
            (self, target),
            (Route, Specialist(_))
                | (Route, Error)
                | (Specialist(_), Validate)
                | (Error, Finalize)
                | (Validate, Finalize)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use PipelineStage::*;
        match self {
            Route => {
                let mut targets: Vec<Self> =
                    SpecialistId::all().iter().map(|id| Specialist(*id)).collect();
                targets.push(Error);
                targets
            }
            Specialist(_) => vec![Validate],
            Error => vec![Finalize],
            Validate => vec![Finalize],
            Finalize => vec![],
        }
    }
}

/// One structured trace entry, serialized as `{"node": ..., ...fields}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum TraceEntry {
    Route {
        category: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        routed_to: Option<SpecialistId>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    Error {
        error: String,
    },
    Specialist {
        specialist: SpecialistId,
        #[serde(skip_serializing_if = "Option::is_none")]
        clauses_found: Option<usize>,
        #[serde(skip_serializing_if = "Option::is_none")]
        confidence: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    Validate {
        validated: bool,
        notes: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        grounding_rate: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    Finalize {
        validated: bool,
        has_error: bool,
    },
}

impl TraceEntry {
    /// Node name of this entry.
    pub fn node(&self) -> &'static str {
        match self {
            TraceEntry::Route { .. } => "route",
            TraceEntry::Error { .. } => "error",
            TraceEntry::Specialist { .. } => "specialist",
            TraceEntry::Validate { .. } => "validate",
            TraceEntry::Finalize { .. } => "finalize",
        }
    }

    /// Error recorded by this entry, if any.
    pub fn error(&self) -> Option<&str> {
        match self {
            TraceEntry::Route { error, .. }
            | TraceEntry::Specialist { error, .. }
            | TraceEntry::Validate { error, .. } => error.as_deref(),
            TraceEntry::Error { error } => Some(error),
            TraceEntry::Finalize { .. } => None,
        }
    }
}

/// Partial update returned by a pipeline stage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateUpdate {
    pub specialist: Option<SpecialistId>,
    pub extraction_result: Option<ExtractionResult>,
    pub validated: Option<bool>,
    pub validation_notes: Option<String>,
    pub final_result: Option<ExtractionResult>,
    pub trace: Vec<TraceEntry>,
    pub error: Option<String>,
}

impl StateUpdate {
    /// Update carrying a single trace entry.
    pub fn traced(entry: TraceEntry) -> Self {
        Self {
            trace: vec![entry],
            ..Default::default()
        }
    }

    /// Sets the routed specialist.
    pub fn with_specialist(mut self, specialist: SpecialistId) -> Self {
        self.specialist = Some(specialist);
        self
    }

    /// Sets the extraction result.
    pub fn with_extraction(mut self, result: ExtractionResult) -> Self {
        self.extraction_result = Some(result);
        self
    }

    /// Sets the validation outcome.
    pub fn with_validation(mut self, validated: bool, notes: impl Into<String>) -> Self {
        self.validated = Some(validated);
        self.validation_notes = Some(notes.into());
        self
    }

    /// Sets the final result.
    pub fn with_final(mut self, result: ExtractionResult) -> Self {
        self.final_result = Some(result);
        self
    }

    /// Sets the error.
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// Mutable record flowing through one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphState {
    request_id: RequestId,
    contract_text: String,
    category: String,
    question: String,
    specialist: Option<SpecialistId>,
    extraction_result: Option<ExtractionResult>,
    validated: bool,
    validation_notes: String,
    final_result: Option<ExtractionResult>,
    trace: Vec<TraceEntry>,
    error: Option<String>,
}

impl GraphState {
    /// Fresh state holding only the three inputs.
    pub fn new(
        contract_text: impl Into<String>,
        category: impl Into<String>,
        question: impl Into<String>,
    ) -> Self {
        Self {
            request_id: RequestId::new(),
            contract_text: contract_text.into(),
            category: category.into(),
            question: question.into(),
            specialist: None,
            extraction_result: None,
            validated: false,
            validation_notes: String::new(),
            final_result: None,
            trace: Vec::new(),
            error: None,
        }
    }

    /// Merge a stage's partial update.
    pub fn apply(&mut self, update: StateUpdate) {
        if let Some(specialist) = update.specialist {
            self.specialist = Some(specialist);
        }
        if let Some(result) = update.extraction_result {
            self.extraction_result = Some(result);
        }
        if let Some(validated) = update.validated {
            self.validated = validated;
        }
        if let Some(notes) = update.validation_notes {
            self.validation_notes = notes;
        }
        if let Some(result) = update.final_result {
            self.final_result = Some(result);
        }
        if self.error.is_none() {
            self.error = update.error;
        }
        self.trace.extend(update.trace);
    }

    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    pub fn contract_text(&self) -> &str {
        &self.contract_text
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    /// Specialist chosen by routing.
    pub fn specialist(&self) -> Option<SpecialistId> {
        self.specialist
    }

    /// Wire name of the routed specialist, empty before routing.
    pub fn specialist_name(&self) -> &'static str {
        self.specialist.map(|s| s.as_str()).unwrap_or("")
    }

    pub fn extraction_result(&self) -> Option<&ExtractionResult> {
        self.extraction_result.as_ref()
    }

    pub fn validated(&self) -> bool {
        self.validated
    }

    pub fn validation_notes(&self) -> &str {
        &self.validation_notes
    }

    pub fn final_result(&self) -> Option<&ExtractionResult> {
        self.final_result.as_ref()
    }

    /// Ordered execution trace.
    pub fn trace(&self) -> &[TraceEntry] {
        &self.trace
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    /// Collapse the state into the caller-facing result.
    ///
    /// Errors are reported in-band as an empty zero-confidence result.
    pub fn into_result(self) -> ExtractionResult {
        if let Some(error) = self.error {
            return ExtractionResult::empty(self.category, format!("Error: {}", error))
                .with_confidence(0.0);
        }
        match self.final_result {
            Some(result) => result,
            None => ExtractionResult::empty(self.category, "No result produced"),
        }
    }
}
