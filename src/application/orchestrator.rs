//! Orchestrator - runs one request through the extraction pipeline.
//!
//! The pipeline is a fixed state machine:
//!
//! ```text
//! Route ──► Specialist(id) ──► Validate ──► Finalize
//!   │                                          ▲
//!   └──────────► Error ────────────────────────┘
//! ```
//!
//! Every stage reads the current `GraphState` and returns a `StateUpdate`.
//! Failures are recorded in the state and never escape `run`/`extract`.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use thiserror::Error;
use tokio::time::Instant;

use crate::domain::extraction::{
    CategoryRouter, ExtractionResult, GraphState, PipelineStage, SpecialistId, StateUpdate,
    TraceEntry,
};
use crate::domain::foundation::StateMachine;
use crate::ports::{AgentError, SpecialistAgent, ValidationAgent};

/// Construction-time misconfiguration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrchestratorBuildError {
    #[error("No specialist registered for routing target: {0}")]
    MissingSpecialist(SpecialistId),
}

/// Per-request options.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestOptions {
    /// Applies to the specialist and validator calls. Expiry counts as a
    /// failure of the stage that was running.
    pub deadline: Option<Instant>,
}

impl RequestOptions {
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
        }
    }

    /// Deadline `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }
}

/// Routes a request to its specialist, validates the extraction and
/// collapses the state into a result.
pub struct Orchestrator {
    router: Arc<CategoryRouter>,
    specialists: HashMap<SpecialistId, Arc<dyn SpecialistAgent>>,
    validator: Option<Arc<dyn ValidationAgent>>,
}

impl Orchestrator {
    /// Creates an orchestrator without a validator.
    ///
    /// Routing targets without a registered specialist are reported per
    /// request. Use [`Orchestrator::strict`] to reject them up front.
    pub fn new(
        router: Arc<CategoryRouter>,
        specialists: HashMap<SpecialistId, Arc<dyn SpecialistAgent>>,
    ) -> Self {
        Self {
            router,
            specialists,
            validator: None,
        }
    }

    /// Like [`Orchestrator::new`], but every routing target must have a
    /// registered specialist.
    ///
    /// # Errors
    ///
    /// Returns `OrchestratorBuildError::MissingSpecialist` for the first
    /// target without one.
    pub fn strict(
        router: Arc<CategoryRouter>,
        specialists: HashMap<SpecialistId, Arc<dyn SpecialistAgent>>,
    ) -> Result<Self, OrchestratorBuildError> {
        if let Some(missing) = router
            .targets()
            .into_iter()
            .find(|target| !specialists.contains_key(target))
        {
            return Err(OrchestratorBuildError::MissingSpecialist(missing));
        }
        Ok(Self::new(router, specialists))
    }

    pub fn with_validator(mut self, validator: Arc<dyn ValidationAgent>) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn router(&self) -> &CategoryRouter {
        &self.router
    }

    pub fn specialist(&self, id: SpecialistId) -> Option<&Arc<dyn SpecialistAgent>> {
        self.specialists.get(&id)
    }

    pub fn has_validator(&self) -> bool {
        self.validator.is_some()
    }

    /// Extract clauses for `category`. Never fails; errors are reported
    /// in the result's reasoning with zero confidence.
    pub async fn extract(
        &self,
        contract_text: &str,
        category: &str,
        question: &str,
    ) -> ExtractionResult {
        self.extract_with(contract_text, category, question, RequestOptions::default())
            .await
    }

    pub async fn extract_with(
        &self,
        contract_text: &str,
        category: &str,
        question: &str,
        options: RequestOptions,
    ) -> ExtractionResult {
        self.run(contract_text, category, question, options)
            .await
            .into_result()
    }

    /// Run the pipeline and return the full final state.
    pub async fn run(
        &self,
        contract_text: &str,
        category: &str,
        question: &str,
        options: RequestOptions,
    ) -> GraphState {
        let mut state = GraphState::new(contract_text, category, question);
        let mut stage = PipelineStage::Route;

        tracing::debug!(
            request_id = %state.request_id(),
            category,
            "extraction started"
        );

        loop {
            let update = match stage {
                PipelineStage::Route => self.route(&state),
                PipelineStage::Error => error_stage(&state),
                PipelineStage::Specialist(id) => self.run_specialist(&state, id, &options).await,
                PipelineStage::Validate => self.validate(&state, &options).await,
                PipelineStage::Finalize => finalize(&state),
            };
            state.apply(update);

            let Some(next) = next_stage(stage, &state) else {
                break;
            };
            debug_assert!(stage.can_transition_to(&next), "{:?} -> {:?}", stage, next);
            tracing::debug!(
                request_id = %state.request_id(),
                from = stage.node_name(),
                to = next.node_name(),
                "stage transition"
            );
            stage = next;
        }

        let clauses = state.final_result().map_or(0, ExtractionResult::clause_count);
        tracing::info!(
            request_id = %state.request_id(),
            category = state.category(),
            specialist = state.specialist_name(),
            clauses,
            validated = state.validated(),
            has_error = state.has_error(),
            "extraction completed"
        );

        state
    }

    fn route(&self, state: &GraphState) -> StateUpdate {
        let category = state.category();
        match self.router.route(category) {
            Ok(specialist) => StateUpdate::traced(TraceEntry::Route {
                category: category.to_string(),
                routed_to: Some(specialist),
                error: None,
            })
            .with_specialist(specialist),
            Err(err) => {
                let message = err.to_string();
                tracing::warn!(request_id = %state.request_id(), category, "unknown category");
                StateUpdate::traced(TraceEntry::Route {
                    category: category.to_string(),
                    routed_to: None,
                    error: Some(message.clone()),
                })
                .with_error(message)
            }
        }
    }

    async fn run_specialist(
        &self,
        state: &GraphState,
        id: SpecialistId,
        options: &RequestOptions,
    ) -> StateUpdate {
        let Some(agent) = self.specialists.get(&id) else {
            let message = format!("Specialist not found: {}", id);
            tracing::warn!(request_id = %state.request_id(), specialist = %id, "specialist not registered");
            return StateUpdate::traced(TraceEntry::Specialist {
                specialist: id,
                clauses_found: None,
                confidence: None,
                error: Some(message.clone()),
            })
            .with_error(message);
        };

        let call = agent.extract(state.contract_text(), state.category(), state.question());
        match within_deadline(options.deadline, call).await {
            Ok(result) => {
                tracing::debug!(
                    request_id = %state.request_id(),
                    specialist = %id,
                    clauses = result.clause_count(),
                    confidence = result.confidence,
                    "specialist finished"
                );
                StateUpdate::traced(TraceEntry::Specialist {
                    specialist: id,
                    clauses_found: Some(result.clause_count()),
                    confidence: Some(result.confidence),
                    error: None,
                })
                .with_extraction(result)
            }
            Err(err) => {
                let message = format!("Extraction failed in {}: {}", agent.name(), err);
                tracing::warn!(
                    request_id = %state.request_id(),
                    specialist = %id,
                    error = %err,
                    "specialist failed"
                );
                StateUpdate::traced(TraceEntry::Specialist {
                    specialist: id,
                    clauses_found: None,
                    confidence: None,
                    error: Some(message.clone()),
                })
                .with_error(message)
            }
        }
    }

    async fn validate(&self, state: &GraphState, options: &RequestOptions) -> StateUpdate {
        let Some(extraction) = state.extraction_result() else {
            return validation_update(false, "No extraction result to validate", None, None);
        };

        let Some(validator) = &self.validator else {
            return validation_update(true, "Validation skipped (no validation agent)", None, None)
                .with_final(extraction.clone());
        };

        let call = validator.verify(extraction, state.contract_text(), state.category());
        match within_deadline(options.deadline, call).await {
            Ok(validated) => {
                tracing::debug!(
                    request_id = %state.request_id(),
                    validator = validator.name(),
                    clauses = validated.clause_count(),
                    grounding_rate = validated.grounding_rate,
                    "validation finished"
                );
                let notes = format!("Validated by {}", validator.name());
                let rate = validated.grounding_rate;
                validation_update(true, notes, rate, None).with_final(validated)
            }
            Err(err) => {
                tracing::warn!(
                    request_id = %state.request_id(),
                    validator = validator.name(),
                    error = %err,
                    "validation failed, keeping unvalidated extraction"
                );
                let notes = format!("Validation failed: {}", err);
                validation_update(false, notes, None, Some(err.to_string()))
                    .with_final(extraction.clone())
            }
        }
    }
}

/// Trace of a finished run.
pub fn get_trace(state: &GraphState) -> &[TraceEntry] {
    state.trace()
}

fn next_stage(current: PipelineStage, state: &GraphState) -> Option<PipelineStage> {
    match current {
        PipelineStage::Route => match (state.has_error(), state.specialist()) {
            (false, Some(id)) => Some(PipelineStage::Specialist(id)),
            _ => Some(PipelineStage::Error),
        },
        PipelineStage::Specialist(_) => Some(PipelineStage::Validate),
        PipelineStage::Error | PipelineStage::Validate => Some(PipelineStage::Finalize),
        PipelineStage::Finalize => None,
    }
}

fn error_stage(state: &GraphState) -> StateUpdate {
    StateUpdate::traced(TraceEntry::Error {
        error: state.error().unwrap_or_default().to_string(),
    })
}

fn finalize(state: &GraphState) -> StateUpdate {
    let mut update = StateUpdate::traced(TraceEntry::Finalize {
        validated: state.validated(),
        has_error: state.has_error(),
    });
    if state.final_result().is_none() {
        if let Some(extraction) = state.extraction_result() {
            update = update.with_final(extraction.clone());
        }
    }
    update
}

fn validation_update(
    validated: bool,
    notes: impl Into<String>,
    grounding_rate: Option<f64>,
    error: Option<String>,
) -> StateUpdate {
    let notes = notes.into();
    StateUpdate::traced(TraceEntry::Validate {
        validated,
        notes: notes.clone(),
        grounding_rate,
        error,
    })
    .with_validation(validated, notes)
}

/// Awaits an agent call, mapping deadline expiry and panics to `AgentError`.
async fn within_deadline<T, F>(deadline: Option<Instant>, call: F) -> Result<T, AgentError>
where
    F: Future<Output = Result<T, AgentError>>,
{
    let guarded = AssertUnwindSafe(call)
        .catch_unwind()
        .map(|outcome| outcome.unwrap_or_else(|payload| Err(panic_error(payload.as_ref()))));
    match deadline {
        Some(deadline) => tokio::time::timeout_at(deadline, guarded)
            .await
            .unwrap_or(Err(AgentError::DeadlineExceeded)),
        None => guarded.await,
    }
}

fn panic_error(payload: &(dyn Any + Send)) -> AgentError {
    let message = payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic");
    tracing::error!(panic = message, "agent panicked");
    AgentError::other(format!("agent panicked: {}", message))
}
