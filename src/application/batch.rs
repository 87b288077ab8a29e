//! Batch execution of many extraction requests against one orchestrator.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracing::{debug, info};

use super::orchestrator::{Orchestrator, RequestOptions};
use crate::domain::extraction::{ExtractionResult, TraceEntry};

/// One sample to extract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionRequest {
    /// Caller-chosen identifier echoed back in the outcome.
    #[serde(default)]
    pub id: String,
    pub contract_text: String,
    pub category: String,
    #[serde(default)]
    pub question: String,
}

impl ExtractionRequest {
    pub fn new(
        contract_text: impl Into<String>,
        category: impl Into<String>,
        question: impl Into<String>,
    ) -> Self {
        Self {
            id: String::new(),
            contract_text: contract_text.into(),
            category: category.into(),
            question: question.into(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }
}

/// Result and trace for one sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub id: String,
    pub result: ExtractionResult,
    pub trace: Vec<TraceEntry>,
    /// Request-level error set by routing or the specialist stage.
    #[serde(default)]
    pub error: Option<String>,
    pub latency_ms: u64,
}

impl BatchOutcome {
    /// True when the pipeline set a request error. A failed validation
    /// still yields a usable result and does not count.
    pub fn failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Runs requests concurrently up to a fixed limit.
pub struct BatchRunner {
    orchestrator: Arc<Orchestrator>,
    max_concurrency: usize,
    request_timeout: Option<Duration>,
}

impl BatchRunner {
    /// `max_concurrency` is clamped to at least 1.
    pub fn new(orchestrator: Arc<Orchestrator>, max_concurrency: usize) -> Self {
        Self {
            orchestrator,
            max_concurrency: max_concurrency.max(1),
            request_timeout: None,
        }
    }

    /// Per-request deadline, measured from when the request acquires a slot.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Runs every request. Outcomes are returned in input order; a failed
    /// sample never aborts the batch.
    pub async fn run(&self, requests: Vec<ExtractionRequest>) -> Vec<BatchOutcome> {
        let total = requests.len();
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let started = Instant::now();

        info!(total, max_concurrency = self.max_concurrency, "batch started");

        let futures = requests.into_iter().enumerate().map(|(index, request)| {
            let semaphore = Arc::clone(&semaphore);
            async move {
                // The semaphore is never closed.
                let _permit = semaphore.acquire_owned().await.ok();
                self.run_one(index, request).await
            }
        });
        let outcomes = join_all(futures).await;

        let failed = outcomes.iter().filter(|o| o.failed()).count();
        info!(
            total,
            failed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "batch completed"
        );
        outcomes
    }

    async fn run_one(&self, index: usize, request: ExtractionRequest) -> BatchOutcome {
        let options = match self.request_timeout {
            Some(timeout) => RequestOptions::with_timeout(timeout),
            None => RequestOptions::default(),
        };
        let started = Instant::now();

        let state = self
            .orchestrator
            .run(
                &request.contract_text,
                &request.category,
                &request.question,
                options,
            )
            .await;

        let latency_ms = started.elapsed().as_millis() as u64;
        debug!(index, id = %request.id, latency_ms, "sample finished");

        let trace = state.trace().to_vec();
        let error = state.error().map(str::to_string);
        BatchOutcome {
            id: request.id,
            result: state.into_result(),
            trace,
            error,
            latency_ms,
        }
    }
}
