//! In-memory usage tracker implementation.
//!
//! Collects one `UsageRecord` per model call for the lifetime of a run and
//! aggregates them on demand. Records can be exported as JSON for offline
//! comparison of models and agents.

use async_trait::async_trait;
use serde::Serialize;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use crate::ports::{ModelUsage, UsageRecord, UsageSummary, UsageTracker, UsageTrackerError};

/// In-memory implementation of the UsageTracker port.
///
/// Thread-safe via internal `Mutex`. Does not persist data across restarts.
///
/// # Example
///
/// ```ignore
/// let tracker = Arc::new(InMemoryUsageTracker::with_run_id("exp_001"));
/// let specialist = LlmSpecialist::risk_liability(provider, template)
///     .with_usage_tracker(tracker.clone());
///
/// // ... run extractions ...
///
/// tracker.export_json("diagnostics/exp_001.json")?;
/// ```
#[derive(Default)]
pub struct InMemoryUsageTracker {
    run_id: String,
    records: Mutex<Vec<UsageRecord>>,
}

#[derive(Serialize)]
struct UsageExport<'a> {
    run_id: &'a str,
    summary: UsageSummary,
    calls: &'a [UsageRecord],
}

impl InMemoryUsageTracker {
    /// Creates a new empty usage tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a tracker labelled with a run identifier.
    pub fn with_run_id(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            records: Mutex::new(Vec::new()),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    fn lock(&self) -> MutexGuard<'_, Vec<UsageRecord>> {
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Returns all recorded usage records.
    pub fn records(&self) -> Vec<UsageRecord> {
        self.lock().clone()
    }

    /// Clears all recorded usage.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Returns the total number of records.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns true if no records exist.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Aggregates the recorded calls.
    pub fn summarize(&self) -> UsageSummary {
        summarize(&self.lock())
    }

    /// Writes the run id, summary and every call to `path` as pretty JSON.
    pub fn export_json(&self, path: impl AsRef<Path>) -> Result<(), UsageTrackerError> {
        let records = self.lock();
        let export = UsageExport {
            run_id: &self.run_id,
            summary: summarize(&records),
            calls: &records,
        };

        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(&export)?;
        std::fs::write(path.as_ref(), json)?;

        tracing::info!(path = %path.as_ref().display(), calls = records.len(), "exported usage diagnostics");
        Ok(())
    }
}

fn summarize(records: &[UsageRecord]) -> UsageSummary {
    let mut summary = UsageSummary::default();
    if records.is_empty() {
        return summary;
    }

    let mut latency_total = 0u64;
    let mut model_latency: std::collections::BTreeMap<String, (u64, u32)> = Default::default();

    for record in records {
        summary.total_calls += 1;
        summary.total_prompt_tokens += u64::from(record.prompt_tokens);
        summary.total_completion_tokens += u64::from(record.completion_tokens);
        summary.total_cost_cents += u64::from(record.cost_cents);
        *summary.by_agent.entry(record.agent_name.clone()).or_insert(0) += 1;

        let model = summary.by_model.entry(record.model.clone()).or_insert_with(ModelUsage::default);
        model.calls += 1;
        model.prompt_tokens += u64::from(record.prompt_tokens);
        model.completion_tokens += u64::from(record.completion_tokens);
        model.cost_cents += u64::from(record.cost_cents);

        if record.success {
            summary.successful_calls += 1;
            latency_total += record.latency_ms;
            let entry = model_latency.entry(record.model.clone()).or_insert((0, 0));
            entry.0 += record.latency_ms;
            entry.1 += 1;
        } else {
            summary.failed_calls += 1;
        }
    }

    summary.success_rate = f64::from(summary.successful_calls) / f64::from(summary.total_calls);
    if summary.successful_calls > 0 {
        summary.avg_latency_ms = latency_total as f64 / f64::from(summary.successful_calls);
    }
    for (model, (total, count)) in model_latency {
        if let Some(usage) = summary.by_model.get_mut(&model) {
            usage.avg_latency_ms = total as f64 / f64::from(count);
        }
    }

    summary
}

#[async_trait]
impl UsageTracker for InMemoryUsageTracker {
    async fn record_usage(&self, record: UsageRecord) -> Result<(), UsageTrackerError> {
        self.lock().push(record);
        Ok(())
    }

    async fn summary(&self) -> Result<UsageSummary, UsageTrackerError> {
        Ok(self.summarize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::TokenUsage;

    fn ok(agent: &str, model: &str, latency_ms: u64) -> UsageRecord {
        UsageRecord::success(agent, "Insurance", model, &TokenUsage::new(100, 50, 2), latency_ms)
    }

    #[tokio::test]
    async fn records_and_retrieves_usage() {
        let tracker = InMemoryUsageTracker::new();

        tracker.record_usage(ok("risk_liability", "claude", 100)).await.unwrap();

        assert_eq!(tracker.len(), 1);
        assert_eq!(tracker.records()[0].agent_name, "risk_liability");
    }

    #[tokio::test]
    async fn summary_of_empty_tracker_is_zero() {
        let tracker = InMemoryUsageTracker::new();

        let summary = tracker.summary().await.unwrap();

        assert_eq!(summary, UsageSummary::default());
    }

    #[tokio::test]
    async fn summary_aggregates_by_model_and_agent() {
        let tracker = InMemoryUsageTracker::new();
        tracker.record_usage(ok("risk_liability", "claude", 100)).await.unwrap();
        tracker.record_usage(ok("ip_commercial", "claude", 300)).await.unwrap();
        tracker.record_usage(ok("zero_shot", "gpt-4o", 50)).await.unwrap();
        tracker
            .record_usage(UsageRecord::failure("zero_shot", "Insurance", "gpt-4o", 999, "timeout"))
            .await
            .unwrap();

        let summary = tracker.summary().await.unwrap();

        assert_eq!(summary.total_calls, 4);
        assert_eq!(summary.successful_calls, 3);
        assert_eq!(summary.failed_calls, 1);
        assert_eq!(summary.success_rate, 0.75);
        assert_eq!(summary.total_prompt_tokens, 300);
        assert_eq!(summary.total_cost_cents, 6);
        assert_eq!(summary.avg_latency_ms, 150.0);
        assert_eq!(summary.by_model["claude"].calls, 2);
        assert_eq!(summary.by_model["claude"].avg_latency_ms, 200.0);
        assert_eq!(summary.by_model["gpt-4o"].avg_latency_ms, 50.0);
        assert_eq!(summary.by_agent["zero_shot"], 2);
    }

    #[tokio::test]
    async fn clear_removes_all_records() {
        let tracker = InMemoryUsageTracker::new();
        tracker.record_usage(ok("a", "m", 1)).await.unwrap();

        tracker.clear();

        assert!(tracker.is_empty());
    }

    #[tokio::test]
    async fn export_json_writes_summary_and_calls() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("diagnostics").join("run.json");
        let tracker = InMemoryUsageTracker::with_run_id("exp_001");
        tracker.record_usage(ok("risk_liability", "claude", 10)).await.unwrap();

        tracker.export_json(&path).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["run_id"], "exp_001");
        assert_eq!(json["summary"]["total_calls"], 1);
        assert_eq!(json["calls"][0]["agent_name"], "risk_liability");
    }
}
