//! Single-agent baselines.
//!
//! Baselines are used directly as `SpecialistAgent`s and bypass routing.
//! They exist to measure what the multi-agent pipeline adds over a single
//! well-prompted model.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::extraction::{
    all_categories, AgentConfig, ExtractionResult, PromptTemplate, ResponseParser, SpecialistId,
};
use crate::ports::{AIProvider, AgentError, SpecialistAgent, UsageTracker};

use super::invoker::ModelInvoker;

/// Confidence assigned to plain-text baseline answers.
pub const BASELINE_CONFIDENCE: f64 = 0.8;

/// ContractEval extraction instructions, reproduced verbatim.
pub const CONTRACTEVAL_PROMPT: &str = "You are an assistant with strong legal knowledge, supporting senior lawyers by preparing reference materials. Given a Context and a Question, extract and return only the sentence(s) from the Context that directly address or relate to the Question. Do not rephrase or summarize in any way—respond with exact sentences from the Context relevant to the Question. If a relevant sentence contains unrelated elements such as page numbers or whitespace, include them exactly as they appear. If no part of the Context is relevant to the Question, respond with: \"No related clause.\"\n";

const ZERO_SHOT_INPUT: &str = "Context:\n{contract_text}\n\nQuestion:\n{question}";

pub const COT_PROMPT: &str = r#"You are an assistant with strong legal knowledge, supporting senior lawyers by preparing reference materials.

Given a Context and a Question, you will extract relevant clauses using step-by-step reasoning.

IMPORTANT: If you are uncertain whether a clause is relevant, INCLUDE IT.
It is better to extract a potentially relevant clause than to miss one.
Only respond "No related clause" if you have thoroughly searched and found nothing.

Follow these steps:
1. First, identify the key concepts in the Question
2. Scan the Context for sentences containing these concepts
3. For each potential match, evaluate if it directly addresses the Question
4. Extract the exact text of relevant sentences (do not rephrase)
5. Provide your final answer after the line "Final Answer:"

Context:
{contract_text}

Question:
{question}

Let's think step by step:
"#;

pub const COMBINED_PROMPT: &str = r#"You are an expert legal analyst with deep expertise in:
1. Risk and Liability clauses (caps, insurance, warranties, indemnification)
2. Temporal and Renewal provisions (dates, terms, termination, assignment)
3. IP and Commercial terms (licensing, ownership, restrictions, competition)

Your task is to extract clauses related to: {category}

DOMAIN-SPECIFIC GUIDANCE:

FOR RISK & LIABILITY CATEGORIES:
Look for: liability caps, uncapped liability, liquidated damages, insurance requirements,
warranty periods, audit rights, indemnification, most favored nation clauses.

FOR TEMPORAL & RENEWAL CATEGORIES:
Look for: agreement dates, effective dates, expiration, renewal terms, notice periods,
termination rights, assignment restrictions, governing law provisions.

FOR IP & COMMERCIAL CATEGORIES:
Look for: IP ownership, license grants, exclusivity, non-compete provisions,
solicitation restrictions, revenue sharing, price/volume restrictions.

IMPORTANT: If you are uncertain whether a clause is relevant, INCLUDE IT.
It is better to extract a potentially relevant clause than to miss one.
Only respond "No related clause" if you have thoroughly searched and found nothing.

Given the following contract text, extract all relevant clauses exactly as they appear.

CONTRACT TEXT:
{contract_text}

QUESTION: {question}

Respond with a JSON object containing:
- extracted_clauses: list of exact text excerpts from the contract
- reasoning: step-by-step explanation of your extraction logic
- confidence: float between 0 and 1
- category_indicators_found: list of specific terms/patterns found
"#;

const FINAL_ANSWER_MARKER: &str = "final answer:";

fn render(
    template: &PromptTemplate,
    contract_text: &str,
    category: &str,
    question: &str,
) -> Result<(String, String), AgentError> {
    let vars = HashMap::from([
        ("category", category),
        ("contract_text", contract_text),
        ("question", question),
    ]);
    let prompt = template.format(&vars)?;
    Ok((prompt.system, prompt.user))
}

// ============================================================================
// Zero-shot
// ============================================================================

/// ContractEval zero-shot replication.
pub struct ZeroShotBaseline {
    config: AgentConfig,
    template: PromptTemplate,
    invoker: ModelInvoker,
    parser: ResponseParser,
}

impl ZeroShotBaseline {
    pub fn new(provider: Arc<dyn AIProvider>) -> Self {
        Self {
            config: AgentConfig::new("zero_shot_baseline"),
            template: PromptTemplate::new("zero_shot", CONTRACTEVAL_PROMPT, ZERO_SHOT_INPUT)
                .with_variables(["contract_text", "question"]),
            invoker: ModelInvoker::new(provider),
            parser: ResponseParser::new(),
        }
    }

    pub fn with_config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_usage_tracker(mut self, tracker: Arc<dyn UsageTracker>) -> Self {
        self.invoker = self.invoker.with_usage_tracker(tracker);
        self
    }

    /// "No related clause." → confident empty result; otherwise one clause
    /// per blank-line separated paragraph.
    pub fn parse_response(&self, response: &str, category: &str) -> ExtractionResult {
        let result = self.parser.parse_plain(response, category, BASELINE_CONFIDENCE);
        if result.is_empty() {
            result
        } else {
            result.with_reasoning("Zero-shot extraction")
        }
    }
}

#[async_trait]
impl SpecialistAgent for ZeroShotBaseline {
    async fn extract(
        &self,
        contract_text: &str,
        category: &str,
        question: &str,
    ) -> Result<ExtractionResult, AgentError> {
        let (system, user) = render(&self.template, contract_text, category, question)?;
        let response = self.invoker.invoke(&self.config, category, Some(&system), &user).await?;
        Ok(self.parse_response(&response, category))
    }

    fn config(&self) -> &AgentConfig {
        &self.config
    }
}

// ============================================================================
// Chain of thought
// ============================================================================

/// Step-by-step reasoning baseline.
pub struct ChainOfThoughtBaseline {
    config: AgentConfig,
    template: PromptTemplate,
    invoker: ModelInvoker,
    parser: ResponseParser,
}

impl ChainOfThoughtBaseline {
    pub fn new(provider: Arc<dyn AIProvider>) -> Self {
        Self {
            config: AgentConfig::new("cot_baseline"),
            template: PromptTemplate::new("chain_of_thought", "", COT_PROMPT)
                .with_variables(["contract_text", "question"]),
            invoker: ModelInvoker::new(provider),
            parser: ResponseParser::new(),
        }
    }

    pub fn with_config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_usage_tracker(mut self, tracker: Arc<dyn UsageTracker>) -> Self {
        self.invoker = self.invoker.with_usage_tracker(tracker);
        self
    }

    /// Split reasoning from the answer at the last "Final Answer:" marker
    /// (any case), then parse the answer with the zero-shot rules.
    pub fn parse_response(&self, response: &str, category: &str) -> ExtractionResult {
        let lowered = response.to_ascii_lowercase();
        let (reasoning, answer) = match lowered.rfind(FINAL_ANSWER_MARKER) {
            Some(idx) => (
                response[..idx].trim(),
                response[idx + FINAL_ANSWER_MARKER.len()..].trim(),
            ),
            None => ("", response.trim()),
        };

        let result = self.parser.parse_plain(answer, category, BASELINE_CONFIDENCE);
        if !reasoning.is_empty() {
            result.with_reasoning(reasoning)
        } else if result.is_empty() {
            result
        } else {
            result.with_reasoning("Chain-of-thought extraction")
        }
    }
}

#[async_trait]
impl SpecialistAgent for ChainOfThoughtBaseline {
    async fn extract(
        &self,
        contract_text: &str,
        category: &str,
        question: &str,
    ) -> Result<ExtractionResult, AgentError> {
        let (_, user) = render(&self.template, contract_text, category, question)?;
        let response = self.invoker.invoke(&self.config, category, None, &user).await?;
        Ok(self.parse_response(&response, category))
    }

    fn config(&self) -> &AgentConfig {
        &self.config
    }
}

// ============================================================================
// Combined prompts
// ============================================================================

/// Single agent carrying all three specialists' guidance.
///
/// Separates the effect of specialised prompting from that of routing.
pub struct CombinedPromptsBaseline {
    config: AgentConfig,
    template: PromptTemplate,
    invoker: ModelInvoker,
    parser: ResponseParser,
}

impl CombinedPromptsBaseline {
    pub fn new(provider: Arc<dyn AIProvider>) -> Self {
        Self {
            config: AgentConfig::new("combined_prompts").with_categories(all_categories()),
            template: PromptTemplate::new("combined_prompts", "", COMBINED_PROMPT)
                .with_variables(["category", "contract_text", "question"]),
            invoker: ModelInvoker::new(provider),
            parser: ResponseParser::new(),
        }
    }

    pub fn with_usage_tracker(mut self, tracker: Arc<dyn UsageTracker>) -> Self {
        self.invoker = self.invoker.with_usage_tracker(tracker);
        self
    }

    /// Domain a category belongs to, or "unknown".
    pub fn domain_for_category(&self, category: &str) -> &'static str {
        SpecialistId::all()
            .iter()
            .find(|specialist| specialist.categories().contains(&category))
            .map_or("unknown", SpecialistId::as_str)
    }
}

#[async_trait]
impl SpecialistAgent for CombinedPromptsBaseline {
    async fn extract(
        &self,
        contract_text: &str,
        category: &str,
        question: &str,
    ) -> Result<ExtractionResult, AgentError> {
        tracing::debug!(category, domain = self.domain_for_category(category), "combined prompt extraction");

        let (_, user) = render(&self.template, contract_text, category, question)?;
        let response = self.invoker.invoke(&self.config, category, None, &user).await?;
        Ok(self.parser.parse_or_fallback(&response, category))
    }

    fn config(&self) -> &AgentConfig {
        &self.config
    }
}
