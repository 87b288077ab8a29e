//! Parsing of raw model responses into extraction results.
//!
//! Handles JSON wrapped in markdown code blocks or surrounded by prose, and
//! the plain-text fallback used when a model ignores the requested format.

use serde::Deserialize;

use super::errors::ParseError;
use super::result::ExtractionResult;

/// Phrase models use to report that nothing relevant was found.
pub const NO_CLAUSE_SENTINEL: &str = "No related clause";

/// Confidence assigned to raw-text fallbacks.
pub const FALLBACK_CONFIDENCE: f64 = 0.5;

/// Shape of the JSON object specialists are asked to return.
#[derive(Debug, Deserialize)]
struct RawExtraction {
    #[serde(default)]
    extracted_clauses: Vec<String>,
    #[serde(default)]
    reasoning: String,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    category_indicators_found: Vec<String>,
}

/// Stateless parser for model responses.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseParser;

impl ResponseParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse a JSON extraction, falling back to the raw text on failure.
    ///
    /// The fallback treats the whole response as one clause unless it
    /// contains the "No related clause" sentinel, and lowers confidence.
    pub fn parse_or_fallback(&self, response: &str, category: &str) -> ExtractionResult {
        match self.parse_json(response, category) {
            Ok(result) => result,
            Err(err) => {
                tracing::debug!(category, error = %err, "falling back to raw response text");
                self.fallback(response, category)
            }
        }
    }

    /// Parse a JSON extraction object out of a response.
    ///
    /// # Errors
    ///
    /// `ParseError::NoJson` if no object is present, `ParseError::InvalidJson`
    /// if the object does not deserialize.
    pub fn parse_json(&self, response: &str, category: &str) -> Result<ExtractionResult, ParseError> {
        let json = self.extract_json(response).ok_or(ParseError::NoJson)?;
        let raw: RawExtraction =
            serde_json::from_str(&json).map_err(|e| ParseError::InvalidJson(e.to_string()))?;

        let clauses = raw
            .extracted_clauses
            .into_iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty() && !is_no_clause(c));

        Ok(ExtractionResult::new(category)
            .with_clauses(clauses)
            .with_reasoning(raw.reasoning)
            .with_confidence(raw.confidence.unwrap_or(0.0))
            .with_indicators(raw.category_indicators_found))
    }

    /// Raw-text fallback for unparseable responses.
    pub fn fallback(&self, response: &str, category: &str) -> ExtractionResult {
        let clauses = if response.contains(NO_CLAUSE_SENTINEL) || response.trim().is_empty() {
            Vec::new()
        } else {
            vec![response.trim().to_string()]
        };

        ExtractionResult::new(category)
            .with_clauses(clauses)
            .with_reasoning("Failed to parse JSON response")
            .with_confidence(FALLBACK_CONFIDENCE)
    }

    /// Parse a plain-text answer: blank-line separated clauses or the sentinel.
    pub fn parse_plain(&self, response: &str, category: &str, confidence: f64) -> ExtractionResult {
        if is_no_clause(response) {
            return ExtractionResult::new(category)
                .with_reasoning("Model found no relevant clauses")
                .with_confidence(1.0);
        }

        let clauses = response
            .split("\n\n")
            .map(str::trim)
            .filter(|c| !c.is_empty());

        ExtractionResult::new(category)
            .with_clauses(clauses)
            .with_confidence(confidence)
    }

    /// Extracts a JSON object from a response that may contain markdown code blocks.
    pub fn extract_json(&self, response: &str) -> Option<String> {
        let trimmed = response.trim();

        if let Some(json) = self.extract_from_code_block(trimmed) {
            if json.starts_with('{') {
                return Some(json);
            }
        }

        let start = trimmed.find('{')?;
        self.extract_balanced_object(trimmed, start)
    }

    fn extract_from_code_block(&self, s: &str) -> Option<String> {
        let patterns = ["```json\n", "```json\r\n", "```\n", "```\r\n"];

        for pattern in patterns {
            if let Some(start) = s.find(pattern) {
                let json_start = start + pattern.len();
                if let Some(end) = s[json_start..].find("```") {
                    return Some(s[json_start..json_start + end].trim().to_string());
                }
            }
        }
        None
    }

    fn extract_balanced_object(&self, s: &str, start: usize) -> Option<String> {
        let mut depth = 0usize;
        let mut in_string = false;
        let mut escape_next = false;

        for (offset, c) in s[start..].char_indices() {
            if escape_next {
                escape_next = false;
                continue;
            }

            match c {
                '\\' if in_string => escape_next = true,
                '"' => in_string = !in_string,
                _ if in_string => {}
                '{' => depth += 1,
                '}' => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        let end = start + offset + c.len_utf8();
                        return Some(s[start..end].to_string());
                    }
                }
                _ => {}
            }
        }
        None
    }
}

/// True for the bare "No related clause" answer (any case, optional period).
pub fn is_no_clause(text: &str) -> bool {
    let normalized = text.trim().trim_end_matches('.').to_lowercase();
    normalized == NO_CLAUSE_SENTINEL.to_lowercase()
}
