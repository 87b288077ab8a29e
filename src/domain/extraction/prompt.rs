//! Prompt templates with `{variable}` interpolation and per-category indicators.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use super::errors::PromptError;

/// Rendered `(system, user)` prompt pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPrompt {
    pub system: String,
    pub user: String,
}

/// A prompt template with metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptTemplate {
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub system: String,
    #[serde(default)]
    pub user: String,
    /// Variables that must be supplied to `format`.
    #[serde(default)]
    pub variables: Vec<String>,
    /// Indicator phrases keyed by category name.
    #[serde(default)]
    pub category_indicators: BTreeMap<String, Vec<String>>,
}

fn default_version() -> String {
    "1.0".to_string()
}

impl PromptTemplate {
    /// Creates a template with no declared variables or indicators.
    pub fn new(name: impl Into<String>, system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: default_version(),
            description: String::new(),
            system: system.into(),
            user: user.into(),
            variables: Vec::new(),
            category_indicators: BTreeMap::new(),
        }
    }

    /// Declares required variables.
    pub fn with_variables<I, S>(mut self, variables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.variables = variables.into_iter().map(Into::into).collect();
        self
    }

    /// Adds indicator phrases for a category.
    pub fn with_indicators<I, S>(mut self, category: impl Into<String>, indicators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.category_indicators
            .insert(category.into(), indicators.into_iter().map(Into::into).collect());
        self
    }

    /// Render both prompts, substituting `{name}` placeholders.
    ///
    /// # Errors
    ///
    /// Returns `PromptError::MissingVariable` for the first declared variable
    /// that was not supplied.
    pub fn format(&self, vars: &HashMap<&str, &str>) -> Result<RenderedPrompt, PromptError> {
        if let Some(missing) = self.variables.iter().find(|v| !vars.contains_key(v.as_str())) {
            return Err(PromptError::MissingVariable(missing.clone()));
        }

        Ok(RenderedPrompt {
            system: interpolate(&self.system, vars),
            user: interpolate(&self.user, vars),
        })
    }

    /// Indicators for a category, empty when none are defined.
    pub fn indicators(&self, category: &str) -> &[String] {
        self.category_indicators
            .get(category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Indicators as a bullet list for prompt inclusion.
    pub fn format_indicators(&self, category: &str) -> String {
        let indicators = self.indicators(category);
        if indicators.is_empty() {
            return "No specific indicators defined.".to_string();
        }
        indicators
            .iter()
            .map(|i| format!("- {}", i))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Single left-to-right pass, so substituted values are never re-scanned.
/// Braces that do not name a supplied variable are kept as written.
fn interpolate(template: &str, vars: &HashMap<&str, &str>) -> String {
    let mut rendered = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        rendered.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after
            .find('}')
            .and_then(|close| vars.get(&after[..close]).map(|value| (close, value)));

        match value {
            Some((close, value)) => {
                rendered.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                rendered.push('{');
                rest = after;
            }
        }
    }
    rendered.push_str(rest);
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template() -> PromptTemplate {
        PromptTemplate::new(
            "risk_liability",
            "You extract {category} clauses.",
            "Indicators:\n{indicators}\n\nContract:\n{contract_text}\n\nQuestion: {question}",
        )
        .with_variables(["category", "indicators", "contract_text", "question"])
        .with_indicators("Cap on Liability", ["shall not exceed", "aggregate liability"])
    }

    #[test]
    fn format_substitutes_all_variables() {
        let vars = HashMap::from([
            ("category", "Cap on Liability"),
            ("indicators", "- cap"),
            ("contract_text", "TEXT"),
            ("question", "Is there a cap?"),
        ]);

        let rendered = template().format(&vars).unwrap();

        assert_eq!(rendered.system, "You extract Cap on Liability clauses.");
        assert!(rendered.user.contains("Contract:\nTEXT"));
        assert!(rendered.user.ends_with("Question: Is there a cap?"));
    }

    #[test]
    fn format_rejects_missing_variable() {
        let vars = HashMap::from([("category", "Cap on Liability")]);

        let err = template().format(&vars).unwrap_err();

        assert_eq!(err, PromptError::MissingVariable("indicators".to_string()));
    }

    #[test]
    fn substituted_values_are_not_rescanned() {
        let template = PromptTemplate::new("t", "", "{contract_text} | {question} | {\"json\": 1}");
        let vars = HashMap::from([("contract_text", "see {question}"), ("question", "Q")]);

        let rendered = template.format(&vars).unwrap();

        assert_eq!(rendered.user, "see {question} | Q | {\"json\": 1}");
    }

    #[test]
    fn indicators_are_looked_up_by_category() {
        let template = template();
        assert_eq!(template.indicators("Cap on Liability").len(), 2);
        assert!(template.indicators("Insurance").is_empty());
    }

    #[test]
    fn format_indicators_bullets_or_placeholder() {
        let template = template();
        assert_eq!(
            template.format_indicators("Cap on Liability"),
            "- shall not exceed\n- aggregate liability"
        );
        assert_eq!(template.format_indicators("Insurance"), "No specific indicators defined.");
    }

    #[test]
    fn template_deserializes_with_defaults() {
        let yaml = "name: zero_shot\nuser: \"{question}\"\n";
        let template: PromptTemplate = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(template.version, "1.0");
        assert!(template.system.is_empty());
        assert!(template.category_indicators.is_empty());
    }
}
