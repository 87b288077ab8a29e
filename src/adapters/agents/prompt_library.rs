//! Prompt library backed by YAML definitions.
//!
//! Ships the three specialist prompts compiled into the binary and can load
//! additional or replacement templates from YAML strings, files or a
//! directory.

use std::collections::HashMap;
use std::path::Path;

use crate::domain::extraction::{PromptError, PromptTemplate, SpecialistId};

const RISK_LIABILITY_YAML: &str = include_str!("../../../prompts/risk_liability.yaml");
const TEMPORAL_RENEWAL_YAML: &str = include_str!("../../../prompts/temporal_renewal.yaml");
const IP_COMMERCIAL_YAML: &str = include_str!("../../../prompts/ip_commercial.yaml");

/// Named collection of prompt templates.
#[derive(Debug, Clone, Default)]
pub struct PromptLibrary {
    templates: HashMap<String, PromptTemplate>,
}

impl PromptLibrary {
    /// Creates an empty library.
    pub fn new() -> Self {
        Self::default()
    }

    /// Library preloaded with the built-in specialist prompts.
    pub fn with_defaults() -> Result<Self, PromptError> {
        let mut library = Self::new();
        for yaml in [RISK_LIABILITY_YAML, TEMPORAL_RENEWAL_YAML, IP_COMMERCIAL_YAML] {
            library.load_str(yaml)?;
        }
        Ok(library)
    }

    /// Parse a YAML template and register it, replacing any with the same name.
    pub fn load_str(&mut self, yaml: &str) -> Result<&PromptTemplate, PromptError> {
        let template: PromptTemplate = serde_yaml::from_str(yaml)
            .map_err(|e| PromptError::InvalidDefinition(e.to_string()))?;
        if template.name.trim().is_empty() {
            return Err(PromptError::InvalidDefinition("template has no name".to_string()));
        }
        Ok(self.register(template))
    }

    /// Load a single YAML file.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<&PromptTemplate, PromptError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| PromptError::InvalidDefinition(format!("{}: {}", path.display(), e)))?;
        self.load_str(&yaml)
    }

    /// Load every `*.yaml` / `*.yml` file in a directory.
    ///
    /// Returns the number of templates loaded. A missing directory loads nothing.
    pub fn load_dir(&mut self, dir: impl AsRef<Path>) -> Result<usize, PromptError> {
        let dir = dir.as_ref();
        if !dir.exists() {
            return Ok(0);
        }

        let entries = std::fs::read_dir(dir)
            .map_err(|e| PromptError::InvalidDefinition(format!("{}: {}", dir.display(), e)))?;

        let mut paths: Vec<_> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                matches!(
                    path.extension().and_then(|ext| ext.to_str()),
                    Some("yaml") | Some("yml")
                )
            })
            .collect();
        paths.sort();

        for path in &paths {
            let name = self.load_file(path)?.name.clone();
            tracing::debug!(prompt = %name, path = %path.display(), "loaded prompt template");
        }
        Ok(paths.len())
    }

    /// Register a template directly.
    pub fn register(&mut self, template: PromptTemplate) -> &PromptTemplate {
        let name = template.name.clone();
        self.templates.insert(name.clone(), template);
        &self.templates[&name]
    }

    /// Look up a template by name.
    pub fn get(&self, name: &str) -> Result<&PromptTemplate, PromptError> {
        self.templates
            .get(name)
            .ok_or_else(|| PromptError::NotFound(name.to_string()))
    }

    /// Template for a routed specialist.
    pub fn for_specialist(&self, specialist: SpecialistId) -> Result<&PromptTemplate, PromptError> {
        self.get(specialist.as_str())
    }

    /// Registered template names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.templates.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
