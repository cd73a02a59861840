//! Pattern library for entity detection

use crate::deidentification::models::EntityCategory;
use anyhow::{Context, Result};
use regex::Regex;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Name of the capture group that marks the identifying part of a match
pub const ENTITY_GROUP: &str = "entity";

/// Pattern definition from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct PatternDefinition {
    /// Regex patterns for this category
    pub patterns: Vec<String>,
    /// Confidence score (0.0 - 1.0)
    pub confidence: f32,
    /// Entity category label
    pub category: String,
}

/// Compiled pattern with metadata
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    /// Library entry this pattern came from
    pub name: String,
    /// Compiled regex
    pub regex: Regex,
    /// Entity category
    pub category: EntityCategory,
    /// Confidence score
    pub confidence: f32,
    /// Whether the regex defines an `entity` capture group
    pub has_entity_group: bool,
}

/// Pattern library container
///
/// A `BTreeMap` keeps pattern order stable across runs.
#[derive(Debug, Deserialize)]
struct PatternLibrary {
    patterns: BTreeMap<String, PatternDefinition>,
}

/// Pattern registry for entity detection
pub struct PatternRegistry {
    patterns: Vec<CompiledPattern>,
    patterns_by_category: HashMap<EntityCategory, Vec<CompiledPattern>>,
}

impl PatternRegistry {
    /// Create a new pattern registry from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).with_context(|| {
            format!(
                "Failed to read pattern library: {}",
                path.as_ref().display()
            )
        })?;

        Self::from_toml(&content)
    }

    /// Create a pattern registry from TOML content
    pub fn from_toml(content: &str) -> Result<Self> {
        let library: PatternLibrary =
            toml::from_str(content).context("Failed to parse pattern library TOML")?;

        let mut patterns = Vec::new();
        let mut patterns_by_category: HashMap<EntityCategory, Vec<CompiledPattern>> =
            HashMap::new();

        for (name, def) in library.patterns {
            let category: EntityCategory = def
                .category
                .parse()
                .map_err(anyhow::Error::msg)
                .with_context(|| {
                    format!("Invalid category in pattern '{}': {}", name, def.category)
                })?;

            if !(0.0..=1.0).contains(&def.confidence) {
                anyhow::bail!(
                    "Confidence for pattern '{}' must be between 0.0 and 1.0, got {}",
                    name,
                    def.confidence
                );
            }

            for pattern_str in &def.patterns {
                let regex = Regex::new(pattern_str)
                    .with_context(|| format!("Invalid regex in pattern '{name}': {pattern_str}"))?;
                let has_entity_group = regex
                    .capture_names()
                    .any(|group| group == Some(ENTITY_GROUP));

                let compiled = CompiledPattern {
                    name: name.clone(),
                    regex,
                    category,
                    confidence: def.confidence,
                    has_entity_group,
                };

                patterns.push(compiled.clone());
                patterns_by_category
                    .entry(category)
                    .or_default()
                    .push(compiled);
            }
        }

        Ok(Self {
            patterns,
            patterns_by_category,
        })
    }

    /// Create a registry with the built-in clinical note patterns
    pub fn default_patterns() -> Result<Self> {
        let default_toml = include_str!("../../../../patterns/entity_patterns.toml");
        Self::from_toml(default_toml)
    }

    /// Get all patterns
    pub fn all_patterns(&self) -> &[CompiledPattern] {
        &self.patterns
    }

    /// Get patterns for a specific category
    pub fn patterns_for_category(&self, category: EntityCategory) -> Option<&[CompiledPattern]> {
        self.patterns_by_category
            .get(&category)
            .map(|v| v.as_slice())
    }

    /// Total number of compiled patterns
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Whether the registry has no patterns
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_patterns_load() {
        let registry = PatternRegistry::default_patterns().unwrap();
        assert!(!registry.is_empty());
        for category in EntityCategory::default_allow_list() {
            assert!(
                registry.patterns_for_category(category).is_some(),
                "missing built-in patterns for {category}"
            );
        }
    }

    #[test]
    fn test_entity_group_detection() {
        let toml = r#"
[patterns.titled_name]
category = "PERSON"
confidence = 0.9
patterns = ['Dr\.\s+(?P<entity>[A-Z][a-z]+)', '[A-Z][a-z]+ [A-Z][a-z]+']
"#;
        let registry = PatternRegistry::from_toml(toml).unwrap();
        let patterns = registry.all_patterns();
        assert_eq!(patterns.len(), 2);
        assert!(patterns[0].has_entity_group);
        assert!(!patterns[1].has_entity_group);
    }

    #[test]
    fn test_invalid_category_rejected() {
        let toml = r#"
[patterns.bad]
category = "STARSHIP"
confidence = 0.9
patterns = ['x']
"#;
        let err = PatternRegistry::from_toml(toml).err().unwrap();
        assert!(format!("{err:#}").contains("Invalid category"));
    }

    #[test]
    fn test_invalid_regex_rejected() {
        let toml = r#"
[patterns.bad]
category = "DATE"
confidence = 0.9
patterns = ['(unclosed']
"#;
        assert!(PatternRegistry::from_toml(toml).is_err());
    }

    #[test]
    fn test_out_of_range_confidence_rejected() {
        let toml = r#"
[patterns.bad]
category = "DATE"
confidence = 1.5
patterns = ['\d{4}']
"#;
        assert!(PatternRegistry::from_toml(toml).is_err());
    }
}
