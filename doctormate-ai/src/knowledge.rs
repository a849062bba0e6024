use std::{collections::HashMap, path::Path};

use anyhow::Context;
use serde::Deserialize;

use crate::models::Severity;

const BUNDLED_RULES: &str = include_str!("../assets/skin_rules.json");

/// Static description of one skin lesion class.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LesionInfo {
    pub name: String,
    pub severity: Severity,
    pub description: String,
    pub recommendations: Vec<String>,
    pub emergency_care: String,
    pub risk_factors: Vec<String>,
    pub symptoms: Vec<String>,
    pub prognosis: String,
    pub treatment_options: Vec<String>,
}

impl Default for LesionInfo {
    fn default() -> Self {
        Self {
            name: "Unknown".to_string(),
            severity: Severity::Mild,
            description: "No description available.".to_string(),
            recommendations: Vec::new(),
            emergency_care: "Consult a healthcare provider if concerned.".to_string(),
            risk_factors: Vec::new(),
            symptoms: Vec::new(),
            prognosis: "Please consult a dermatologist for proper assessment.".to_string(),
            treatment_options: Vec::new(),
        }
    }
}

/// Diagnosis code to [`LesionInfo`] table, loaded once and read-only afterwards.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    entries: HashMap<String, LesionInfo>,
}

impl KnowledgeBase {
    pub fn bundled() -> anyhow::Result<Self> {
        Self::from_json(BUNDLED_RULES).context("bundled skin rules are invalid")
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read skin rules from {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("invalid skin rules in {}", path.display()))
    }

    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        let entries: HashMap<String, LesionInfo> = serde_json::from_str(raw)?;
        Ok(Self { entries })
    }

    /// Unknown codes get the generic defaults rather than an error.
    pub fn lookup(&self, code: &str) -> LesionInfo {
        self.entries.get(code).cloned().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
