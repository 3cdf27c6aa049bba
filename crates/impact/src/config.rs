use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::{PracticeCatalog, PracticeMeta};
use crate::error::ImpactError;
use crate::model::Remediation;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ImpactConfig {
    pub name: String,
    #[serde(default)]
    pub scoring: ScoringConfig,
    /// Catalog rows keyed by practice label, used when the classifier
    /// omits a category or remediation.
    #[serde(default)]
    pub practices: BTreeMap<String, PracticeEntry>,
    #[serde(default)]
    pub derived: DerivedConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Default for ImpactConfig {
    fn default() -> Self {
        Self {
            name: "default".into(),
            scoring: ScoringConfig::default(),
            practices: BTreeMap::new(),
            derived: DerivedConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoringConfig {
    #[serde(default)]
    pub duplicate_labels: DuplicatePolicy,
}

/// What to do when one transaction lists the same practice twice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// The later occurrence replaces the earlier one.
    #[default]
    LastWins,
    /// Contributions are added together.
    Sum,
}

impl std::fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LastWins => write!(f, "last_wins"),
            Self::Sum => write!(f, "sum"),
        }
    }
}

// ---------------------------------------------------------------------------
// Practice catalog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct PracticeEntry {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub charity: Option<CharityRef>,
    #[serde(default)]
    pub affirmation: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CharityRef {
    pub name: String,
    pub url: String,
}

impl PracticeEntry {
    fn to_meta(&self) -> PracticeMeta {
        let remediation = match (&self.charity, &self.affirmation) {
            (Some(c), _) => Some(Remediation::Charity {
                name: c.name.clone(),
                url: c.url.clone(),
            }),
            (None, Some(note)) => Some(Remediation::Affirmation { note: note.clone() }),
            (None, None) => None,
        };
        PracticeMeta {
            category: self.category.clone(),
            remediation,
        }
    }
}

// ---------------------------------------------------------------------------
// Derived + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct DerivedConfig {
    #[serde(default = "default_merchant_limit")]
    pub merchant_limit: usize,
    #[serde(default = "default_monthly_limit")]
    pub monthly_limit: usize,
}

fn default_merchant_limit() -> usize {
    50
}

fn default_monthly_limit() -> usize {
    120
}

impl Default for DerivedConfig {
    fn default() -> Self {
        Self {
            merchant_limit: default_merchant_limit(),
            monthly_limit: default_monthly_limit(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub json: Option<String>,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ImpactConfig {
    pub fn from_toml(input: &str) -> Result<Self, ImpactError> {
        let config: ImpactConfig =
            toml::from_str(input).map_err(|e| ImpactError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ImpactError> {
        if self.name.trim().is_empty() {
            return Err(ImpactError::ConfigValidation("name must not be empty".into()));
        }

        if self.derived.merchant_limit == 0 || self.derived.monthly_limit == 0 {
            return Err(ImpactError::ConfigValidation(
                "derived dataset limits must be at least 1".into(),
            ));
        }

        for (label, entry) in &self.practices {
            if label.is_empty() {
                return Err(ImpactError::ConfigValidation(
                    "practice label must not be empty".into(),
                ));
            }
            if let Some(ref category) = entry.category {
                if category.trim().is_empty() {
                    return Err(ImpactError::ConfigValidation(format!(
                        "practice '{label}': category must not be empty"
                    )));
                }
            }
            if entry.charity.is_some() && entry.affirmation.is_some() {
                return Err(ImpactError::ConfigValidation(format!(
                    "practice '{label}': set either charity or affirmation, not both"
                )));
            }
        }

        Ok(())
    }

    /// Build the practice catalog seeded from `[practices]`.
    pub fn catalog(&self) -> PracticeCatalog {
        let mut catalog = PracticeCatalog::new();
        for (label, entry) in &self.practices {
            catalog.record(label, entry.to_meta());
        }
        catalog
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
