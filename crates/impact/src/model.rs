use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::PracticeKey;
use crate::config::DuplicatePolicy;

/// Category used when neither the classifier nor the catalog declares one.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Weight applied when the classifier leaves a practice unweighted.
pub const FULL_WEIGHT: f64 = 100.0;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// A purchase as delivered by the transaction feed. Never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub date: NaiveDate,
    pub merchant_name: String,
    pub amount: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    Unethical,
    Ethical,
}

impl Polarity {
    /// +1 for harm, -1 for benefit.
    pub fn sign(self) -> f64 {
        match self {
            Self::Unethical => 1.0,
            Self::Ethical => -1.0,
        }
    }
}

impl std::fmt::Display for Polarity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unethical => write!(f, "unethical"),
            Self::Ethical => write!(f, "ethical"),
        }
    }
}

/// What the user can do about a practice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Remediation {
    /// Charity that works against an unethical practice.
    Charity { name: String, url: String },
    /// Affirming note for an ethical practice.
    Affirmation { note: String },
}

/// One practice the classifier attached to a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PracticeAssignment {
    pub practice: PracticeKey,
    pub polarity: Polarity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remediation: Option<Remediation>,
}

impl PracticeAssignment {
    pub fn new(practice: impl Into<PracticeKey>, polarity: Polarity, weight_percent: Option<f64>) -> Self {
        Self {
            practice: practice.into(),
            polarity,
            weight_percent,
            category: None,
            description: String::new(),
            remediation: None,
        }
    }

    pub fn unethical(practice: impl Into<PracticeKey>, weight_percent: f64) -> Self {
        Self::new(practice, Polarity::Unethical, Some(weight_percent))
    }

    pub fn ethical(practice: impl Into<PracticeKey>, weight_percent: f64) -> Self {
        Self::new(practice, Polarity::Ethical, Some(weight_percent))
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_remediation(mut self, remediation: Remediation) -> Self {
        self.remediation = Some(remediation);
        self
    }
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// A transaction with its assignments and the debt derived from them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredTransaction {
    pub transaction: Transaction,
    pub assignments: Vec<PracticeAssignment>,
    pub practice_debts: BTreeMap<PracticeKey, f64>,
    pub societal_debt: f64,
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PracticeTotal {
    pub amount: f64,
    pub polarity: Polarity,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remediation: Option<Remediation>,
    pub transaction_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryPractice {
    pub practice: PracticeKey,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryGroup {
    pub category: String,
    pub total_impact: f64,
    pub practices: Vec<CategoryPractice>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    pub total_societal_debt: f64,
    pub total_spent: f64,
    pub debt_percentage: f64,
    /// Sum of unethical contributions (≥ 0).
    pub gross_harm: f64,
    /// Magnitude of ethical contributions (≥ 0); the usual ceiling for credits.
    pub available_credit: f64,
    pub transaction_count: usize,
    pub per_practice: BTreeMap<PracticeKey, PracticeTotal>,
    pub per_category: Vec<CategoryGroup>,
}

// ---------------------------------------------------------------------------
// Credit
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditLedgerEntry {
    /// Position in the scope's log, starting at 1.
    pub seq: u64,
    pub scope: String,
    pub applied_amount: f64,
    pub timestamp: DateTime<Utc>,
    pub resulting_debt: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreditApplication {
    pub new_total_societal_debt: f64,
    pub ledger_entry: CreditLedgerEntry,
}

// ---------------------------------------------------------------------------
// Data quality
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QualityIssue {
    MissingWeight,
    WeightOutOfRange { weight: f64 },
    MissingCategory,
    DuplicatePractice,
    ContradictoryPolarity,
    NegativeAmount { amount: f64 },
    Unclassified,
}

impl QualityIssue {
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingWeight => "missing_weight",
            Self::WeightOutOfRange { .. } => "weight_out_of_range",
            Self::MissingCategory => "missing_category",
            Self::DuplicatePractice => "duplicate_practice",
            Self::ContradictoryPolarity => "contradictory_polarity",
            Self::NegativeAmount { .. } => "negative_amount",
            Self::Unclassified => "unclassified",
        }
    }
}

impl std::fmt::Display for QualityIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingWeight => write!(f, "no weight, full attribution assumed"),
            Self::WeightOutOfRange { weight } => write!(f, "weight {weight} clamped to [0, 100]"),
            Self::MissingCategory => write!(f, "no category, filed under {UNCATEGORIZED}"),
            Self::DuplicatePractice => write!(f, "practice listed more than once"),
            Self::ContradictoryPolarity => write!(f, "practice listed as both ethical and unethical"),
            Self::NegativeAmount { amount } => write!(f, "negative amount {amount} treated as 0"),
            Self::Unclassified => write!(f, "no classification received"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataQualityWarning {
    pub transaction_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub practice: Option<PracticeKey>,
    pub issue: QualityIssue,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualitySummary {
    pub counts: BTreeMap<String, usize>,
    pub warnings: Vec<DataQualityWarning>,
}

// ---------------------------------------------------------------------------
// Derived datasets
// ---------------------------------------------------------------------------

/// A flat table computed on top of scored transactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedDataset {
    pub name: String,
    pub limit: usize,
    pub truncated: bool,
    pub rows: Vec<serde_json::Value>,
}

impl DerivedDataset {
    pub fn new(name: &str, limit: usize) -> Self {
        Self {
            name: name.to_string(),
            limit,
            truncated: false,
            rows: Vec::new(),
        }
    }

    /// Drop rows beyond `limit`, remembering that we did.
    pub fn enforce_limit(&mut self) {
        if self.rows.len() > self.limit {
            self.rows.truncate(self.limit);
            self.truncated = true;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedOutputs {
    pub merchant_rollup: DerivedDataset,
    pub monthly_rollup: DerivedDataset,
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactMeta {
    pub config_name: String,
    pub engine_version: String,
    pub run_at: String,
    pub duplicate_labels: DuplicatePolicy,
}

/// Everything one scoring run produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactReport {
    pub meta: ImpactMeta,
    pub aggregate: AggregateResult,
    pub quality: QualitySummary,
    pub derived: DerivedOutputs,
    pub transactions: Vec<ScoredTransaction>,
}
