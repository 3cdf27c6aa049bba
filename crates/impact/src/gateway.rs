//! Classification gateway seam.
//!
//! The classifier itself is an external service. The engine only sees its
//! answers, already materialized, through [`ClassificationGateway`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::catalog::PracticeCatalog;
use crate::error::ImpactError;
use crate::model::{PracticeAssignment, Polarity, Remediation, Transaction};

pub trait ClassificationGateway {
    /// Practices for `transaction`, or `None` if the gateway has no answer.
    fn classify(&self, transaction: &Transaction) -> Result<Option<Vec<PracticeAssignment>>, ImpactError>;
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

/// Weight as the classifier sends it: a number, or text such as `"40%"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WeightValue {
    Number(f64),
    Text(String),
}

impl WeightValue {
    /// Unparseable text counts as absent.
    pub fn percent(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().trim_end_matches('%').trim().parse().ok(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Charity {
    pub name: String,
    #[serde(default)]
    pub url: String,
}

/// One classifier answer, keyed by practice label.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResponse {
    pub transaction_id: String,
    #[serde(default)]
    pub unethical_practices: Vec<String>,
    #[serde(default)]
    pub ethical_practices: Vec<String>,
    #[serde(default)]
    pub practice_weights: HashMap<String, Option<WeightValue>>,
    #[serde(default)]
    pub practice_categories: HashMap<String, String>,
    #[serde(default)]
    pub information: HashMap<String, String>,
    #[serde(default)]
    pub charities: HashMap<String, Charity>,
    #[serde(default)]
    pub affirmations: HashMap<String, String>,
}

impl ClassificationResponse {
    /// Flatten into assignments: unethical practices first, then ethical,
    /// each list in the order the classifier gave it. Labels are interned
    /// through `keys`.
    pub fn to_assignments(&self, keys: &mut PracticeCatalog) -> Vec<PracticeAssignment> {
        let unethical = self.unethical_practices.iter().map(|l| (l, Polarity::Unethical));
        let ethical = self.ethical_practices.iter().map(|l| (l, Polarity::Ethical));

        unethical
            .chain(ethical)
            .map(|(label, polarity)| {
                let weight_percent = self
                    .practice_weights
                    .get(label)
                    .and_then(|w| w.as_ref())
                    .and_then(WeightValue::percent);
                let category = self
                    .practice_categories
                    .get(label)
                    .filter(|c| !c.trim().is_empty())
                    .cloned();
                let remediation = match polarity {
                    Polarity::Unethical => self.charities.get(label).map(|c| Remediation::Charity {
                        name: c.name.clone(),
                        url: c.url.clone(),
                    }),
                    Polarity::Ethical => self
                        .affirmations
                        .get(label)
                        .map(|note| Remediation::Affirmation { note: note.clone() }),
                };

                PracticeAssignment {
                    practice: keys.intern(label),
                    polarity,
                    weight_percent,
                    category,
                    description: self.information.get(label).cloned().unwrap_or_default(),
                    remediation,
                }
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Static gateway
// ---------------------------------------------------------------------------

/// Gateway over answers that were fetched ahead of time.
#[derive(Debug, Clone, Default)]
pub struct StaticGateway {
    by_id: HashMap<String, Vec<PracticeAssignment>>,
    order: Vec<String>,
    keys: PracticeCatalog,
}

impl StaticGateway {
    pub fn from_responses(responses: &[ClassificationResponse]) -> Self {
        let mut gateway = Self::default();
        for r in responses {
            let assignments = r.to_assignments(&mut gateway.keys);
            if gateway.by_id.insert(r.transaction_id.clone(), assignments).is_some() {
                log::warn!(
                    "transaction '{}' classified more than once; keeping the last answer",
                    r.transaction_id
                );
            } else {
                gateway.order.push(r.transaction_id.clone());
            }
        }
        gateway
    }

    /// Parse a JSON array of [`ClassificationResponse`].
    pub fn from_json(input: &str) -> Result<Self, ImpactError> {
        let responses: Vec<ClassificationResponse> = serde_json::from_str(input)
            .map_err(|e| ImpactError::ClassificationParse(e.to_string()))?;
        Ok(Self::from_responses(&responses))
    }

    /// Transaction ids with an answer, in first-seen order.
    pub fn transaction_ids(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

impl ClassificationGateway for StaticGateway {
    fn classify(&self, transaction: &Transaction) -> Result<Option<Vec<PracticeAssignment>>, ImpactError> {
        Ok(self.by_id.get(&transaction.id).cloned())
    }
}
