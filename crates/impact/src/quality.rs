//! Data-quality findings for classifier output.
//!
//! Nothing here changes a number. Scoring already resolves every finding
//! through its defaulting rules; these exist so the caller can log them.

use std::collections::{BTreeMap, HashMap};

use crate::catalog::PracticeKey;
use crate::model::{
    DataQualityWarning, Polarity, PracticeAssignment, QualityIssue, QualitySummary, Transaction,
};

/// Inspect one transaction and the assignments the gateway returned for it.
pub fn inspect(transaction: &Transaction, assignments: &[PracticeAssignment]) -> Vec<DataQualityWarning> {
    let mut out = Vec::new();
    let warn = |practice: Option<&PracticeKey>, issue: QualityIssue| DataQualityWarning {
        transaction_id: transaction.id.clone(),
        practice: practice.cloned(),
        issue,
    };

    if transaction.amount < 0.0 || !transaction.amount.is_finite() {
        out.push(warn(None, QualityIssue::NegativeAmount { amount: transaction.amount }));
    }

    let mut seen: HashMap<&PracticeKey, Polarity> = HashMap::new();
    for a in assignments {
        match a.weight_percent {
            None => out.push(warn(Some(&a.practice), QualityIssue::MissingWeight)),
            Some(w) if w.is_nan() => out.push(warn(Some(&a.practice), QualityIssue::MissingWeight)),
            Some(w) if !(0.0..=100.0).contains(&w) => {
                out.push(warn(Some(&a.practice), QualityIssue::WeightOutOfRange { weight: w }))
            }
            Some(_) => {}
        }

        if a.category.as_deref().map_or(true, |c| c.trim().is_empty()) {
            out.push(warn(Some(&a.practice), QualityIssue::MissingCategory));
        }

        if let Some(&prior) = seen.get(&a.practice) {
            let issue = if prior == a.polarity {
                QualityIssue::DuplicatePractice
            } else {
                QualityIssue::ContradictoryPolarity
            };
            out.push(warn(Some(&a.practice), issue));
        } else {
            seen.insert(&a.practice, a.polarity);
        }
    }

    out
}

/// Finding for a transaction the gateway had nothing to say about.
pub fn unclassified(transaction: &Transaction) -> DataQualityWarning {
    DataQualityWarning {
        transaction_id: transaction.id.clone(),
        practice: None,
        issue: QualityIssue::Unclassified,
    }
}

/// Count findings per issue code.
pub fn summarize(warnings: Vec<DataQualityWarning>) -> QualitySummary {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for w in &warnings {
        *counts.entry(w.issue.code().to_string()).or_insert(0) += 1;
    }
    QualitySummary { counts, warnings }
}

/// Emit each finding at warn level.
pub fn log_warnings(warnings: &[DataQualityWarning]) {
    for w in warnings {
        match w.practice {
            Some(ref p) => log::warn!("transaction '{}', practice '{}': {}", w.transaction_id, p, w.issue),
            None => log::warn!("transaction '{}': {}", w.transaction_id, w.issue),
        }
    }
}
