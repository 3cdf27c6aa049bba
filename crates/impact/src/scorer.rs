use std::collections::BTreeMap;

use crate::config::DuplicatePolicy;
use crate::model::{PracticeAssignment, ScoredTransaction, Transaction};
use crate::practice::practice_amount;

/// Score one transaction. A practice listed twice keeps its last occurrence.
pub fn score(transaction: &Transaction, assignments: &[PracticeAssignment]) -> ScoredTransaction {
    score_with(DuplicatePolicy::LastWins, transaction, assignments)
}

/// Score one transaction under an explicit duplicate-label policy.
///
/// No assignments means no debt: there is no fallback on the raw amount.
pub fn score_with(
    policy: DuplicatePolicy,
    transaction: &Transaction,
    assignments: &[PracticeAssignment],
) -> ScoredTransaction {
    let mut practice_debts = BTreeMap::new();

    for a in assignments {
        let amount = practice_amount(transaction.amount, a.weight_percent, a.polarity);
        match policy {
            DuplicatePolicy::LastWins => {
                practice_debts.insert(a.practice.clone(), amount);
            }
            DuplicatePolicy::Sum => {
                *practice_debts.entry(a.practice.clone()).or_insert(0.0) += amount;
            }
        }
    }

    // fold from +0.0: an empty map must give exactly 0, not -0.
    let societal_debt = practice_debts.values().fold(0.0, |acc, v| acc + v);

    ScoredTransaction {
        transaction: transaction.clone(),
        assignments: assignments.to_vec(),
        practice_debts,
        societal_debt,
    }
}
