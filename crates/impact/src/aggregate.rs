use std::collections::{BTreeMap, HashMap};

use crate::catalog::{PracticeCatalog, PracticeKey};
use crate::model::{
    AggregateResult, CategoryGroup, CategoryPractice, Polarity, PracticeAssignment, PracticeTotal,
    Remediation, ScoredTransaction, UNCATEGORIZED,
};
use crate::practice::clamp_amount;

/// Running totals for one practice. `order` is the position of its first
/// appearance in the input and breaks ties when sorting.
struct PracticeAcc {
    order: usize,
    amount: f64,
    polarity: Polarity,
    category: Option<String>,
    remediation: Option<Remediation>,
    transaction_count: usize,
}

/// Fold scored transactions into totals and practice/category views.
pub fn aggregate(scored: &[ScoredTransaction]) -> AggregateResult {
    aggregate_with_catalog(scored, &PracticeCatalog::new())
}

/// Same as [`aggregate`], filling missing category/remediation from `catalog`.
///
/// Output depends only on `scored` (including its order) and `catalog`.
pub fn aggregate_with_catalog(scored: &[ScoredTransaction], catalog: &PracticeCatalog) -> AggregateResult {
    let mut total_societal_debt = 0.0;
    let mut total_spent = 0.0;
    let mut gross_harm = 0.0;
    let mut available_credit = 0.0;
    let mut practices: BTreeMap<PracticeKey, PracticeAcc> = BTreeMap::new();

    for st in scored {
        total_societal_debt += st.societal_debt;
        total_spent += clamp_amount(st.transaction.amount);

        for &v in st.practice_debts.values() {
            if v > 0.0 {
                gross_harm += v;
            } else if v < 0.0 {
                available_credit -= v;
            }
        }

        // Each practice counts once per transaction. Its metadata comes from
        // the last assignment with that key, the one whose amount survived
        // duplicate resolution; position is that of the first occurrence.
        let mut effective: Vec<&PracticeAssignment> = Vec::new();
        let mut slot: HashMap<&PracticeKey, usize> = HashMap::new();
        for a in &st.assignments {
            match slot.get(&a.practice) {
                Some(&i) => effective[i] = a,
                None => {
                    slot.insert(&a.practice, effective.len());
                    effective.push(a);
                }
            }
        }

        for a in effective {
            let Some(&amount) = st.practice_debts.get(&a.practice) else {
                continue;
            };
            let next_order = practices.len();
            let acc = practices.entry(a.practice.clone()).or_insert_with(|| PracticeAcc {
                order: next_order,
                amount: 0.0,
                polarity: a.polarity,
                category: None,
                remediation: None,
                transaction_count: 0,
            });
            if acc.category.is_none() {
                acc.category = a.category.clone();
            }
            if acc.remediation.is_none() {
                acc.remediation = a.remediation.clone();
            }
            acc.amount += amount;
            acc.transaction_count += 1;
        }

        // Debts without a matching assignment (hand-built or trimmed input).
        for (key, &amount) in &st.practice_debts {
            if slot.contains_key(key) {
                continue;
            }
            let next_order = practices.len();
            let acc = practices.entry(key.clone()).or_insert_with(|| PracticeAcc {
                order: next_order,
                amount: 0.0,
                polarity: if amount < 0.0 { Polarity::Ethical } else { Polarity::Unethical },
                category: None,
                remediation: None,
                transaction_count: 0,
            });
            acc.amount += amount;
            acc.transaction_count += 1;
        }
    }

    let debt_percentage = if total_spent > 0.0 {
        total_societal_debt / total_spent * 100.0
    } else {
        0.0
    };

    // Resolve metadata: classifier first, then catalog, then defaults.
    let mut per_practice: BTreeMap<PracticeKey, PracticeTotal> = BTreeMap::new();
    let mut ordered: Vec<(usize, PracticeKey, f64, String)> = Vec::with_capacity(practices.len());
    for (key, acc) in practices {
        let meta = catalog.get(key.as_str());
        let category = acc
            .category
            .or_else(|| meta.and_then(|m| m.category.clone()))
            .unwrap_or_else(|| UNCATEGORIZED.to_string());
        let remediation = acc.remediation.or_else(|| meta.and_then(|m| m.remediation.clone()));

        ordered.push((acc.order, key.clone(), acc.amount, category.clone()));
        per_practice.insert(
            key,
            PracticeTotal {
                amount: acc.amount,
                polarity: net_polarity(acc.amount, acc.polarity),
                category,
                remediation,
                transaction_count: acc.transaction_count,
            },
        );
    }
    ordered.sort_by_key(|(order, ..)| *order);

    let per_category = group_by_category(ordered);

    log::debug!(
        "aggregated {} transactions: {} practices in {} categories, debt {:.2} of {:.2} spent",
        scored.len(),
        per_practice.len(),
        per_category.len(),
        total_societal_debt,
        total_spent,
    );

    AggregateResult {
        total_societal_debt,
        total_spent,
        debt_percentage,
        gross_harm,
        available_credit,
        transaction_count: scored.len(),
        per_practice,
        per_category,
    }
}

/// Polarity of a net amount. A zero total keeps the declared polarity.
fn net_polarity(amount: f64, declared: Polarity) -> Polarity {
    if amount > 0.0 {
        Polarity::Unethical
    } else if amount < 0.0 {
        Polarity::Ethical
    } else {
        declared
    }
}

/// Group practices (already in first-appearance order) by category and sort
/// both levels by descending absolute impact. Sorts are stable, so equal
/// impacts keep first-appearance order.
fn group_by_category(ordered: Vec<(usize, PracticeKey, f64, String)>) -> Vec<CategoryGroup> {
    let mut groups: Vec<CategoryGroup> = Vec::new();
    for (_, practice, amount, category) in ordered {
        match groups.iter_mut().find(|g| g.category == category) {
            Some(group) => group.practices.push(CategoryPractice { practice, amount }),
            None => groups.push(CategoryGroup {
                category,
                total_impact: 0.0,
                practices: vec![CategoryPractice { practice, amount }],
            }),
        }
    }

    for group in &mut groups {
        group.total_impact = group.practices.iter().fold(0.0, |acc, p| acc + p.amount);
        group.practices.sort_by(|a, b| b.amount.abs().total_cmp(&a.amount.abs()));
    }
    groups.sort_by(|a, b| b.total_impact.abs().total_cmp(&a.total_impact.abs()));
    groups
}
