//! Derived dataset builders: rollups layered on top of scored transactions.

use serde_json::json;

use crate::model::{DerivedDataset, ScoredTransaction};
use crate::practice::clamp_amount;

struct Rollup {
    key: String,
    spent: f64,
    debt: f64,
    count: usize,
}

/// Group by `key_fn`, keeping first-appearance order.
fn roll_up<F>(scored: &[ScoredTransaction], key_fn: F) -> Vec<Rollup>
where
    F: Fn(&ScoredTransaction) -> String,
{
    let mut rows: Vec<Rollup> = Vec::new();
    for st in scored {
        let key = key_fn(st);
        let spent = clamp_amount(st.transaction.amount);
        match rows.iter_mut().find(|r| r.key == key) {
            Some(row) => {
                row.spent += spent;
                row.debt += st.societal_debt;
                row.count += 1;
            }
            None => rows.push(Rollup {
                key,
                spent,
                debt: st.societal_debt,
                count: 1,
            }),
        }
    }
    rows
}

fn percentage(debt: f64, spent: f64) -> f64 {
    if spent > 0.0 {
        debt / spent * 100.0
    } else {
        0.0
    }
}

/// Build the `merchant_rollup` dataset: one row per merchant, highest debt
/// first. Equal debts keep first-appearance order.
pub fn build_merchant_rollup(scored: &[ScoredTransaction], limit: usize) -> DerivedDataset {
    let mut rows = roll_up(scored, |st| st.transaction.merchant_name.clone());
    rows.sort_by(|a, b| b.debt.total_cmp(&a.debt));

    let mut dataset = DerivedDataset::new("merchant_rollup", limit);
    dataset.rows = rows
        .into_iter()
        .map(|r| {
            json!({
                "merchant_name": r.key,
                "transaction_count": r.count,
                "total_spent": r.spent,
                "societal_debt": r.debt,
                "debt_percentage": percentage(r.debt, r.spent),
            })
        })
        .collect();
    dataset.enforce_limit();
    dataset
}

/// Build the `monthly_rollup` dataset: one row per `YYYY-MM`, oldest first.
pub fn build_monthly_rollup(scored: &[ScoredTransaction], limit: usize) -> DerivedDataset {
    let mut rows = roll_up(scored, |st| st.transaction.date.format("%Y-%m").to_string());
    rows.sort_by(|a, b| a.key.cmp(&b.key));

    let mut dataset = DerivedDataset::new("monthly_rollup", limit);
    dataset.rows = rows
        .into_iter()
        .map(|r| {
            json!({
                "month": r.key,
                "transaction_count": r.count,
                "total_spent": r.spent,
                "societal_debt": r.debt,
            })
        })
        .collect();
    dataset.enforce_limit();
    dataset
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PracticeAssignment, Transaction};
    use crate::scorer::score;
    use chrono::NaiveDate;

    fn scored(id: &str, merchant: &str, date: &str, amount: f64, weight: f64) -> ScoredTransaction {
        let t = Transaction {
            id: id.into(),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            merchant_name: merchant.into(),
            amount,
        };
        score(&t, &[PracticeAssignment::unethical("High Emissions", weight)])
    }

    #[test]
    fn merchant_rollup_orders_by_debt() {
        let input = vec![
            scored("a", "Fuel Stop", "2026-01-03", 50.0, 10.0),
            scored("b", "Airline", "2026-01-04", 400.0, 50.0),
            scored("c", "Fuel Stop", "2026-02-01", 50.0, 10.0),
        ];
        let ds = build_merchant_rollup(&input, 10);
        assert_eq!(ds.name, "merchant_rollup");
        assert_eq!(ds.rows.len(), 2);
        assert_eq!(ds.rows[0]["merchant_name"], "Airline");
        assert_eq!(ds.rows[0]["societal_debt"], 200.0);
        assert_eq!(ds.rows[1]["merchant_name"], "Fuel Stop");
        assert_eq!(ds.rows[1]["transaction_count"], 2);
        assert_eq!(ds.rows[1]["societal_debt"], 10.0);
        assert_eq!(ds.rows[1]["debt_percentage"], 10.0);
        assert!(!ds.truncated);
    }

    #[test]
    fn merchant_rollup_truncates() {
        let input = vec![
            scored("a", "A", "2026-01-03", 10.0, 10.0),
            scored("b", "B", "2026-01-03", 20.0, 10.0),
            scored("c", "C", "2026-01-03", 30.0, 10.0),
        ];
        let ds = build_merchant_rollup(&input, 2);
        assert_eq!(ds.rows.len(), 2);
        assert!(ds.truncated);
        assert_eq!(ds.rows[0]["merchant_name"], "C");
    }

    #[test]
    fn monthly_rollup_sorted_by_month() {
        let input = vec![
            scored("a", "X", "2026-03-03", 10.0, 100.0),
            scored("b", "X", "2026-01-09", 20.0, 100.0),
            scored("c", "X", "2026-03-20", 5.0, 100.0),
        ];
        let ds = build_monthly_rollup(&input, 12);
        let months: Vec<&str> = ds.rows.iter().map(|r| r["month"].as_str().unwrap()).collect();
        assert_eq!(months, vec!["2026-01", "2026-03"]);
        assert_eq!(ds.rows[1]["total_spent"], 15.0);
        assert_eq!(ds.rows[1]["societal_debt"], 15.0);
    }
}
