//! Credit application: user-initiated offsets against aggregate debt.
//!
//! A credit only moves the aggregate total. Per-transaction, per-practice and
//! per-category figures are left alone, so after a credit the breakdown no
//! longer sums to the adjusted total.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::error::ImpactError;
use crate::model::{AggregateResult, CreditApplication, CreditLedgerEntry};

/// Scope used when the caller does not name a user or account.
pub const DEFAULT_SCOPE: &str = "default";

/// Reject zero, negative and non-finite amounts.
pub fn validate_credit(amount: f64) -> Result<(), ImpactError> {
    if amount.is_finite() && amount > 0.0 {
        Ok(())
    } else {
        Err(ImpactError::InvalidCredit { amount })
    }
}

/// Apply a one-off credit against `aggregate` with no prior history.
pub fn apply_credit(aggregate: &AggregateResult, amount: f64) -> Result<CreditApplication, ImpactError> {
    build_application(aggregate.total_societal_debt, amount, DEFAULT_SCOPE, 1, Utc::now())
}

fn build_application(
    outstanding: f64,
    amount: f64,
    scope: &str,
    seq: u64,
    at: DateTime<Utc>,
) -> Result<CreditApplication, ImpactError> {
    validate_credit(amount)?;
    let resulting_debt = outstanding - amount;
    Ok(CreditApplication {
        new_total_societal_debt: resulting_debt,
        ledger_entry: CreditLedgerEntry {
            seq,
            scope: scope.to_string(),
            applied_amount: amount,
            timestamp: at,
            resulting_debt,
        },
    })
}

/// Append-only credit log shared by every scope.
///
/// All writers go through one mutex, so appends for a scope are totally
/// ordered and each sees the running total left by the previous one.
#[derive(Debug, Default)]
pub struct CreditLedger {
    entries: Mutex<Vec<CreditLedgerEntry>>,
}

impl CreditLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a ledger from persisted entries, oldest first.
    pub fn from_entries(entries: Vec<CreditLedgerEntry>) -> Self {
        Self {
            entries: Mutex::new(entries),
        }
    }

    pub fn apply(
        &self,
        scope: &str,
        aggregate: &AggregateResult,
        amount: f64,
    ) -> Result<CreditApplication, ImpactError> {
        self.apply_at(scope, aggregate, amount, Utc::now())
    }

    /// Apply `amount` against the scope's outstanding debt:
    /// `aggregate.total_societal_debt` minus everything already credited.
    pub fn apply_at(
        &self,
        scope: &str,
        aggregate: &AggregateResult,
        amount: f64,
        at: DateTime<Utc>,
    ) -> Result<CreditApplication, ImpactError> {
        validate_credit(amount)?;

        let mut entries = self.entries.lock();
        let (applied, count) = entries
            .iter()
            .filter(|e| e.scope == scope)
            .fold((0.0, 0u64), |(sum, n), e| (sum + e.applied_amount, n + 1));

        if applied + amount > aggregate.available_credit {
            log::warn!(
                "scope '{scope}': credits of {:.2} exceed available positive impact {:.2}",
                applied + amount,
                aggregate.available_credit,
            );
        }

        let application = build_application(
            aggregate.total_societal_debt - applied,
            amount,
            scope,
            count + 1,
            at,
        )?;
        entries.push(application.ledger_entry.clone());
        Ok(application)
    }

    /// Entries for one scope, in append order.
    pub fn entries_for(&self, scope: &str) -> Vec<CreditLedgerEntry> {
        self.entries
            .lock()
            .iter()
            .filter(|e| e.scope == scope)
            .cloned()
            .collect()
    }

    pub fn entries(&self) -> Vec<CreditLedgerEntry> {
        self.entries.lock().clone()
    }

    pub fn total_applied(&self, scope: &str) -> f64 {
        self.entries
            .lock()
            .iter()
            .filter(|e| e.scope == scope)
            .fold(0.0, |acc, e| acc + e.applied_amount)
    }

    /// Debt still outstanding for `scope` after its credits.
    pub fn outstanding(&self, scope: &str, aggregate: &AggregateResult) -> f64 {
        aggregate.total_societal_debt - self.total_applied(scope)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

// ---------------------------------------------------------------------------
// JSON lines
// ---------------------------------------------------------------------------

/// One JSON object per line, oldest first. Blank lines are skipped.
pub fn parse_jsonl(input: &str) -> Result<Vec<CreditLedgerEntry>, ImpactError> {
    input
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line).map_err(|e| ImpactError::LedgerParse {
                line: i + 1,
                message: e.to_string(),
            })
        })
        .collect()
}

pub fn to_jsonl_line(entry: &CreditLedgerEntry) -> Result<String, ImpactError> {
    let mut line = serde_json::to_string(entry).map_err(|e| ImpactError::Io(e.to_string()))?;
    line.push('\n');
    Ok(line)
}
