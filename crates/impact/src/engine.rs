use std::collections::HashSet;

use crate::aggregate::aggregate_with_catalog;
use crate::config::ImpactConfig;
use crate::derived::{build_merchant_rollup, build_monthly_rollup};
use crate::error::ImpactError;
use crate::gateway::{ClassificationGateway, StaticGateway};
use crate::model::{DerivedOutputs, ImpactMeta, ImpactReport, ScoredTransaction, Transaction};
use crate::quality;
use crate::scorer::score_with;

/// Classify, score and aggregate `transactions`. Returns the full report.
///
/// Data-quality findings are logged at warn level and returned in the report;
/// they never fail the run. Only a gateway error does.
pub fn run(
    config: &ImpactConfig,
    transactions: &[Transaction],
    gateway: &dyn ClassificationGateway,
) -> Result<ImpactReport, ImpactError> {
    let policy = config.scoring.duplicate_labels;
    let mut scored: Vec<ScoredTransaction> = Vec::with_capacity(transactions.len());
    let mut warnings = Vec::new();

    for txn in transactions {
        let assignments = match gateway.classify(txn)? {
            Some(a) => a,
            None => {
                warnings.push(quality::unclassified(txn));
                Vec::new()
            }
        };
        warnings.extend(quality::inspect(txn, &assignments));
        scored.push(score_with(policy, txn, &assignments));
    }

    quality::log_warnings(&warnings);

    let catalog = config.catalog();
    let aggregate = aggregate_with_catalog(&scored, &catalog);

    let derived = DerivedOutputs {
        merchant_rollup: build_merchant_rollup(&scored, config.derived.merchant_limit),
        monthly_rollup: build_monthly_rollup(&scored, config.derived.monthly_limit),
    };

    Ok(ImpactReport {
        meta: ImpactMeta {
            config_name: config.name.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
            duplicate_labels: policy,
        },
        aggregate,
        quality: quality::summarize(warnings),
        derived,
        transactions: scored,
    })
}

/// Run against pre-fetched answers, also warning about answers whose
/// transaction is not in the feed.
pub fn run_static(
    config: &ImpactConfig,
    transactions: &[Transaction],
    gateway: &StaticGateway,
) -> Result<ImpactReport, ImpactError> {
    let known: HashSet<&str> = transactions.iter().map(|t| t.id.as_str()).collect();
    for id in gateway.transaction_ids() {
        if !known.contains(id.as_str()) {
            log::warn!("classification for unknown transaction '{id}' ignored");
        }
    }
    run(config, transactions, gateway)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PracticeAssignment, Polarity};
    use chrono::NaiveDate;
    use std::collections::HashMap;

    struct MapGateway(HashMap<String, Vec<PracticeAssignment>>);

    impl ClassificationGateway for MapGateway {
        fn classify(&self, t: &Transaction) -> Result<Option<Vec<PracticeAssignment>>, ImpactError> {
            Ok(self.0.get(&t.id).cloned())
        }
    }

    struct DownGateway;

    impl ClassificationGateway for DownGateway {
        fn classify(&self, _: &Transaction) -> Result<Option<Vec<PracticeAssignment>>, ImpactError> {
            Err(ImpactError::Io("classifier unavailable".into()))
        }
    }

    fn txn(id: &str, amount: f64) -> Transaction {
        Transaction {
            id: id.into(),
            date: NaiveDate::from_ymd_opt(2026, 5, 5).unwrap(),
            merchant_name: "Store".into(),
            amount,
        }
    }

    #[test]
    fn run_scores_and_aggregates() {
        let gateway = MapGateway(HashMap::from([
            (
                "a".to_string(),
                vec![PracticeAssignment::unethical("Factory Farming", 50.0).with_category("Animals")],
            ),
            (
                "b".to_string(),
                vec![PracticeAssignment::ethical("Fair Trade", 50.0).with_category("Labor")],
            ),
        ]));
        let txns = vec![txn("a", 100.0), txn("b", 40.0), txn("c", 10.0)];

        let report = run(&ImpactConfig::default(), &txns, &gateway).unwrap();
        assert_eq!(report.transactions.len(), 3);
        assert_eq!(report.transactions[2].societal_debt, 0.0);
        assert_eq!(report.aggregate.total_societal_debt, 30.0);
        assert_eq!(report.aggregate.total_spent, 150.0);
        assert_eq!(report.quality.counts["unclassified"], 1);
        assert_eq!(report.meta.config_name, "default");
        assert_eq!(report.derived.merchant_rollup.rows.len(), 1);
    }

    #[test]
    fn sum_policy_flows_through_config() {
        let config = ImpactConfig::from_toml("name = \"s\"\n[scoring]\nduplicate_labels = \"sum\"\n").unwrap();
        let gateway = MapGateway(HashMap::from([(
            "a".to_string(),
            vec![
                PracticeAssignment::new("X", Polarity::Unethical, Some(10.0)),
                PracticeAssignment::new("X", Polarity::Unethical, Some(10.0)),
            ],
        )]));
        let report = run(&config, &[txn("a", 100.0)], &gateway).unwrap();
        assert_eq!(report.aggregate.total_societal_debt, 20.0);
        assert_eq!(report.quality.counts["duplicate_practice"], 1);
    }

    #[test]
    fn gateway_failure_propagates() {
        let err = run(&ImpactConfig::default(), &[txn("a", 1.0)], &DownGateway).unwrap_err();
        assert!(err.to_string().contains("classifier unavailable"));
    }
}
