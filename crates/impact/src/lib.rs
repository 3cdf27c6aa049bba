//! `ethos-impact`: impact scoring and aggregation engine.
//!
//! Pure engine crate: receives transactions and classifier answers, returns
//! signed societal-debt figures. No CLI dependencies; the only mutable state
//! is the credit ledger.

pub mod aggregate;
pub mod catalog;
pub mod config;
pub mod credit;
pub mod derived;
pub mod engine;
pub mod error;
pub mod feed;
pub mod gateway;
pub mod model;
pub mod practice;
pub mod quality;
pub mod scorer;

pub use aggregate::{aggregate, aggregate_with_catalog};
pub use catalog::{PracticeCatalog, PracticeKey};
pub use config::{DuplicatePolicy, ImpactConfig};
pub use credit::{apply_credit, CreditLedger};
pub use engine::run;
pub use error::ImpactError;
pub use gateway::{ClassificationGateway, StaticGateway};
pub use model::{
    AggregateResult, CreditApplication, CreditLedgerEntry, ImpactReport, Polarity, PracticeAssignment,
    ScoredTransaction, Transaction,
};
pub use practice::practice_amount;
pub use scorer::{score, score_with};
