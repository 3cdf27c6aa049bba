use std::fmt;

#[derive(Debug)]
pub enum ImpactError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (empty name, bad catalog entry, etc.).
    ConfigValidation(String),
    /// Credit amount is zero, negative, or not a finite number.
    InvalidCredit { amount: f64 },
    /// Missing required column in a transaction feed.
    MissingColumn { column: String },
    /// Date parse error in a transaction feed.
    DateParse { record_id: String, value: String },
    /// Amount parse error in a transaction feed.
    AmountParse { record_id: String, value: String },
    /// Classification payload could not be decoded.
    ClassificationParse(String),
    /// Credit ledger line could not be decoded.
    LedgerParse { line: usize, message: String },
    /// IO error (file read, etc.).
    Io(String),
}

impl fmt::Display for ImpactError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::InvalidCredit { amount } => {
                write!(f, "credit amount must be a positive number, got {amount}")
            }
            Self::MissingColumn { column } => write!(f, "missing column '{column}'"),
            Self::DateParse { record_id, value } => {
                write!(f, "transaction '{record_id}': cannot parse date '{value}'")
            }
            Self::AmountParse { record_id, value } => {
                write!(f, "transaction '{record_id}': cannot parse amount '{value}'")
            }
            Self::ClassificationParse(msg) => write!(f, "classification parse error: {msg}"),
            Self::LedgerParse { line, message } => {
                write!(f, "credit ledger line {line}: {message}")
            }
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ImpactError {}
