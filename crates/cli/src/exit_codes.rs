//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain           | Description                              |
//! |---------|------------------|------------------------------------------|
//! | 0       | Universal        | Success                                  |
//! | 1       | Universal        | General error (unspecified)              |
//! | 2       | Universal        | CLI usage error (bad args, missing file) |
//! | 3-9     | input            | Reading and decoding input files         |
//! | 10-19   | engine           | Config, credit and ledger codes          |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into `exit_code_for` or the relevant command

use ethos_impact::ImpactError;

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Input (3-9)
// =============================================================================

/// Cannot read or write a file.
pub const EXIT_IO: u8 = 3;

/// Transaction feed or classification file could not be decoded.
pub const EXIT_PARSE: u8 = 4;

// =============================================================================
// Engine (10-19)
// =============================================================================

/// Config file failed to parse or validate.
pub const EXIT_INVALID_CONFIG: u8 = 10;

/// Credit amount rejected (zero, negative, not a number).
pub const EXIT_INVALID_CREDIT: u8 = 11;

/// Credit ledger file is corrupt.
pub const EXIT_LEDGER_CORRUPT: u8 = 12;

/// Map an engine error to its exit code.
pub fn exit_code_for(err: &ImpactError) -> u8 {
    match err {
        ImpactError::ConfigParse(_) | ImpactError::ConfigValidation(_) => EXIT_INVALID_CONFIG,
        ImpactError::InvalidCredit { .. } => EXIT_INVALID_CREDIT,
        ImpactError::LedgerParse { .. } => EXIT_LEDGER_CORRUPT,
        ImpactError::MissingColumn { .. }
        | ImpactError::DateParse { .. }
        | ImpactError::AmountParse { .. }
        | ImpactError::ClassificationParse(_) => EXIT_PARSE,
        ImpactError::Io(_) => EXIT_IO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credit_and_config_codes_are_distinct() {
        assert_eq!(exit_code_for(&ImpactError::InvalidCredit { amount: 0.0 }), EXIT_INVALID_CREDIT);
        assert_eq!(exit_code_for(&ImpactError::ConfigParse("x".into())), EXIT_INVALID_CONFIG);
        assert_ne!(EXIT_INVALID_CREDIT, EXIT_INVALID_CONFIG);
    }

    #[test]
    fn feed_errors_are_parse_errors() {
        let err = ImpactError::AmountParse { record_id: "t1".into(), value: "x".into() };
        assert_eq!(exit_code_for(&err), EXIT_PARSE);
    }
}
