//! Transaction feed loaders (CSV and JSON).

use chrono::NaiveDate;

use crate::error::ImpactError;
use crate::model::Transaction;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Load transactions from CSV with `id`, `date`, `merchant_name` and `amount`
/// columns (any order, extra columns ignored). Amounts may carry a leading
/// `$` and thousands separators.
pub fn load_transactions_csv(csv_data: &str) -> Result<Vec<Transaction>, ImpactError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(csv_data.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ImpactError::Io(e.to_string()))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let idx = |name: &str| -> Result<usize, ImpactError> {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| ImpactError::MissingColumn { column: name.into() })
    };

    let id_idx = idx("id")?;
    let date_idx = idx("date")?;
    let merchant_idx = idx("merchant_name")?;
    let amount_idx = idx("amount")?;

    let mut transactions = Vec::new();

    for record in reader.records() {
        let record = record.map_err(|e| ImpactError::Io(e.to_string()))?;

        let id = record.get(id_idx).unwrap_or("").to_string();
        let merchant_name = record.get(merchant_idx).unwrap_or("").to_string();

        let date_str = record.get(date_idx).unwrap_or("");
        let date = NaiveDate::parse_from_str(date_str, DATE_FORMAT).map_err(|_| ImpactError::DateParse {
            record_id: id.clone(),
            value: date_str.into(),
        })?;

        let amount_str = record.get(amount_idx).unwrap_or("");
        let amount = parse_amount(amount_str).ok_or_else(|| ImpactError::AmountParse {
            record_id: id.clone(),
            value: amount_str.into(),
        })?;

        transactions.push(Transaction {
            id,
            date,
            merchant_name,
            amount,
        });
    }

    Ok(transactions)
}

/// Load transactions from a JSON array of [`Transaction`] objects.
pub fn load_transactions_json(input: &str) -> Result<Vec<Transaction>, ImpactError> {
    serde_json::from_str(input).map_err(|e| ImpactError::Io(format!("transactions JSON: {e}")))
}

fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw.trim().trim_start_matches('$').chars().filter(|c| *c != ',').collect();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}
