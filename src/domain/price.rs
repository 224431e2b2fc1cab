use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A (ticker, date) -> price record. Uniqueness is one price per ticker per
/// date; the most recent by date is the "current" price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePoint {
    pub ticker: String,
    pub price_date: NaiveDate,
    pub price: Decimal,
}
