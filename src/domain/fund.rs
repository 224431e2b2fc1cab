use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A fund: the account a trade is executed against.
///
/// Invariant: `cash` must never go negative after a committed transition
/// (enforced by the trade orchestrator, not by this struct).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fund {
    pub fund_id: i64,
    pub fund_name: String,
    pub cash: Decimal,
}

impl Fund {
    pub fn new(fund_id: i64, fund_name: impl Into<String>, cash: Decimal) -> Self {
        Self {
            fund_id,
            fund_name: fund_name.into(),
            cash,
        }
    }
}
