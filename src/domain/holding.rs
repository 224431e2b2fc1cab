use serde::{Deserialize, Serialize};

/// A real, committed (fund, ticker) position. At most one per pair; a
/// zero-share position does not exist as a row (it is deleted instead).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holding {
    pub fund_id: i64,
    pub ticker: String,
    pub shares: i64,
}

/// A transient projection of what a holding would look like post-trade.
/// Scoped to a `(fund_id, trade_id)` key and discarded after the compliance
/// run that produced it. `trade_id == 0` denotes portfolio compliance (a
/// no-op trade copied straight from the real holdings).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedHolding {
    pub fund_id: i64,
    pub trade_id: i64,
    pub ticker: String,
    pub shares: i64,
}

impl StagedHolding {
    pub fn from_holding(holding: &Holding, trade_id: i64) -> Self {
        Self {
            fund_id: holding.fund_id,
            trade_id,
            ticker: holding.ticker.clone(),
            shares: holding.shares,
        }
    }
}
