use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeDirection {
    Buy,
    Sell,
}

/// The trade lifecycle state machine.
///
/// Terminal states: `Invalid`, `Cancelled`, `Processed`.
/// Pending states: `Submitted`, `Validating`, `Compliance`, `Alert`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TradeStatus {
    Submitted,
    Validating,
    Invalid,
    Compliance,
    Alert,
    Cancelled,
    Processed,
}

impl TradeStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Invalid | Self::Cancelled | Self::Processed)
    }
}

/// A proposed or settled trade. `price`/`total_value` are populated once
/// pricing succeeds; both remain `None` while the trade is still
/// `Submitted`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub trade_id: i64,
    pub fund_id: i64,
    pub ticker: String,
    pub direction: TradeDirection,
    pub shares: i64,
    pub status: TradeStatus,
    pub price: Option<Decimal>,
    pub total_value: Option<Decimal>,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}

impl Trade {
    pub fn is_completed(&self) -> bool {
        self.status.is_terminal()
    }
}
