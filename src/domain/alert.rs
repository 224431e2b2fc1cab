use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    Pending,
    Overridden,
    Cancelled,
}

/// One triggering holding attached to an alert, carrying enough detail for
/// an operator to understand why the rule fired.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggeringHolding {
    pub ticker: String,
    pub shares: i64,
    pub market_value: Option<Decimal>,
    /// Populated only for for-each (per-holding-shares-outstanding) rules.
    pub percentage: Option<Decimal>,
}

/// A persisted record that a rule fired for a fund (and optionally a
/// trade). Owned jointly by `Rule` and `Fund`; cascade-deleted by either.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub alert_id: i64,
    pub rule_id: i64,
    pub fund_id: i64,
    /// `None` for a portfolio-compliance alert.
    pub trade_id: Option<i64>,
    /// `None` for prohibit rules and for-each rules (no single ratio).
    pub calculated_percentage: Option<Decimal>,
    pub triggering_holdings: Vec<TriggeringHolding>,
    pub status: AlertStatus,
    pub override_reason: Option<String>,
    pub created_at: DateTime<FixedOffset>,
}

impl Alert {
    pub fn is_pending(&self) -> bool {
        matches!(self.status, AlertStatus::Pending)
    }
}
