use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// The scalar divisor used to convert a rule's numerator into a percentage
/// of the fund. `Prohibit` and `PerHoldingSharesOutstanding` carry no ratio
/// semantics of their own — see the rule engine for their dispatch.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DenominatorKind {
    TotalAssets,
    NetAssets,
    TotalAssetsExCash,
    Prohibit,
    PerHoldingSharesOutstanding,
}

impl DenominatorKind {
    pub fn is_prohibit(&self) -> bool {
        matches!(self, Self::Prohibit)
    }

    pub fn is_per_holding(&self) -> bool {
        matches!(self, Self::PerHoldingSharesOutstanding)
    }

    pub fn is_percentage_of_fund(&self) -> bool {
        matches!(
            self,
            Self::TotalAssets | Self::NetAssets | Self::TotalAssetsExCash
        )
    }
}

/// Direction of an alert threshold comparison. Boundary is inclusive on
/// both sides: `above` triggers at `percentage >= threshold`, `below`
/// triggers at `percentage <= threshold`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AlertDirection {
    Above,
    Below,
}

impl AlertDirection {
    pub fn triggers(&self, percentage: Decimal, threshold: Decimal) -> bool {
        match self {
            Self::Above => percentage >= threshold,
            Self::Below => percentage <= threshold,
        }
    }
}

/// A declarative compliance rule: a filter expression over staged holdings,
/// a denominator kind, and (except for `Prohibit`) a threshold/direction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub rule_id: i64,
    pub rule_name: String,
    pub alert_message: String,
    pub evaluate_on_trade: bool,
    pub evaluate_on_portfolio: bool,
    /// Restricted WHERE-body expression; empty means "match all".
    pub expression: String,
    pub denominator: DenominatorKind,
    /// `None` iff `denominator` is `Prohibit`.
    pub alert_direction: Option<AlertDirection>,
    /// `None` iff `denominator` is `Prohibit`.
    pub alert_threshold: Option<Decimal>,
    pub active: bool,
}

impl Rule {
    /// Strips a leading `WHERE` keyword and trims whitespace; an empty
    /// result is the constant-true expression.
    pub fn normalized_expression(&self) -> &str {
        let trimmed = self.expression.trim();
        trimmed
            .strip_prefix("WHERE")
            .or_else(|| trimmed.strip_prefix("where"))
            .map(str::trim_start)
            .unwrap_or(trimmed)
    }
}

/// Links a `Rule` to a `Fund`. Uniqueness on `(rule_id, fund_id)`; an
/// inactive attachment behaves as absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleAttachment {
    pub attachment_id: i64,
    pub rule_id: i64,
    pub fund_id: i64,
    pub active: bool,
}
