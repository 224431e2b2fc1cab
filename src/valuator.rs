//! Computes market values and the three fund-level denominators
//! (`total_assets`, `net_assets`, `total_assets_ex_cash`) from a set of
//! holding rows plus a cash scalar.

use rust_decimal::prelude::Zero;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::domain::DenominatorKind;
use crate::store::PriceOracle;

/// The market value of one staged holding, or a flag that its price is
/// unknown (no price point on record for the ticker).
#[derive(Debug, Clone)]
pub enum HoldingValuation {
    Known { ticker: String, market_value: Decimal },
    UnknownPrice { ticker: String },
}

/// Values a single holding at 3 dp (shares * price, before 2 dp aggregation).
pub fn value_holding(oracle: &dyn PriceOracle, ticker: &str, shares: i64) -> HoldingValuation {
    match oracle.latest_price(ticker) {
        Some(price) => {
            let market_value = (Decimal::from(shares) * price).round_dp(3);
            HoldingValuation::Known {
                ticker: ticker.to_string(),
                market_value,
            }
        }
        None => HoldingValuation::UnknownPrice {
            ticker: ticker.to_string(),
        },
    }
}

/// Result of summing market value over a set of holdings: the 2 dp
/// aggregate plus which tickers (if any) had no price on record and were
/// excluded from the sum.
#[derive(Debug, Clone)]
pub struct AggregateMarketValue {
    pub total: Decimal,
    pub unpriced_tickers: Vec<String>,
}

pub fn holdings_market_value<'a>(
    oracle: &dyn PriceOracle,
    holdings: impl IntoIterator<Item = (&'a str, i64)>,
) -> AggregateMarketValue {
    let mut total = Decimal::zero();
    let mut unpriced_tickers = Vec::new();

    for (ticker, shares) in holdings {
        match value_holding(oracle, ticker, shares) {
            HoldingValuation::Known { market_value, .. } => total += market_value,
            HoldingValuation::UnknownPrice { ticker } => unpriced_tickers.push(ticker),
        }
    }

    AggregateMarketValue {
        total: round_half_even_2dp(total),
        unpriced_tickers,
    }
}

/// `total_assets = cash + sum(shares * latest_price)`. Holdings with no
/// latest price are excluded from the sum and reported via
/// `unpriced_tickers`; the caller (rule engine) is responsible for
/// treating a rule whose filter matches an unpriced holding as an
/// evaluation error rather than silently omitting it.
pub fn total_assets<'a>(
    oracle: &dyn PriceOracle,
    cash: Decimal,
    holdings: impl IntoIterator<Item = (&'a str, i64)>,
) -> AggregateMarketValue {
    let mut aggregate = holdings_market_value(oracle, holdings);
    aggregate.total = round_half_even_2dp(aggregate.total + cash);
    aggregate
}

/// `net_assets` is an alias for `total_assets` — there are no liabilities
/// in this model; the distinct name exists for rule-authoring clarity.
pub fn net_assets<'a>(
    oracle: &dyn PriceOracle,
    cash: Decimal,
    holdings: impl IntoIterator<Item = (&'a str, i64)>,
) -> AggregateMarketValue {
    total_assets(oracle, cash, holdings)
}

/// `total_assets_ex_cash = total_assets - cash`, i.e. just the holdings
/// market value.
pub fn total_assets_ex_cash<'a>(
    oracle: &dyn PriceOracle,
    holdings: impl IntoIterator<Item = (&'a str, i64)>,
) -> AggregateMarketValue {
    holdings_market_value(oracle, holdings)
}

pub fn denominator_value<'a>(
    kind: DenominatorKind,
    oracle: &dyn PriceOracle,
    cash: Decimal,
    holdings: impl IntoIterator<Item = (&'a str, i64)>,
) -> Option<AggregateMarketValue> {
    match kind {
        DenominatorKind::TotalAssets => Some(total_assets(oracle, cash, holdings)),
        DenominatorKind::NetAssets => Some(net_assets(oracle, cash, holdings)),
        DenominatorKind::TotalAssetsExCash => Some(total_assets_ex_cash(oracle, holdings)),
        DenominatorKind::Prohibit | DenominatorKind::PerHoldingSharesOutstanding => None,
    }
}

fn round_half_even_2dp(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
}

/// Computes `numerator / denominator * 100`, retaining at least 4 dp
/// before comparison/display.
pub fn percentage(numerator: Decimal, denominator: Decimal) -> Decimal {
    ((numerator / denominator) * Decimal::from(100)).round_dp(4)
}
