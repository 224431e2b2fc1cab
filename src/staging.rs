//! Produces the in-memory post-trade holdings set for a trade, starting
//! from current holdings and applying the trade delta. Used by both
//! trade-compliance and portfolio-compliance (the latter with a no-op
//! trade, `trade_id == 0`, `shares == 0`).

use crate::domain::{Holding, StagedHolding, TradeDirection};
use crate::error::{ComplianceResult, ValidationError};
use crate::store::{ReadModel, Writer};

/// Projects `fund_id`'s current holdings into the staging scope for
/// `trade_id`, then applies a `(direction, shares)` delta. `shares == 0`
/// is a pure copy (the portfolio-compliance case).
pub fn project(
    store: &(impl ReadModel + Writer + ?Sized),
    fund_id: i64,
    trade_id: i64,
    ticker: &str,
    direction: TradeDirection,
    shares: i64,
) -> ComplianceResult<()> {
    let current: Vec<Holding> = store.holdings_for_fund(fund_id);
    let mut staged: Vec<StagedHolding> = current
        .iter()
        .map(|h| StagedHolding::from_holding(h, trade_id))
        .collect();

    if shares > 0 {
        apply_delta(&mut staged, fund_id, trade_id, ticker, direction, shares)?;
    }

    store.stage_holdings(fund_id, trade_id, staged);
    Ok(())
}

fn apply_delta(
    staged: &mut Vec<StagedHolding>,
    fund_id: i64,
    trade_id: i64,
    ticker: &str,
    direction: TradeDirection,
    shares: i64,
) -> ComplianceResult<()> {
    let existing = staged.iter_mut().find(|row| row.ticker == ticker);

    match direction {
        TradeDirection::Buy => match existing {
            Some(row) => row.shares += shares,
            None => staged.push(StagedHolding {
                fund_id,
                trade_id,
                ticker: ticker.to_string(),
                shares,
            }),
        },
        TradeDirection::Sell => match existing {
            None => {
                // Defensive: share-availability is checked before staging
                // runs, so a SELL with no existing position should never
                // reach here in practice.
                return Err(ValidationError::Field {
                    field: "ticker".to_string(),
                    message: format!(
                        "cannot stage SELL for '{ticker}': no existing holding"
                    ),
                }
                .into());
            }
            Some(row) => {
                if row.shares - shares <= 0 {
                    staged.retain(|r| r.ticker != ticker);
                } else {
                    row.shares -= shares;
                }
            }
        },
    }

    Ok(())
}
