//! Drives one trade through its full lifecycle: validate, price, check
//! availability, stage and run compliance, then either settle it straight
//! through or park it behind pending alerts. Also resolves those alerts
//! (override/cancel) and runs the portfolio-compliance sweep.

use std::sync::Arc;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::{error, info, instrument, warn};

use crate::clock::EngineClock;
use crate::domain::{Alert, AlertStatus, Trade, TradeDirection, TradeStatus};
use crate::engine::{self, RuleEvaluationOutcome};
use crate::error::{
    AvailabilityError, ComplianceError, ComplianceResult, ConflictError, NotFoundError,
    ValidationError,
};
use crate::lock::FundLocks;
use crate::staging;
use crate::store::{AttachmentMode, Store};

/// The result of submitting a trade: its final persisted state plus the
/// per-rule outcomes from whichever compliance run it went through (empty
/// if it was rejected before reaching the rule engine).
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub trade: Trade,
    pub rule_outcomes: Vec<RuleEvaluationOutcome>,
}

pub struct Orchestrator {
    store: Arc<dyn Store>,
    locks: Arc<FundLocks>,
    clock: Arc<dyn EngineClock>,
}

impl Orchestrator {
    pub fn new(store: Arc<dyn Store>, locks: Arc<FundLocks>, clock: Arc<dyn EngineClock>) -> Self {
        Self {
            store,
            locks,
            clock,
        }
    }

    fn validate_request(
        fund_id: i64,
        ticker: &str,
        shares: i64,
    ) -> Result<(), ValidationError> {
        if fund_id <= 0 {
            return Err(ValidationError::InvalidFundId(fund_id));
        }
        if ticker.trim().is_empty() {
            return Err(ValidationError::EmptyTicker);
        }
        if shares < 1 {
            return Err(ValidationError::InvalidShares(shares));
        }
        Ok(())
    }

    /// Marks `trade` `Invalid`, persists it, and returns the caller-facing
    /// error. Every rejection path after the trade row exists runs through
    /// here so the audit trail always records why.
    fn reject(&self, mut trade: Trade, err: ComplianceError) -> ComplianceError {
        trade.status = TradeStatus::Invalid;
        trade.updated_at = self.clock.now();
        if let Err(persist_err) = self.store.update_trade(trade) {
            error!(error = %persist_err, "failed to persist rejected trade");
        }
        err
    }

    #[instrument(skip(self))]
    pub async fn submit_trade(
        &self,
        fund_id: i64,
        ticker: &str,
        direction: TradeDirection,
        shares: i64,
    ) -> ComplianceResult<SubmitOutcome> {
        Self::validate_request(fund_id, ticker, shares)?;

        let now = self.clock.now();
        let trade_id = self.store.next_trade_id();
        let mut trade = Trade {
            trade_id,
            fund_id,
            ticker: ticker.to_string(),
            direction,
            shares,
            status: TradeStatus::Submitted,
            price: None,
            total_value: None,
            created_at: now,
            updated_at: now,
        };
        self.store.create_trade(trade.clone())?;
        trade.status = TradeStatus::Validating;
        self.store.update_trade(trade.clone())?;

        let Some(_fund) = self.store.fund(fund_id) else {
            return Err(self.reject(trade, NotFoundError::Fund(fund_id).into()));
        };
        if self.store.security(ticker).is_none() {
            return Err(self.reject(trade, NotFoundError::Security(ticker.to_string()).into()));
        }
        let Some(price) = self.store.latest_price(ticker) else {
            return Err(self.reject(
                trade,
                ValidationError::NoPriceAvailable(ticker.to_string()).into(),
            ));
        };

        let total_value = (Decimal::from(shares) * price).round_dp(2);
        trade.price = Some(price);
        trade.total_value = Some(total_value);

        // Held for the remainder of this call: through the availability
        // check and, if the trade settles straight through, the commit.
        let _guard = self.locks.acquire(fund_id).await;

        let fund = self
            .store
            .fund(fund_id)
            .ok_or(NotFoundError::Fund(fund_id))?;

        if let Err(err) = self.check_availability(fund_id, ticker, direction, shares, price, total_value, fund.cash) {
            return Err(self.reject(trade, err));
        }

        trade.status = TradeStatus::Compliance;
        self.store.update_trade(trade.clone())?;

        staging::project(
            self.store.as_ref(),
            fund_id,
            trade_id,
            ticker,
            direction,
            shares,
        )?;

        let cash_delta = cash_delta_for(direction, total_value);
        let outcomes = engine::evaluate_fund(
            self.store.as_ref(),
            self.store.as_ref(),
            fund_id,
            trade_id,
            AttachmentMode::Trade,
            cash_delta,
        );

        for outcome in &outcomes {
            if let Some(abort) = &outcome.error {
                warn!(rule_id = outcome.rule_id, error = %abort.0, "rule aborted during trade compliance");
            }
        }

        let alerted: Vec<&RuleEvaluationOutcome> =
            outcomes.iter().filter(|o| o.alerted).collect();

        if alerted.is_empty() {
            self.store.commit_trade(
                fund_id,
                trade_id,
                ticker,
                shares_delta_for(direction, shares),
                cash_delta,
            )?;
            trade.status = TradeStatus::Processed;
            trade.updated_at = self.clock.now();
            self.store.update_trade(trade.clone())?;
            info!(trade_id, "trade processed with no alerts");
        } else {
            for outcome in &alerted {
                let alert_id = self.store.next_alert_id();
                let alert = Alert {
                    alert_id,
                    rule_id: outcome.rule_id,
                    fund_id,
                    trade_id: Some(trade_id),
                    calculated_percentage: outcome.calculated_percentage,
                    triggering_holdings: outcome.triggering_holdings.clone(),
                    status: AlertStatus::Pending,
                    override_reason: None,
                    created_at: self.clock.now(),
                };
                self.store.create_alert(alert)?;
            }
            trade.status = TradeStatus::Alert;
            trade.updated_at = self.clock.now();
            self.store.update_trade(trade.clone())?;
            warn!(trade_id, alerts = alerted.len(), "trade parked on alert");
        }

        Ok(SubmitOutcome {
            trade,
            rule_outcomes: outcomes,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn check_availability(
        &self,
        fund_id: i64,
        ticker: &str,
        direction: TradeDirection,
        shares: i64,
        price: Decimal,
        total_value: Decimal,
        cash: Decimal,
    ) -> ComplianceResult<()> {
        match direction {
            TradeDirection::Buy => {
                if cash.is_zero() {
                    return Err(AvailabilityError::ZeroCashTrading.into());
                }
                if cash < total_value {
                    let shortfall = total_value - cash;
                    let max_affordable_shares = (cash / price).trunc().to_i64().unwrap_or(0);
                    return Err(AvailabilityError::InsufficientCash {
                        ticker: ticker.to_string(),
                        shares,
                        price,
                        total_value,
                        cash_available: cash,
                        shortfall,
                        max_affordable_shares,
                    }
                    .into());
                }
            }
            TradeDirection::Sell => {
                let held = self
                    .store
                    .holding(fund_id, ticker)
                    .map(|h| h.shares)
                    .ok_or_else(|| AvailabilityError::NoSuchHolding {
                        ticker: ticker.to_string(),
                    })?;
                if held < shares {
                    return Err(AvailabilityError::InsufficientShares {
                        ticker: ticker.to_string(),
                        requested: shares,
                        held,
                    }
                    .into());
                }
            }
        }
        Ok(())
    }

    /// Runs the portfolio-compliance sweep for `fund_id` against a no-op
    /// trade (`trade_id == 0`), creating fund-level alerts (no `trade_id`)
    /// for anything that fires. Staging is discarded afterwards — this is
    /// a snapshot, not a commit.
    #[instrument(skip(self))]
    pub fn run_portfolio_compliance(&self, fund_id: i64) -> ComplianceResult<Vec<RuleEvaluationOutcome>> {
        self.store
            .fund(fund_id)
            .ok_or(NotFoundError::Fund(fund_id))?;

        staging::project(self.store.as_ref(), fund_id, 0, "", TradeDirection::Buy, 0)?;

        let outcomes = engine::evaluate_fund(
            self.store.as_ref(),
            self.store.as_ref(),
            fund_id,
            0,
            AttachmentMode::Portfolio,
            Decimal::ZERO,
        );

        for outcome in outcomes.iter().filter(|o| o.alerted) {
            let alert_id = self.store.next_alert_id();
            let alert = Alert {
                alert_id,
                rule_id: outcome.rule_id,
                fund_id,
                trade_id: None,
                calculated_percentage: outcome.calculated_percentage,
                triggering_holdings: outcome.triggering_holdings.clone(),
                status: AlertStatus::Pending,
                override_reason: None,
                created_at: self.clock.now(),
            };
            self.store.create_alert(alert)?;
        }

        self.store.drain_staging(fund_id, 0);
        Ok(outcomes)
    }

    /// Overrides a pending alert with a non-empty reason. Idempotent when
    /// re-invoked with the same reason on an already-overridden alert;
    /// rejected with `AlreadyOverridden` if invoked again with a
    /// *different* reason. If this was the last pending alert on its
    /// trade, the trade settles (commits and moves to `Processed`).
    #[instrument(skip(self))]
    pub async fn override_alert(&self, alert_id: i64, reason: &str) -> ComplianceResult<Alert> {
        if reason.trim().is_empty() {
            return Err(ConflictError::EmptyOverrideReason.into());
        }

        let mut alert = self
            .store
            .alert(alert_id)
            .ok_or(NotFoundError::Alert(alert_id))?;

        match alert.status {
            AlertStatus::Overridden => {
                if alert.override_reason.as_deref() == Some(reason) {
                    return Ok(alert);
                }
                return Err(ConflictError::AlreadyOverridden(
                    alert_id,
                    alert.override_reason.clone().unwrap_or_default(),
                )
                .into());
            }
            AlertStatus::Cancelled => return Ok(alert),
            AlertStatus::Pending => {}
        }

        alert.status = AlertStatus::Overridden;
        alert.override_reason = Some(reason.to_string());
        self.store.update_alert(alert.clone())?;
        info!(alert_id, "alert overridden");

        if let Some(trade_id) = alert.trade_id {
            self.settle_if_clear(trade_id).await?;
        }

        Ok(alert)
    }

    /// Cancels a pending alert and, if it belongs to a trade, cancels the
    /// whole trade (discarding staged holdings) and cascades the
    /// cancellation to any other pending alerts on the same trade.
    #[instrument(skip(self))]
    pub async fn cancel_alert(&self, alert_id: i64) -> ComplianceResult<Alert> {
        let mut alert = self
            .store
            .alert(alert_id)
            .ok_or(NotFoundError::Alert(alert_id))?;

        match alert.status {
            AlertStatus::Cancelled | AlertStatus::Overridden => return Ok(alert),
            AlertStatus::Pending => {}
        }

        alert.status = AlertStatus::Cancelled;
        self.store.update_alert(alert.clone())?;
        warn!(alert_id, "alert cancelled");

        if let Some(trade_id) = alert.trade_id {
            let fund_id = alert.fund_id;
            let _guard = self.locks.acquire(fund_id).await;

            for sibling in self.store.alerts_for_trade(trade_id) {
                if sibling.alert_id != alert_id && sibling.is_pending() {
                    let mut sibling = sibling;
                    sibling.status = AlertStatus::Cancelled;
                    self.store.update_alert(sibling)?;
                }
            }

            if let Some(mut trade) = self.store.trade(trade_id) {
                trade.status = TradeStatus::Cancelled;
                trade.updated_at = self.clock.now();
                self.store.update_trade(trade)?;
            }
            self.store.drain_staging(fund_id, trade_id);
        }

        Ok(alert)
    }

    async fn settle_if_clear(&self, trade_id: i64) -> ComplianceResult<()> {
        let pending = self
            .store
            .alerts_for_trade(trade_id)
            .into_iter()
            .filter(Alert::is_pending)
            .count();
        if pending > 0 {
            return Ok(());
        }

        let mut trade = self.store.trade(trade_id).ok_or(NotFoundError::Trade(trade_id))?;
        if trade.status.is_terminal() {
            return Ok(());
        }

        let fund_id = trade.fund_id;
        let ticker = trade.ticker.clone();
        let direction = trade.direction;
        let shares = trade.shares;
        let price = trade.price.ok_or_else(|| {
            ComplianceError::Internal(format!("trade {trade_id} reached settlement with no price"))
        })?;
        let total_value = trade.total_value.ok_or_else(|| {
            ComplianceError::Internal(format!(
                "trade {trade_id} reached settlement with no priced total_value"
            ))
        })?;

        // The submit-time availability check ran under a lock that was
        // released once the trade parked on ALERT; re-acquire it here and
        // re-validate against the fund's *current* cash/holdings before
        // committing, since other trades may have consumed what this one
        // was counting on while it sat pending.
        let _guard = self.locks.acquire(fund_id).await;

        let fund = self.store.fund(fund_id).ok_or(NotFoundError::Fund(fund_id))?;
        if let Err(err) =
            self.check_availability(fund_id, &ticker, direction, shares, price, total_value, fund.cash)
        {
            self.store.drain_staging(fund_id, trade_id);
            return Err(self.reject(trade, err));
        }

        let cash_delta = cash_delta_for(direction, total_value);
        self.store.commit_trade(
            fund_id,
            trade_id,
            &ticker,
            shares_delta_for(direction, shares),
            cash_delta,
        )?;

        trade.status = TradeStatus::Processed;
        trade.updated_at = self.clock.now();
        self.store.update_trade(trade)?;
        info!(trade_id, "trade settled after all alerts resolved");
        Ok(())
    }
}

fn cash_delta_for(direction: TradeDirection, total_value: Decimal) -> Decimal {
    match direction {
        TradeDirection::Buy => -total_value,
        TradeDirection::Sell => total_value,
    }
}

fn shares_delta_for(direction: TradeDirection, shares: i64) -> i64 {
    match direction {
        TradeDirection::Buy => shares,
        TradeDirection::Sell => -shares,
    }
}
