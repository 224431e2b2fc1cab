//! Drives one rule's evaluation end-to-end against the staged holdings for
//! a `(fund, trade)` key: selects matching rows via the predicate
//! evaluator, calls the valuator with the correct denominator, compares to
//! threshold, and emits a decision plus the rows that contributed.

use rust_decimal::Decimal;
use tracing::{debug, instrument, warn};

use crate::domain::alert::TriggeringHolding;
use crate::domain::{DenominatorKind, Rule};
use crate::error::EvaluationError;
use crate::predicate::Predicate;
use crate::store::{AttachmentMode, JoinedHoldingRow, PriceOracle, ReadModel, Writer};
use crate::valuator;

/// A hard failure that aborts the whole rule (missing price feeding the
/// denominator or a matched numerator row, or a zero denominator). Not to
/// be confused with [`EvaluationError::NullSharesOutstanding`], which only
/// skips the offending row in a for-each rule.
#[derive(Debug, Clone)]
pub struct RuleAbort(pub EvaluationError);

/// The outcome of evaluating one rule against staged holdings.
#[derive(Debug, Clone)]
pub struct RuleEvaluationOutcome {
    pub rule_id: i64,
    pub rule_name: String,
    pub alerted: bool,
    pub calculated_percentage: Option<Decimal>,
    pub triggering_holdings: Vec<TriggeringHolding>,
    /// Aborts the rule entirely: no verdict could be reached.
    pub error: Option<RuleAbort>,
    /// Per-row evaluation errors that did not abort the rule (for-each
    /// rows with null/zero shares outstanding).
    pub error_rows: Vec<EvaluationError>,
}

impl RuleEvaluationOutcome {
    fn aborted(rule: &Rule, error: EvaluationError) -> Self {
        Self {
            rule_id: rule.rule_id,
            rule_name: rule.rule_name.clone(),
            alerted: false,
            calculated_percentage: None,
            triggering_holdings: Vec::new(),
            error: Some(RuleAbort(error)),
            error_rows: Vec::new(),
        }
    }
}

/// Runs every active rule attached to `fund_id` for `mode` against the
/// staged holdings for `trade_id`, in ascending rule-id order.
///
/// `pending_cash_delta` is the cash effect of the trade under evaluation
/// (zero for a portfolio-compliance sweep): a trade parked on COMPLIANCE
/// has not committed yet, but the percentage-of-fund denominators must
/// already reflect the cash it would consume or release, the same way the
/// staged holdings already reflect its shares.
#[instrument(skip(store, oracle))]
pub fn evaluate_fund(
    store: &(impl ReadModel + Writer + ?Sized),
    oracle: &dyn PriceOracle,
    fund_id: i64,
    trade_id: i64,
    mode: AttachmentMode,
    pending_cash_delta: Decimal,
) -> Vec<RuleEvaluationOutcome> {
    let rules = store.attached_rules(fund_id, mode);
    rules
        .into_iter()
        .map(|rule| evaluate_rule(store, oracle, fund_id, trade_id, pending_cash_delta, &rule))
        .collect()
}

#[instrument(skip(store, oracle, rule), fields(rule_id = rule.rule_id))]
pub fn evaluate_rule(
    store: &(impl ReadModel + Writer + ?Sized),
    oracle: &dyn PriceOracle,
    fund_id: i64,
    trade_id: i64,
    pending_cash_delta: Decimal,
    rule: &Rule,
) -> RuleEvaluationOutcome {
    let predicate = match Predicate::compile(rule.normalized_expression()) {
        Ok(p) => p,
        Err(_) => {
            // Rules are validated at create/update time; reaching this
            // branch means stored state regressed after validation.
            return RuleEvaluationOutcome::aborted(
                rule,
                EvaluationError::InvalidExpression {
                    rule_id: rule.rule_id,
                },
            );
        }
    };

    let staged = store.staged_holdings(fund_id, trade_id);
    let joined: Vec<JoinedHoldingRow> = staged
        .iter()
        .filter_map(|row| store.joined_row(fund_id, &row.ticker, row.shares))
        .collect();

    match rule.denominator {
        DenominatorKind::Prohibit => evaluate_prohibit(rule, &predicate, &joined),
        DenominatorKind::PerHoldingSharesOutstanding => evaluate_for_each(rule, &predicate, &joined),
        DenominatorKind::TotalAssets
        | DenominatorKind::NetAssets
        | DenominatorKind::TotalAssetsExCash => {
            evaluate_standard(store, oracle, fund_id, pending_cash_delta, rule, &predicate, &joined)
        }
    }
}

fn evaluate_prohibit(
    rule: &Rule,
    predicate: &Predicate,
    joined: &[JoinedHoldingRow],
) -> RuleEvaluationOutcome {
    let matching: Vec<&JoinedHoldingRow> = joined.iter().filter(|r| predicate.matches(r)).collect();

    if matching.is_empty() {
        debug!(rule_id = rule.rule_id, "prohibit rule passed");
        return RuleEvaluationOutcome {
            rule_id: rule.rule_id,
            rule_name: rule.rule_name.clone(),
            alerted: false,
            calculated_percentage: None,
            triggering_holdings: Vec::new(),
            error: None,
            error_rows: Vec::new(),
        };
    }

    warn!(rule_id = rule.rule_id, count = matching.len(), "prohibit rule triggered");
    RuleEvaluationOutcome {
        rule_id: rule.rule_id,
        rule_name: rule.rule_name.clone(),
        alerted: true,
        calculated_percentage: None,
        triggering_holdings: matching
            .into_iter()
            .map(|r| TriggeringHolding {
                ticker: r.holdings_ticker.clone(),
                shares: r.holdings_shares,
                market_value: None,
                percentage: None,
            })
            .collect(),
        error: None,
        error_rows: Vec::new(),
    }
}

fn evaluate_for_each(
    rule: &Rule,
    predicate: &Predicate,
    joined: &[JoinedHoldingRow],
) -> RuleEvaluationOutcome {
    let direction = rule
        .alert_direction
        .expect("for-each rules always carry an alert direction");
    let threshold = rule
        .alert_threshold
        .expect("for-each rules always carry an alert threshold");

    let mut triggering = Vec::new();
    let mut error_rows = Vec::new();

    for row in joined.iter().filter(|r| predicate.matches(r)) {
        match row.securities_shares_outstanding {
            None | Some(0) => {
                error_rows.push(EvaluationError::NullSharesOutstanding {
                    ticker: row.holdings_ticker.clone(),
                });
                continue;
            }
            Some(outstanding) => {
                let pct = valuator::percentage(
                    Decimal::from(row.holdings_shares),
                    Decimal::from(outstanding),
                );
                if direction.triggers(pct, threshold) {
                    triggering.push(TriggeringHolding {
                        ticker: row.holdings_ticker.clone(),
                        shares: row.holdings_shares,
                        market_value: None,
                        percentage: Some(pct),
                    });
                }
            }
        }
    }

    let alerted = !triggering.is_empty();
    if alerted {
        warn!(rule_id = rule.rule_id, count = triggering.len(), "for-each rule triggered");
    }

    RuleEvaluationOutcome {
        rule_id: rule.rule_id,
        rule_name: rule.rule_name.clone(),
        alerted,
        calculated_percentage: None,
        triggering_holdings: triggering,
        error: None,
        error_rows,
    }
}

fn evaluate_standard(
    store: &(impl ReadModel + Writer + ?Sized),
    oracle: &dyn PriceOracle,
    fund_id: i64,
    pending_cash_delta: Decimal,
    rule: &Rule,
    predicate: &Predicate,
    joined: &[JoinedHoldingRow],
) -> RuleEvaluationOutcome {
    let Some(fund) = store.fund(fund_id) else {
        return RuleEvaluationOutcome::aborted(rule, EvaluationError::FundNotFound(fund_id));
    };

    let all_tickers: Vec<(&str, i64)> = joined
        .iter()
        .map(|r| (r.holdings_ticker.as_str(), r.holdings_shares))
        .collect();

    // The staged holdings already reflect this trade's post-trade shares;
    // the fund's committed cash does not update until commit, so the
    // trade's own cash effect is projected in here too.
    let projected_cash = fund.cash + pending_cash_delta;
    let denominator_agg =
        valuator::denominator_value(rule.denominator, oracle, projected_cash, all_tickers)
            .expect("standard rule dispatch always carries a percentage-of-fund denominator");

    if let Some(ticker) = denominator_agg.unpriced_tickers.first() {
        return RuleEvaluationOutcome::aborted(
            rule,
            EvaluationError::MissingPrice {
                ticker: ticker.clone(),
            },
        );
    }

    if denominator_agg.total.is_zero() {
        return RuleEvaluationOutcome::aborted(
            rule,
            EvaluationError::ZeroDenominator {
                denominator_kind: rule.denominator,
            },
        );
    }

    let matching: Vec<&JoinedHoldingRow> = joined.iter().filter(|r| predicate.matches(r)).collect();
    let matching_tickers: Vec<(&str, i64)> = matching
        .iter()
        .map(|r| (r.holdings_ticker.as_str(), r.holdings_shares))
        .collect();

    let numerator_agg = valuator::holdings_market_value(oracle, matching_tickers);
    if let Some(ticker) = numerator_agg.unpriced_tickers.first() {
        return RuleEvaluationOutcome::aborted(
            rule,
            EvaluationError::MissingPrice {
                ticker: ticker.clone(),
            },
        );
    }

    let pct = valuator::percentage(numerator_agg.total, denominator_agg.total);
    let direction = rule
        .alert_direction
        .expect("standard rules always carry an alert direction");
    let threshold = rule
        .alert_threshold
        .expect("standard rules always carry an alert threshold");
    let alerted = direction.triggers(pct, threshold);

    if alerted {
        warn!(rule_id = rule.rule_id, pct = %pct, "standard rule triggered");
    } else {
        debug!(rule_id = rule.rule_id, pct = %pct, "standard rule did not trigger");
    }

    let triggering_holdings = matching
        .into_iter()
        .map(|r| {
            let market_value = valuator::value_holding(oracle, &r.holdings_ticker, r.holdings_shares);
            let market_value = match market_value {
                valuator::HoldingValuation::Known { market_value, .. } => Some(market_value),
                valuator::HoldingValuation::UnknownPrice { .. } => None,
            };
            TriggeringHolding {
                ticker: r.holdings_ticker.clone(),
                shares: r.holdings_shares,
                market_value,
                percentage: None,
            }
        })
        .collect();

    RuleEvaluationOutcome {
        rule_id: rule.rule_id,
        rule_name: rule.rule_name.clone(),
        alerted,
        calculated_percentage: Some(pct),
        triggering_holdings,
        error: None,
        error_rows: Vec::new(),
    }
}
