use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::rule::DenominatorKind;

pub type ComplianceResult<T> = Result<T, ComplianceError>;

/// Top-level error taxonomy for the compliance engine.
///
/// Every variant is a distinct sub-enum so callers can match on the
/// structured remedial payload instead of parsing a message. This mirrors
/// the six error kinds named in the compliance design: validation,
/// availability, evaluation, conflict, not-found, internal.
#[derive(Debug, Error)]
pub enum ComplianceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Availability(#[from] AvailabilityError),

    #[error(transparent)]
    Evaluation(#[from] EvaluationError),

    #[error(transparent)]
    Conflict(#[from] ConflictError),

    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Rejected input: malformed trades, unknown references, bad rule syntax.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("fund id must be a positive integer, got {0}")]
    InvalidFundId(i64),

    #[error("ticker must be a non-empty string")]
    EmptyTicker,

    #[error(
        "rule '{rule_name}': alert_direction and alert_threshold must both be set unless \
         denominator is 'prohibit', and both unset when it is"
    )]
    InvalidDirection { rule_name: String },

    #[error("shares must be a positive integer >= 1, got {0}")]
    InvalidShares(i64),

    #[error("no price on record for ticker '{0}'")]
    NoPriceAvailable(String),

    #[error("rule expression failed to parse: {0}")]
    ExpressionSyntax(String),

    #[error("forbidden keyword '{keyword}' in rule expression")]
    ForbiddenKeyword { keyword: String },

    #[error("rule expression references unknown column '{0}'")]
    UnknownColumn(String),

    #[error("rule expression failed validation probe: {0}")]
    ProbeFailed(String),

    #[error("{field}: {message}")]
    Field { field: String, message: String },
}

/// Business-logical refusal: a valid request the fund cannot presently honor.
#[derive(Debug, Error)]
pub enum AvailabilityError {
    #[error(
        "you tried to place a BUY order for {shares} shares of {ticker} at a price of \
         ${price}, which would cost ${total_value}; however, the fund only has \
         ${cash_available} in cash, a shortfall of ${shortfall}. Please adjust your order to \
         {max_affordable_shares} shares or fewer."
    )]
    InsufficientCash {
        ticker: String,
        shares: i64,
        price: Decimal,
        total_value: Decimal,
        cash_available: Decimal,
        shortfall: Decimal,
        max_affordable_shares: i64,
    },

    #[error("trading with zero cash is not allowed")]
    ZeroCashTrading,

    #[error("the fund does not hold ticker '{ticker}'")]
    NoSuchHolding { ticker: String },

    #[error(
        "you tried to place a SELL order for {requested} shares of {ticker}; however, the \
         fund only holds {held} shares. Please adjust your order to {held} shares or fewer."
    )]
    InsufficientShares {
        ticker: String,
        requested: i64,
        held: i64,
    },
}

/// The compliance engine could not reach a verdict for a rule.
#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error("no price on record for ticker '{ticker}', cannot value holding")]
    MissingPrice { ticker: String },

    #[error("shares outstanding is null or zero for ticker '{ticker}'")]
    NullSharesOutstanding { ticker: String },

    #[error("denominator '{denominator_kind:?}' evaluated to zero")]
    ZeroDenominator { denominator_kind: DenominatorKind },

    #[error("fund '{0}' not found while evaluating denominator")]
    FundNotFound(i64),

    #[error("rule {rule_id} expression failed to recompile at evaluation time")]
    InvalidExpression { rule_id: i64 },
}

/// A state-machine transition that the current state forbids.
#[derive(Debug, Error)]
pub enum ConflictError {
    #[error("trade {trade_id} is in terminal state {status:?} and cannot be {attempted}")]
    InvalidTransition {
        trade_id: i64,
        status: String,
        attempted: String,
    },

    #[error("alert {0} has already been overridden with reason '{1}'")]
    AlreadyOverridden(i64, String),

    #[error("rule {rule_id} is already attached to fund {fund_id}")]
    DuplicateAttachment { rule_id: i64, fund_id: i64 },

    #[error("rule name '{0}' already in use")]
    DuplicateRuleName(String),

    #[error("override reason must not be empty")]
    EmptyOverrideReason,

    #[error(
        "trade {trade_id} still has {pending} pending alert(s); override every alert before \
         it can settle"
    )]
    AlertsStillPending { trade_id: i64, pending: usize },
}

/// Missing entity by id.
#[derive(Debug, Error)]
pub enum NotFoundError {
    #[error("fund {0} not found")]
    Fund(i64),

    #[error("security '{0}' not found")]
    Security(String),

    #[error("trade {0} not found")]
    Trade(i64),

    #[error("rule {0} not found")]
    Rule(i64),

    #[error("alert {0} not found")]
    Alert(i64),
}
