//! The external-collaborator interfaces the compliance pipeline depends on.
//!
//! `spec.md` treats persistence as an external collaborator with three
//! contracts: a read model, a transactional writer, and a rule predicate
//! evaluator (the latter lives in [`crate::predicate`]). These traits are
//! that boundary, expressed as Rust traits so the pipeline is storage-
//! agnostic; [`crate::memory_store::MemoryStore`] is the in-process
//! reference implementation used by tests and the CLI.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::domain::{Alert, Fund, Holding, Rule, Security, StagedHolding, Trade};
use crate::error::ComplianceResult;

/// Returns the most recent price for a ticker as of a given logical time.
/// Pure read; no interpolation.
pub trait PriceOracle: Send + Sync {
    /// Price on the highest `price_date` on record for the ticker.
    fn latest_price(&self, ticker: &str) -> Option<Decimal>;

    /// Exact match on `price_date`; no nearest-neighbour fallback.
    fn price_on(&self, ticker: &str, date: NaiveDate) -> Option<Decimal>;
}

/// The stable joined-row schema the rule predicate evaluator runs against:
/// one staged holding joined with its security and issuer attributes.
#[derive(Debug, Clone)]
pub struct JoinedHoldingRow {
    pub holdings_ticker: String,
    pub holdings_shares: i64,
    pub holdings_fund_id: i64,
    pub securities_ticker: String,
    pub securities_name: String,
    pub securities_type: String,
    pub securities_shares_outstanding: Option<u64>,
    pub issuers_name: String,
    pub issuers_gics_sector: String,
    pub issuers_gics_industry_grp: String,
    pub issuers_gics_industry: String,
    pub issuers_gics_sub_industry: String,
    pub issuers_country_domicile: String,
    pub issuers_country_incorporation: String,
    pub issuers_country_domicile_code: String,
    pub issuers_country_incorporation_code: String,
}

/// Which mode a rule must be enabled for to be considered "attached" for a
/// given compliance run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentMode {
    Trade,
    Portfolio,
}

/// A read model over funds, holdings, securities, issuers, and prices.
pub trait ReadModel: Send + Sync {
    fn fund(&self, fund_id: i64) -> Option<Fund>;
    fn security(&self, ticker: &str) -> Option<Security>;
    fn holding(&self, fund_id: i64, ticker: &str) -> Option<Holding>;
    fn holdings_for_fund(&self, fund_id: i64) -> Vec<Holding>;

    /// Active rules attached (active attachment) to `fund_id` whose mode
    /// flag for `mode` is set, in ascending rule-id order.
    fn attached_rules(&self, fund_id: i64, mode: AttachmentMode) -> Vec<Rule>;

    /// Builds the joined row the predicate evaluator runs against for a
    /// single staged holding. `None` if the ticker has no known security.
    fn joined_row(&self, fund_id: i64, ticker: &str, shares: i64) -> Option<JoinedHoldingRow>;
}

/// The single transactional boundary that persists committed staging into
/// holdings, adjusts cash, and transitions a trade; plus the durable
/// (but independently-boundaried) mutations around it: staging,
/// trade/alert creation and status transitions.
pub trait Writer: Send + Sync {
    fn stage_holdings(&self, fund_id: i64, trade_id: i64, rows: Vec<StagedHolding>);
    fn staged_holdings(&self, fund_id: i64, trade_id: i64) -> Vec<StagedHolding>;
    fn drain_staging(&self, fund_id: i64, trade_id: i64);

    /// Applies `shares_delta` to `ticker`'s live holding for `fund_id` (the
    /// row is removed once it reaches zero or below), applies `cash_delta`
    /// to the fund's cash, and drains staging for `(fund_id, trade_id)` —
    /// all within one atomic boundary. Touches only the one ticker the
    /// trade moves; it never replays the trade's staged snapshot of the
    /// whole fund, which may have gone stale while the trade sat on ALERT.
    fn commit_trade(
        &self,
        fund_id: i64,
        trade_id: i64,
        ticker: &str,
        shares_delta: i64,
        cash_delta: Decimal,
    ) -> ComplianceResult<()>;

    fn next_trade_id(&self) -> i64;
    fn create_trade(&self, trade: Trade) -> ComplianceResult<()>;
    fn trade(&self, trade_id: i64) -> Option<Trade>;
    fn update_trade(&self, trade: Trade) -> ComplianceResult<()>;

    fn next_alert_id(&self) -> i64;
    fn create_alert(&self, alert: Alert) -> ComplianceResult<Alert>;
    fn alert(&self, alert_id: i64) -> Option<Alert>;
    fn update_alert(&self, alert: Alert) -> ComplianceResult<()>;
    fn alerts_for_trade(&self, trade_id: i64) -> Vec<Alert>;
    fn alerts_for_fund(&self, fund_id: i64) -> Vec<Alert>;
}

/// The full external-collaborator surface the orchestrator needs, rolled
/// into one object-safe trait so `ComplianceEngine` can hold a single
/// `Arc<dyn Store>` rather than three.
pub trait Store: ReadModel + Writer + PriceOracle {}

impl<T: ReadModel + Writer + PriceOracle + ?Sized> Store for T {}
