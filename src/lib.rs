//! A pre-trade and portfolio investment-compliance engine: it prices a
//! proposed trade, checks it against available cash/shares, projects the
//! holdings it would produce, runs that projection against a fund's
//! attached rules, and either settles the trade or parks it behind the
//! alerts it raised pending override or cancellation.
//!
//! [`ComplianceEngine`] is the public entry point, composing the trade
//! orchestrator, rule engine, and alert lifecycle over a storage-agnostic
//! [`store::Store`]. [`memory_store::MemoryStore`] is the in-process
//! reference implementation used here and by the CLI binary.

pub mod clock;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod lock;
pub mod memory_store;
pub mod orchestrator;
pub mod predicate;
pub mod staging;
pub mod store;
pub mod valuator;

use std::sync::Arc;

use domain::{Alert, Rule, RuleAttachment, Trade, TradeDirection};
use engine::RuleEvaluationOutcome;
use error::ComplianceResult;
use lock::FundLocks;
use orchestrator::{Orchestrator, SubmitOutcome};

/// Counts of alerts by status for a fund, plus how many fired in the last
/// rolling 24 hours against the engine's clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlertSummary {
    pub pending: usize,
    pub overridden: usize,
    pub cancelled: usize,
    pub last_24h: usize,
}

/// The facade over the compliance pipeline: submit a trade, resolve its
/// alerts, run a standalone portfolio sweep, and query alert history.
pub struct ComplianceEngine {
    store: Arc<dyn store::Store>,
    orchestrator: Orchestrator,
    clock: Arc<dyn clock::EngineClock>,
}

impl ComplianceEngine {
    pub fn new(store: Arc<dyn store::Store>, clock: Arc<dyn clock::EngineClock>) -> Self {
        let locks = Arc::new(FundLocks::new());
        let orchestrator = Orchestrator::new(store.clone(), locks, clock.clone());
        Self {
            store,
            orchestrator,
            clock,
        }
    }

    pub async fn submit_trade(
        &self,
        fund_id: i64,
        ticker: &str,
        direction: TradeDirection,
        shares: i64,
    ) -> ComplianceResult<SubmitOutcome> {
        self.orchestrator
            .submit_trade(fund_id, ticker, direction, shares)
            .await
    }

    pub fn run_portfolio_compliance(&self, fund_id: i64) -> ComplianceResult<Vec<RuleEvaluationOutcome>> {
        self.orchestrator.run_portfolio_compliance(fund_id)
    }

    pub async fn override_alert(&self, alert_id: i64, reason: &str) -> ComplianceResult<Alert> {
        self.orchestrator.override_alert(alert_id, reason).await
    }

    pub async fn cancel_alert(&self, alert_id: i64) -> ComplianceResult<Alert> {
        self.orchestrator.cancel_alert(alert_id).await
    }

    pub fn trade(&self, trade_id: i64) -> Option<Trade> {
        self.store.trade(trade_id)
    }

    pub fn alerts_for_fund(&self, fund_id: i64) -> Vec<Alert> {
        self.store.alerts_for_fund(fund_id)
    }

    pub fn alerts_for_trade(&self, trade_id: i64) -> Vec<Alert> {
        self.store.alerts_for_trade(trade_id)
    }

    /// Summarizes a fund's alerts by status, plus a rolling 24-hour count
    /// measured against the engine's clock.
    pub fn alert_summary(&self, fund_id: i64) -> AlertSummary {
        let alerts = self.store.alerts_for_fund(fund_id);
        let now = self.clock.now();
        let window_start = now - chrono::Duration::hours(24);

        let mut summary = AlertSummary::default();
        for alert in &alerts {
            match alert.status {
                domain::AlertStatus::Pending => summary.pending += 1,
                domain::AlertStatus::Overridden => summary.overridden += 1,
                domain::AlertStatus::Cancelled => summary.cancelled += 1,
            }
            if alert.created_at >= window_start {
                summary.last_24h += 1;
            }
        }
        summary
    }

    pub fn store(&self) -> &Arc<dyn store::Store> {
        &self.store
    }
}

/// Re-grounds a raw rule definition into a persisted, attached `Rule`.
/// Thin convenience wrapper over [`memory_store::MemoryStore::create_rule`]
/// and `attach_rule` for callers that only have a `dyn Store` and still
/// need rule-authoring (the CLI's use case); a real deployment would
/// expose rule authoring through its own admin surface instead.
pub fn create_and_attach_rule(
    memory: &memory_store::MemoryStore,
    rule: Rule,
    fund_id: i64,
) -> ComplianceResult<RuleAttachment> {
    memory.create_rule(rule.clone())?;
    memory.attach_rule(rule.rule_id, fund_id)
}
