//! In-process reference implementation of [`ReadModel`], [`Writer`], and
//! [`PriceOracle`]. Used by the CLI and by every test in this crate; a real
//! deployment would swap this module out for a database-backed one without
//! touching the pipeline above it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::domain::{
    Alert, Fund, Holding, Issuer, PricePoint, Rule, RuleAttachment, Security, StagedHolding,
    Trade,
};
use crate::error::{ComplianceResult, ConflictError, NotFoundError, ValidationError};
use crate::predicate::Predicate;
use crate::store::{AttachmentMode, JoinedHoldingRow, PriceOracle, ReadModel, Writer};

#[derive(Default)]
pub struct MemoryStore {
    funds: Mutex<HashMap<i64, Fund>>,
    issuers: Mutex<HashMap<i64, Issuer>>,
    securities: Mutex<HashMap<String, Security>>,
    holdings: Mutex<HashMap<(i64, String), Holding>>,
    prices: Mutex<HashMap<String, Vec<PricePoint>>>,
    rules: Mutex<HashMap<i64, Rule>>,
    attachments: Mutex<Vec<RuleAttachment>>,
    staging: Mutex<HashMap<(i64, i64), Vec<StagedHolding>>>,
    trades: Mutex<HashMap<i64, Trade>>,
    alerts: Mutex<HashMap<i64, Alert>>,
    next_trade_id: AtomicI64,
    next_alert_id: AtomicI64,
    next_attachment_id: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_fund(&self, fund: Fund) {
        self.funds.lock().expect("funds lock poisoned").insert(fund.fund_id, fund);
    }

    pub fn insert_issuer(&self, issuer: Issuer) {
        self.issuers
            .lock()
            .expect("issuers lock poisoned")
            .insert(issuer.issuer_id, issuer);
    }

    pub fn insert_security(&self, security: Security) {
        let key = Security::canonical_ticker(&security.ticker);
        self.securities
            .lock()
            .expect("securities lock poisoned")
            .insert(key, security);
    }

    pub fn insert_holding(&self, holding: Holding) {
        let key = (holding.fund_id, Security::canonical_ticker(&holding.ticker));
        self.holdings.lock().expect("holdings lock poisoned").insert(key, holding);
    }

    pub fn insert_price(&self, ticker: &str, price_date: NaiveDate, price: Decimal) {
        let key = Security::canonical_ticker(ticker);
        let mut prices = self.prices.lock().expect("prices lock poisoned");
        prices.entry(key.clone()).or_default().push(PricePoint {
            ticker: key,
            price_date,
            price,
        });
    }

    /// Registers a rule, rejecting a duplicate `rule_name`, a filter
    /// expression that fails to parse/validate, or a direction/threshold
    /// that disagrees with the denominator (`Some` for every kind except
    /// `prohibit`, `None` for `prohibit`).
    pub fn create_rule(&self, rule: Rule) -> ComplianceResult<()> {
        Predicate::compile(rule.normalized_expression())?;

        let directional_fields_set = rule.alert_direction.is_some() && rule.alert_threshold.is_some();
        let directional_fields_unset = rule.alert_direction.is_none() && rule.alert_threshold.is_none();
        let direction_matches_denominator = if rule.denominator.is_prohibit() {
            directional_fields_unset
        } else {
            directional_fields_set
        };
        if !direction_matches_denominator {
            return Err(ValidationError::InvalidDirection {
                rule_name: rule.rule_name,
            }
            .into());
        }

        let mut rules = self.rules.lock().expect("rules lock poisoned");
        if rules.values().any(|r| r.rule_name == rule.rule_name) {
            return Err(ConflictError::DuplicateRuleName(rule.rule_name).into());
        }
        rules.insert(rule.rule_id, rule);
        Ok(())
    }

    pub fn rule(&self, rule_id: i64) -> Option<Rule> {
        self.rules.lock().expect("rules lock poisoned").get(&rule_id).cloned()
    }

    pub fn next_rule_id(&self) -> i64 {
        let rules = self.rules.lock().expect("rules lock poisoned");
        rules.keys().max().copied().unwrap_or(0) + 1
    }

    /// Attaches `rule_id` to `fund_id`, rejecting a duplicate active
    /// attachment.
    pub fn attach_rule(&self, rule_id: i64, fund_id: i64) -> ComplianceResult<RuleAttachment> {
        if !self.rules.lock().expect("rules lock poisoned").contains_key(&rule_id) {
            return Err(NotFoundError::Rule(rule_id).into());
        }

        let mut attachments = self.attachments.lock().expect("attachments lock poisoned");
        if attachments
            .iter()
            .any(|a| a.rule_id == rule_id && a.fund_id == fund_id && a.active)
        {
            return Err(ConflictError::DuplicateAttachment { rule_id, fund_id }.into());
        }

        let attachment = RuleAttachment {
            attachment_id: self.next_attachment_id.fetch_add(1, Ordering::SeqCst) + 1,
            rule_id,
            fund_id,
            active: true,
        };
        attachments.push(attachment.clone());
        Ok(attachment)
    }
}

impl ReadModel for MemoryStore {
    fn fund(&self, fund_id: i64) -> Option<Fund> {
        self.funds.lock().expect("funds lock poisoned").get(&fund_id).cloned()
    }

    fn security(&self, ticker: &str) -> Option<Security> {
        let key = Security::canonical_ticker(ticker);
        self.securities.lock().expect("securities lock poisoned").get(&key).cloned()
    }

    fn holding(&self, fund_id: i64, ticker: &str) -> Option<Holding> {
        let key = (fund_id, Security::canonical_ticker(ticker));
        self.holdings.lock().expect("holdings lock poisoned").get(&key).cloned()
    }

    fn holdings_for_fund(&self, fund_id: i64) -> Vec<Holding> {
        self.holdings
            .lock()
            .expect("holdings lock poisoned")
            .values()
            .filter(|h| h.fund_id == fund_id)
            .cloned()
            .collect()
    }

    fn attached_rules(&self, fund_id: i64, mode: AttachmentMode) -> Vec<Rule> {
        let attachments = self.attachments.lock().expect("attachments lock poisoned");
        let rules = self.rules.lock().expect("rules lock poisoned");

        let mut result: Vec<Rule> = attachments
            .iter()
            .filter(|a| a.fund_id == fund_id && a.active)
            .filter_map(|a| rules.get(&a.rule_id).cloned())
            .filter(|r| r.active)
            .filter(|r| match mode {
                AttachmentMode::Trade => r.evaluate_on_trade,
                AttachmentMode::Portfolio => r.evaluate_on_portfolio,
            })
            .collect();
        result.sort_by_key(|r| r.rule_id);
        result
    }

    fn joined_row(&self, fund_id: i64, ticker: &str, shares: i64) -> Option<JoinedHoldingRow> {
        let key = Security::canonical_ticker(ticker);
        let security = self
            .securities
            .lock()
            .expect("securities lock poisoned")
            .get(&key)
            .cloned()?;
        let issuer = self
            .issuers
            .lock()
            .expect("issuers lock poisoned")
            .get(&security.issuer_id)
            .cloned()?;

        Some(JoinedHoldingRow {
            holdings_ticker: key,
            holdings_shares: shares,
            holdings_fund_id: fund_id,
            securities_ticker: security.ticker,
            securities_name: security.name,
            securities_type: security.security_type,
            securities_shares_outstanding: security.shares_outstanding,
            issuers_name: issuer.name,
            issuers_gics_sector: issuer.gics_sector,
            issuers_gics_industry_grp: issuer.gics_industry_group,
            issuers_gics_industry: issuer.gics_industry,
            issuers_gics_sub_industry: issuer.gics_sub_industry,
            issuers_country_domicile: issuer.country_domicile,
            issuers_country_incorporation: issuer.country_incorporation,
            issuers_country_domicile_code: issuer.country_domicile_code.to_string(),
            issuers_country_incorporation_code: issuer.country_incorporation_code.to_string(),
        })
    }
}

impl PriceOracle for MemoryStore {
    fn latest_price(&self, ticker: &str) -> Option<Decimal> {
        let key = Security::canonical_ticker(ticker);
        self.prices
            .lock()
            .expect("prices lock poisoned")
            .get(&key)
            .and_then(|points| points.iter().max_by_key(|p| p.price_date))
            .map(|p| p.price)
    }

    fn price_on(&self, ticker: &str, date: NaiveDate) -> Option<Decimal> {
        let key = Security::canonical_ticker(ticker);
        self.prices
            .lock()
            .expect("prices lock poisoned")
            .get(&key)
            .and_then(|points| points.iter().find(|p| p.price_date == date))
            .map(|p| p.price)
    }
}

impl Writer for MemoryStore {
    fn stage_holdings(&self, fund_id: i64, trade_id: i64, rows: Vec<StagedHolding>) {
        self.staging
            .lock()
            .expect("staging lock poisoned")
            .insert((fund_id, trade_id), rows);
    }

    fn staged_holdings(&self, fund_id: i64, trade_id: i64) -> Vec<StagedHolding> {
        self.staging
            .lock()
            .expect("staging lock poisoned")
            .get(&(fund_id, trade_id))
            .cloned()
            .unwrap_or_default()
    }

    fn drain_staging(&self, fund_id: i64, trade_id: i64) {
        self.staging
            .lock()
            .expect("staging lock poisoned")
            .remove(&(fund_id, trade_id));
    }

    fn commit_trade(
        &self,
        fund_id: i64,
        trade_id: i64,
        ticker: &str,
        shares_delta: i64,
        cash_delta: Decimal,
    ) -> ComplianceResult<()> {
        let ticker = Security::canonical_ticker(ticker);
        let key = (fund_id, ticker.clone());

        let mut holdings = self.holdings.lock().expect("holdings lock poisoned");
        let current_shares = holdings.get(&key).map(|h| h.shares).unwrap_or(0);
        let new_shares = current_shares + shares_delta;
        if new_shares <= 0 {
            holdings.remove(&key);
        } else {
            holdings.insert(
                key,
                Holding {
                    fund_id,
                    ticker,
                    shares: new_shares,
                },
            );
        }
        drop(holdings);

        let mut funds = self.funds.lock().expect("funds lock poisoned");
        let fund = funds.get_mut(&fund_id).ok_or(NotFoundError::Fund(fund_id))?;
        fund.cash += cash_delta;
        drop(funds);

        self.drain_staging(fund_id, trade_id);
        Ok(())
    }

    fn next_trade_id(&self) -> i64 {
        self.next_trade_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn create_trade(&self, trade: Trade) -> ComplianceResult<()> {
        self.trades.lock().expect("trades lock poisoned").insert(trade.trade_id, trade);
        Ok(())
    }

    fn trade(&self, trade_id: i64) -> Option<Trade> {
        self.trades.lock().expect("trades lock poisoned").get(&trade_id).cloned()
    }

    fn update_trade(&self, trade: Trade) -> ComplianceResult<()> {
        self.trades.lock().expect("trades lock poisoned").insert(trade.trade_id, trade);
        Ok(())
    }

    fn next_alert_id(&self) -> i64 {
        self.next_alert_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn create_alert(&self, alert: Alert) -> ComplianceResult<Alert> {
        self.alerts
            .lock()
            .expect("alerts lock poisoned")
            .insert(alert.alert_id, alert.clone());
        Ok(alert)
    }

    fn alert(&self, alert_id: i64) -> Option<Alert> {
        self.alerts.lock().expect("alerts lock poisoned").get(&alert_id).cloned()
    }

    fn update_alert(&self, alert: Alert) -> ComplianceResult<()> {
        self.alerts.lock().expect("alerts lock poisoned").insert(alert.alert_id, alert);
        Ok(())
    }

    fn alerts_for_trade(&self, trade_id: i64) -> Vec<Alert> {
        self.alerts
            .lock()
            .expect("alerts lock poisoned")
            .values()
            .filter(|a| a.trade_id == Some(trade_id))
            .cloned()
            .collect()
    }

    fn alerts_for_fund(&self, fund_id: i64) -> Vec<Alert> {
        self.alerts
            .lock()
            .expect("alerts lock poisoned")
            .values()
            .filter(|a| a.fund_id == fund_id)
            .cloned()
            .collect()
    }
}
