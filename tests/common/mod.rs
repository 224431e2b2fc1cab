use std::sync::Arc;

use chrono::NaiveDate;
use compliance_engine::clock::FixedClock;
use compliance_engine::domain::issuer::CountryCode;
use compliance_engine::domain::rule::AlertDirection;
use compliance_engine::domain::{DenominatorKind, Fund, Holding, Issuer, Rule, Security};
use compliance_engine::memory_store::MemoryStore;
use compliance_engine::{create_and_attach_rule, ComplianceEngine};
use rust_decimal::Decimal;

pub const FUND_ID: i64 = 1;
pub const TECH_ISSUER_ID: i64 = 1;
pub const US_ISSUER_ID: i64 = 2;

pub fn fixed_clock() -> Arc<FixedClock> {
    let offset = chrono::FixedOffset::west_opt(5 * 3600).unwrap();
    let start = chrono::DateTime::parse_from_rfc3339("2026-01-15T09:30:00-05:00")
        .unwrap()
        .with_timezone(&offset);
    Arc::new(FixedClock::new(start))
}

fn information_technology_issuer() -> Issuer {
    Issuer {
        issuer_id: TECH_ISSUER_ID,
        name: "Information Technology Issuer".to_string(),
        gics_sector: "Information Technology".to_string(),
        gics_industry_group: "Technology Hardware".to_string(),
        gics_industry: "Technology Hardware".to_string(),
        gics_sub_industry: "Technology Hardware, Storage & Peripherals".to_string(),
        country_domicile: "United States".to_string(),
        country_incorporation: "United States".to_string(),
        country_domicile_code: CountryCode::new("USA").unwrap(),
        country_incorporation_code: CountryCode::new("USA").unwrap(),
    }
}

/// A North Korea-incorporated issuer, used to exercise the prohibited
/// countries of incorporation rule.
pub fn sanctioned_issuer() -> Issuer {
    Issuer {
        issuer_id: US_ISSUER_ID,
        name: "Sanctioned Holdings Ltd".to_string(),
        gics_sector: "Materials".to_string(),
        gics_industry_group: "Metals & Mining".to_string(),
        gics_industry: "Metals & Mining".to_string(),
        gics_sub_industry: "Diversified Metals & Mining".to_string(),
        country_domicile: "North Korea".to_string(),
        country_incorporation: "North Korea".to_string(),
        country_domicile_code: CountryCode::new("PRK").unwrap(),
        country_incorporation_code: CountryCode::new("PRK").unwrap(),
    }
}

pub fn security(ticker: &str, issuer_id: i64, shares_outstanding: Option<u64>) -> Security {
    Security {
        ticker: ticker.to_string(),
        name: format!("{ticker} Inc"),
        security_type: "equity".to_string(),
        issuer_id,
        shares_outstanding,
    }
}

/// Seeds a fund with `cash`, the AAPL/MSFT securities (both
/// Information-Technology issuers), and a price for each ticker supplied.
pub fn seed_fund(store: &MemoryStore, cash: Decimal, prices: &[(&str, Decimal)]) {
    store.insert_fund(Fund::new(FUND_ID, "Test Fund", cash));
    store.insert_issuer(information_technology_issuer());
    for (ticker, price) in prices {
        store.insert_security(security(ticker, TECH_ISSUER_ID, None));
        store.insert_price(ticker, NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(), *price);
    }
}

pub fn sector_cap_rule(rule_id: i64, threshold: Decimal) -> Rule {
    Rule {
        rule_id,
        rule_name: format!("sector-cap-{rule_id}"),
        alert_message: "Information Technology sector concentration exceeds cap".to_string(),
        evaluate_on_trade: true,
        evaluate_on_portfolio: true,
        expression: "issuers.gics_sector = 'Information Technology'".to_string(),
        denominator: DenominatorKind::TotalAssets,
        alert_direction: Some(AlertDirection::Above),
        alert_threshold: Some(threshold),
        active: true,
    }
}

pub fn prohibit_sanctioned_countries_rule(rule_id: i64) -> Rule {
    Rule {
        rule_id,
        rule_name: format!("prohibit-sanctioned-{rule_id}"),
        alert_message: "Holding in a prohibited country of incorporation".to_string(),
        evaluate_on_trade: true,
        evaluate_on_portfolio: true,
        expression: "issuers.country_incorporation_code IN ('PRK', 'MMR', 'TKM')".to_string(),
        denominator: DenominatorKind::Prohibit,
        alert_direction: None,
        alert_threshold: None,
        active: true,
    }
}

pub fn for_each_ownership_rule(rule_id: i64, threshold: Decimal) -> Rule {
    Rule {
        rule_id,
        rule_name: format!("for-each-ownership-{rule_id}"),
        alert_message: "Holding exceeds ownership limit of outstanding shares".to_string(),
        evaluate_on_trade: true,
        evaluate_on_portfolio: true,
        expression: "".to_string(),
        denominator: DenominatorKind::PerHoldingSharesOutstanding,
        alert_direction: Some(AlertDirection::Above),
        alert_threshold: Some(threshold),
        active: true,
    }
}

pub fn insert_holding(store: &MemoryStore, ticker: &str, shares: i64) {
    store.insert_holding(Holding {
        fund_id: FUND_ID,
        ticker: ticker.to_string(),
        shares,
    });
}

pub fn attach(store: &MemoryStore, rule: Rule) {
    create_and_attach_rule(store, rule, FUND_ID).expect("rule attaches cleanly in fixture");
}

pub fn engine_with(store: Arc<MemoryStore>) -> ComplianceEngine {
    ComplianceEngine::new(store, fixed_clock())
}
