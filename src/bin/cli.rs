//! A line-oriented demonstration driver over `MemoryStore`, standing in for
//! the HTTP surface that is out of scope for this crate. Seeds a single
//! fund with a handful of holdings/securities/rules, then exercises the
//! same public API an HTTP layer would call.

use std::sync::Arc;

use compliance_engine::clock::SystemClock;
use compliance_engine::config::EngineConfig;
use compliance_engine::domain::rule::AlertDirection;
use compliance_engine::domain::{DenominatorKind, Fund, Holding, Issuer, Rule, Security, TradeDirection};
use compliance_engine::memory_store::MemoryStore;
use compliance_engine::{create_and_attach_rule, ComplianceEngine};
use rust_decimal_macros::dec;
use tracing_subscriber::EnvFilter;

fn seed(store: &MemoryStore) {
    use compliance_engine::domain::issuer::CountryCode;

    store.insert_fund(Fund::new(1, "Demo Growth Fund", dec!(1_000_000.00)));

    store.insert_issuer(Issuer {
        issuer_id: 1,
        name: "Apple Inc".to_string(),
        gics_sector: "Information Technology".to_string(),
        gics_industry_group: "Technology Hardware".to_string(),
        gics_industry: "Technology Hardware".to_string(),
        gics_sub_industry: "Technology Hardware, Storage & Peripherals".to_string(),
        country_domicile: "United States".to_string(),
        country_incorporation: "United States".to_string(),
        country_domicile_code: CountryCode::new("USA").unwrap(),
        country_incorporation_code: CountryCode::new("USA").unwrap(),
    });
    store.insert_security(Security {
        ticker: "AAPL".to_string(),
        name: "Apple Inc".to_string(),
        security_type: "equity".to_string(),
        issuer_id: 1,
        shares_outstanding: Some(15_000_000_000),
    });
    store.insert_price("AAPL", chrono::Utc::now().date_naive(), dec!(150.00));
    store.insert_holding(Holding {
        fund_id: 1,
        ticker: "AAPL".to_string(),
        shares: 1000,
    });

    create_and_attach_rule(
        store,
        Rule {
            rule_id: 1,
            rule_name: "Sector concentration cap".to_string(),
            alert_message: "Technology sector concentration exceeds threshold".to_string(),
            evaluate_on_trade: true,
            evaluate_on_portfolio: true,
            expression: "issuers.gics_sector = 'Information Technology'".to_string(),
            denominator: DenominatorKind::TotalAssets,
            alert_direction: Some(AlertDirection::Above),
            alert_threshold: Some(dec!(50.0)),
            active: true,
        },
        1,
    )
    .expect("seed rule attaches cleanly");
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(
            EngineConfig::from_env().log_level.to_string().parse().unwrap(),
        ))
        .init();

    let store = Arc::new(MemoryStore::new());
    seed(&store);

    let clock = Arc::new(SystemClock {
        offset: EngineConfig::default().timezone_offset,
    });
    let engine = ComplianceEngine::new(store, clock);

    let outcome = engine
        .submit_trade(1, "AAPL", TradeDirection::Buy, 500)
        .await;

    match outcome {
        Ok(result) => {
            println!("trade {} -> {:?}", result.trade.trade_id, result.trade.status);
            for rule_outcome in &result.rule_outcomes {
                println!(
                    "  rule {} ({}): alerted={} pct={:?}",
                    rule_outcome.rule_id,
                    rule_outcome.rule_name,
                    rule_outcome.alerted,
                    rule_outcome.calculated_percentage
                );
            }
        }
        Err(err) => println!("trade rejected: {err}"),
    }

    let portfolio = engine.run_portfolio_compliance(1);
    match portfolio {
        Ok(outcomes) => println!("portfolio sweep: {} rule(s) evaluated", outcomes.len()),
        Err(err) => println!("portfolio sweep failed: {err}"),
    }

    let summary = engine.alert_summary(1);
    println!(
        "alerts for fund 1: pending={} overridden={} cancelled={} last_24h={}",
        summary.pending, summary.overridden, summary.cancelled, summary.last_24h
    );
}
