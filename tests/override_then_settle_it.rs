mod common;

use std::sync::Arc;

use common::*;
use compliance_engine::domain::{AlertStatus, TradeDirection, TradeStatus};
use compliance_engine::memory_store::MemoryStore;
use compliance_engine::store::{ReadModel, Writer};
use rust_decimal_macros::dec;

#[tokio::test]
async fn overriding_the_only_pending_alert_settles_the_trade() {
    let store = Arc::new(MemoryStore::new());
    seed_fund(
        &store,
        dec!(100000.00),
        &[("MSFT", dec!(300.00)), ("AAPL", dec!(150.00))],
    );
    insert_holding(&store, "MSFT", 500);
    insert_holding(&store, "AAPL", 1000);
    attach(&store, sector_cap_rule(1, dec!(30)));

    let engine = engine_with(store.clone());
    let outcome = engine
        .submit_trade(FUND_ID, "AAPL", TradeDirection::Buy, 100)
        .await
        .expect("trade parks on alert, not rejected");
    assert_eq!(outcome.trade.status, TradeStatus::Alert);

    let alerts = store.alerts_for_trade(outcome.trade.trade_id);
    assert_eq!(alerts.len(), 1);
    let alert_id = alerts[0].alert_id;

    let overridden = engine
        .override_alert(alert_id, "risk-approved")
        .await
        .expect("override with non-empty reason succeeds");
    assert_eq!(overridden.status, AlertStatus::Overridden);
    assert_eq!(overridden.override_reason.as_deref(), Some("risk-approved"));

    let trade = engine
        .trade(outcome.trade.trade_id)
        .expect("trade row still on record");
    assert_eq!(trade.status, TradeStatus::Processed);

    assert_eq!(store.fund(FUND_ID).unwrap().cash, dec!(85000.00));
    assert_eq!(store.holding(FUND_ID, "AAPL").unwrap().shares, 1100);

    // Re-overriding with the identical reason is idempotent.
    let again = engine
        .override_alert(alert_id, "risk-approved")
        .await
        .expect("same-reason override is a no-op");
    assert_eq!(again.status, AlertStatus::Overridden);
}

/// Two BUYs that are each individually affordable, but not together, both
/// park on the same sector-cap alert. Overriding and settling both must
/// not drive cash negative: the second settle has to re-check availability
/// against the cash the first settle actually left behind and reject.
#[tokio::test]
async fn double_park_then_override_cannot_drive_cash_negative() {
    let store = Arc::new(MemoryStore::new());
    seed_fund(&store, dec!(10000.00), &[("AAPL", dec!(150.00))]);
    attach(&store, sector_cap_rule(1, dec!(1)));

    let engine = engine_with(store.clone());
    let first = engine
        .submit_trade(FUND_ID, "AAPL", TradeDirection::Buy, 60)
        .await
        .expect("parks on alert, cash alone would cover it");
    assert_eq!(first.trade.status, TradeStatus::Alert);

    let second = engine
        .submit_trade(FUND_ID, "AAPL", TradeDirection::Buy, 60)
        .await
        .expect("parks on alert, cash alone would cover it");
    assert_eq!(second.trade.status, TradeStatus::Alert);

    let first_alert = store.alerts_for_trade(first.trade.trade_id)[0].alert_id;
    let second_alert = store.alerts_for_trade(second.trade.trade_id)[0].alert_id;

    engine.override_alert(first_alert, "risk-approved").await.unwrap();
    let settle_result = engine.override_alert(second_alert, "risk-approved").await;

    assert!(
        settle_result.is_err(),
        "second settle must be rejected for insufficient cash, not silently committed"
    );
    assert!(store.fund(FUND_ID).unwrap().cash >= dec!(0), "cash must never go negative");

    let second_trade = engine.trade(second.trade.trade_id).unwrap();
    assert_eq!(second_trade.status, TradeStatus::Invalid);
}

#[tokio::test]
async fn overriding_with_a_different_reason_conflicts() {
    let store = Arc::new(MemoryStore::new());
    seed_fund(
        &store,
        dec!(100000.00),
        &[("MSFT", dec!(300.00)), ("AAPL", dec!(150.00))],
    );
    insert_holding(&store, "MSFT", 500);
    insert_holding(&store, "AAPL", 1000);
    attach(&store, sector_cap_rule(1, dec!(30)));

    let engine = engine_with(store.clone());
    let outcome = engine
        .submit_trade(FUND_ID, "AAPL", TradeDirection::Buy, 100)
        .await
        .unwrap();
    let alert_id = store.alerts_for_trade(outcome.trade.trade_id)[0].alert_id;

    engine.override_alert(alert_id, "risk-approved").await.unwrap();

    let err = engine
        .override_alert(alert_id, "a different reason")
        .await
        .expect_err("conflicting override reason is rejected");
    let message = err.to_string();
    assert!(message.contains("risk-approved"), "error should preserve the original reason: {message}");
}
