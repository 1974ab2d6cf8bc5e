use super::*;
use serde_json::json;

fn new_strategy(body: serde_json::Value) -> NewStrategy {
    serde_json::from_value(body).unwrap()
}

#[test]
fn create_body_defaults() {
    let input = new_strategy(json!({"name": "ema_crossover", "symbol": "tcs"}));
    assert_eq!(input.exchange, "NSE");
    assert_eq!(input.quantity, 1);
    assert!(input.security_id.is_none());
    assert!(input.params.is_null());
    assert!(validate_new(&input).is_ok());
}

#[test]
fn unknown_strategy_name_is_rejected() {
    let input = new_strategy(json!({"name": "grid_bot", "symbol": "TCS"}));
    let err = validate_new(&input).unwrap_err();
    assert!(matches!(err, StrategyStoreError::Strategy(StrategyError::Unknown { .. })));
    assert!(err.to_string().contains("ema_crossover"));
}

#[test]
fn non_positive_quantity_is_rejected() {
    for qty in [0, -3] {
        let input = new_strategy(json!({"name": "ema_crossover", "symbol": "TCS", "quantity": qty}));
        assert!(matches!(validate_new(&input), Err(StrategyStoreError::Invalid(_))));
    }
}

#[test]
fn exchange_and_symbol_are_checked() {
    let input = new_strategy(json!({"name": "ema_crossover", "symbol": "TCS", "exchange": "MCX"}));
    assert!(matches!(validate_new(&input), Err(StrategyStoreError::Invalid(_))));

    let input = new_strategy(json!({"name": "ema_crossover", "symbol": "   "}));
    assert!(matches!(validate_new(&input), Err(StrategyStoreError::Invalid(_))));

    assert_eq!(normalize_symbol(" reliance ").unwrap(), "RELIANCE");
    assert_eq!(normalize_exchange("bse").unwrap(), "BSE");
}

#[test]
fn bad_params_are_rejected_at_create() {
    let input = new_strategy(json!({"name": "ema_crossover", "symbol": "TCS", "params": {"ema_fast": 50}}));
    assert!(matches!(validate_new(&input), Err(StrategyStoreError::Strategy(StrategyError::InvalidParam { .. }))));
}

#[test]
fn broker_security_id_falls_back_to_symbol() {
    let mut row = StrategyRow {
        id: 1,
        name: "ema_crossover".into(),
        symbol: "INFY".into(),
        exchange: "NSE".into(),
        security_id: None,
        quantity: 1,
        is_active: true,
        params: Json(json!({})),
        created_at: OffsetDateTime::UNIX_EPOCH,
    };
    assert_eq!(row.broker_security_id(), "INFY");
    row.security_id = Some(" ".into());
    assert_eq!(row.broker_security_id(), "INFY");
    row.security_id = Some("1594".into());
    assert_eq!(row.broker_security_id(), "1594");

    let json = serde_json::to_value(&row).unwrap();
    assert_eq!(json["params"], json!({}));
    assert_eq!(json["created_at"], "1970-01-01T00:00:00Z");
}

#[cfg(feature = "live-db-tests")]
mod live {
    use super::*;
    use crate::state::test_helpers::live_pool;

    #[tokio::test]
    async fn create_toggle_delete_round_trip() {
        let pool = live_pool().await;
        let row = create(&pool, new_strategy(json!({"name": "ema_crossover", "symbol": "sbin", "quantity": 2})))
            .await
            .unwrap();
        assert_eq!(row.symbol, "SBIN");
        assert!(!row.is_active);

        assert!(toggle(&pool, row.id).await.unwrap());
        let updated = update(&pool, row.id, StrategyPatch { security_id: Some("3045".into()), ..StrategyPatch::default() })
            .await
            .unwrap();
        assert_eq!(updated.security_id.as_deref(), Some("3045"));

        delete(&pool, row.id).await.unwrap();
        assert!(matches!(get(&pool, row.id).await, Err(StrategyStoreError::NotFound)));
    }
}
