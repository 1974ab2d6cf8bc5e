use super::*;
use std::collections::HashMap;

fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn defaults_apply_when_only_database_url_is_set() {
    let settings = Settings::from_lookup(lookup_from(&[("DATABASE_URL", "postgres://x/y")])).unwrap();
    assert_eq!(settings.database_url, "postgres://x/y");
    assert_eq!(settings.port, DEFAULT_PORT);
    assert_eq!(settings.db_max_connections, DEFAULT_DB_MAX_CONNECTIONS);
    assert!(settings.paper_only);
    assert!(settings.start_scheduler);
    assert_eq!(settings.cycle_second, 5);
    assert!((settings.paper_capital - 100_000.0).abs() < f64::EPSILON);
    assert_eq!(settings.market, MarketHours::default());
    assert_eq!(settings.market.open, Time::from_hms(9, 15, 0).unwrap());
    assert_eq!(settings.market.close, Time::from_hms(15, 30, 0).unwrap());
    assert_eq!(settings.market.utc_offset.whole_minutes(), 330);
    assert_eq!(settings.dhan, DhanSettings::default());
}

#[test]
fn missing_database_url_is_an_error() {
    let err = Settings::from_lookup(lookup_from(&[])).unwrap_err();
    assert!(matches!(err, SettingsError::Missing("DATABASE_URL")));

    let err = Settings::from_lookup(lookup_from(&[("DATABASE_URL", "  ")])).unwrap_err();
    assert!(matches!(err, SettingsError::Missing(_)));
}

#[test]
fn unparseable_optional_values_fall_back() {
    let settings = Settings::from_lookup(lookup_from(&[
        ("DATABASE_URL", "postgres://x/y"),
        ("PORT", "not-a-port"),
        ("PAPER_CAPITAL", "-5"),
        ("PAPER_TRADING", "maybe"),
    ]))
    .unwrap();
    assert_eq!(settings.port, DEFAULT_PORT);
    assert!((settings.paper_capital - DEFAULT_PAPER_CAPITAL).abs() < f64::EPSILON);
    assert!(settings.paper_only);
}

#[test]
fn overrides_are_applied() {
    let settings = Settings::from_lookup(lookup_from(&[
        ("DATABASE_URL", "postgres://x/y"),
        ("PORT", "8080"),
        ("PAPER_TRADING", "off"),
        ("START_SCHEDULER", "No"),
        ("STRATEGY_CYCLE_SECOND", "30"),
        ("DHAN_BASE_URL", "http://localhost:9000/v2/"),
        ("DHAN_REQUEST_TIMEOUT_SECS", "5"),
        ("MARKET_UTC_OFFSET_MINUTES", "0"),
    ]))
    .unwrap();
    assert_eq!(settings.port, 8080);
    assert!(!settings.paper_only);
    assert!(!settings.start_scheduler);
    assert_eq!(settings.cycle_second, 30);
    assert_eq!(settings.dhan.base_url, "http://localhost:9000/v2");
    assert_eq!(settings.dhan.request_timeout_secs, 5);
    assert_eq!(settings.market.utc_offset, UtcOffset::UTC);
}

#[test]
fn open_after_close_is_rejected() {
    let err = Settings::from_lookup(lookup_from(&[
        ("DATABASE_URL", "postgres://x/y"),
        ("MARKET_OPEN_HOUR", "16"),
    ]))
    .unwrap_err();
    assert!(matches!(err, SettingsError::MarketHours(_)));
}

#[test]
fn out_of_range_hour_is_rejected() {
    let err = Settings::from_lookup(lookup_from(&[
        ("DATABASE_URL", "postgres://x/y"),
        ("MARKET_CLOSE_HOUR", "25"),
    ]))
    .unwrap_err();
    assert!(matches!(err, SettingsError::MarketHours(_)));
}

#[test]
fn cycle_second_past_59_is_rejected() {
    let err = Settings::from_lookup(lookup_from(&[
        ("DATABASE_URL", "postgres://x/y"),
        ("STRATEGY_CYCLE_SECOND", "60"),
    ]))
    .unwrap_err();
    assert!(matches!(err, SettingsError::Invalid { key: "STRATEGY_CYCLE_SECOND", .. }));
}

#[test]
fn parse_bool_accepts_common_spellings() {
    for raw in ["1", "true", "YES", " on "] {
        assert_eq!(parse_bool(raw), Some(true), "{raw}");
    }
    for raw in ["0", "False", "no", "OFF"] {
        assert_eq!(parse_bool(raw), Some(false), "{raw}");
    }
    assert_eq!(parse_bool(""), None);
    assert_eq!(parse_bool("2"), None);
}
