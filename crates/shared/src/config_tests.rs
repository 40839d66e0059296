//! Unit tests for configuration loading.

use chrono_tz::Tz;

use crate::config::{AppConfig, DatabaseConfig, TillConfig};

#[test]
fn test_load_applies_defaults() {
    temp_env::with_vars(
        [
            ("PARKDESK__DATABASE__URL", Some("postgres://localhost/parkdesk")),
            ("PARKDESK__JWT__SECRET", Some("test-secret")),
            ("PARKDESK__SERVER__HOST", Some("127.0.0.1")),
            ("RUN_MODE", Some("config-test")),
        ],
        || {
            let config = AppConfig::load().unwrap();

            assert_eq!(config.server.host, "127.0.0.1");
            assert_eq!(config.server.port, 3001);
            assert_eq!(config.database.url, "postgres://localhost/parkdesk");
            assert_eq!(config.database.max_connections, 10);
            assert_eq!(config.database.min_connections, 1);
            assert_eq!(config.jwt.secret, "test-secret");
            assert_eq!(config.jwt.access_token_expiry_secs, 900);
            assert_eq!(config.till.currency_symbol, "S/");
            assert_eq!(config.till.timezone, "America/Lima");
        },
    );
}

#[test]
fn test_load_reads_till_section_from_env() {
    temp_env::with_vars(
        [
            ("PARKDESK__DATABASE__URL", Some("postgres://localhost/parkdesk")),
            ("PARKDESK__JWT__SECRET", Some("test-secret")),
            ("PARKDESK__TILL__CURRENCY_SYMBOL", Some("$")),
            ("PARKDESK__TILL__TIMEZONE", Some("America/Bogota")),
            ("RUN_MODE", Some("config-test")),
        ],
        || {
            let config = AppConfig::load().unwrap();

            assert_eq!(config.till.currency_symbol, "$");
            assert_eq!(
                config.till.business_timezone().unwrap(),
                Tz::America__Bogota
            );
        },
    );
}

#[test]
fn test_load_fails_without_database_url() {
    temp_env::with_vars(
        [
            ("PARKDESK__DATABASE__URL", None::<&str>),
            ("PARKDESK__JWT__SECRET", Some("test-secret")),
            ("RUN_MODE", Some("config-test")),
        ],
        || {
            assert!(AppConfig::load().is_err());
        },
    );
}

#[test]
fn test_default_till_config() {
    let till = TillConfig::default();
    assert_eq!(till.currency_symbol, "S/");
    assert_eq!(till.business_timezone().unwrap(), Tz::America__Lima);
}

#[test]
fn test_unknown_timezone_is_rejected() {
    let till = TillConfig {
        currency_symbol: "S/".to_string(),
        timezone: "Mars/Olympus_Mons".to_string(),
    };
    let err = till.business_timezone().unwrap_err();
    assert_eq!(err.error_code(), "CONFIGURATION_ERROR");
}

#[test]
fn test_database_section_loads_without_jwt_secret() {
    temp_env::with_vars(
        [
            ("PARKDESK__DATABASE__URL", Some("postgres://localhost/parkdesk")),
            ("PARKDESK__DATABASE__MAX_CONNECTIONS", Some("3")),
            ("PARKDESK__JWT__SECRET", None),
            ("RUN_MODE", Some("config-test")),
        ],
        || {
            let database = DatabaseConfig::load().unwrap();

            assert_eq!(database.url, "postgres://localhost/parkdesk");
            assert_eq!(database.max_connections, 3);
            assert_eq!(database.min_connections, 1);
            assert!(AppConfig::load().is_err());
        },
    );
}
