//! Application configuration management.

use chrono_tz::Tz;
use serde::Deserialize;

use crate::error::AppError;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// JWT configuration.
    pub jwt: JwtSettings,
    /// Till display and calendar settings.
    #[serde(default)]
    pub till: TillConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3001
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// JWT section of the configuration file.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtSettings {
    /// Secret key for verifying tokens.
    pub secret: String,
    /// Access token expiration in seconds.
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry_secs: u64,
}

fn default_access_token_expiry() -> u64 {
    900 // 15 minutes
}

/// Till settings.
///
/// The currency symbol is display-only; the ledger itself works in abstract
/// decimal units. The timezone decides which calendar day "today" is.
#[derive(Debug, Clone, Deserialize)]
pub struct TillConfig {
    /// Currency symbol echoed to clients (e.g. "S/").
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
    /// IANA timezone of the business (e.g. "America/Lima").
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_currency_symbol() -> String {
    "S/".to_string()
}

fn default_timezone() -> String {
    "America/Lima".to_string()
}

impl Default for TillConfig {
    fn default() -> Self {
        Self {
            currency_symbol: default_currency_symbol(),
            timezone: default_timezone(),
        }
    }
}

impl TillConfig {
    /// Parses the configured business timezone.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Configuration` if the name is not a known IANA zone.
    pub fn business_timezone(&self) -> Result<Tz, AppError> {
        self.timezone.parse::<Tz>().map_err(|_| {
            AppError::Configuration(format!("unknown till timezone: {}", self.timezone))
        })
    }
}

/// Builds the layered configuration: `config/default`, `config/{RUN_MODE}`,
/// then `PARKDESK__SECTION__KEY` environment variables, later sources winning.
fn layered() -> Result<config::Config, config::ConfigError> {
    let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

    config::Config::builder()
        .add_source(config::File::with_name("config/default").required(false))
        .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
        .add_source(config::Environment::with_prefix("PARKDESK").separator("__"))
        .build()
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        layered()?.try_deserialize()
    }
}

impl DatabaseConfig {
    /// Loads only the `database` section, for tools that never serve requests.
    ///
    /// # Errors
    ///
    /// Returns an error if the section is missing or malformed.
    pub fn load() -> Result<Self, config::ConfigError> {
        layered()?.get("database")
    }
}
