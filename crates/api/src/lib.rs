//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST routes for the till ledger
//! - Authentication middleware
//! - A validating JSON extractor

pub mod extractors;
pub mod middleware;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use parkdesk_core::till::{LedgerService, MovementStore};
use parkdesk_shared::{AppError, JwtService, TillConfig};

/// Till settings resolved from configuration.
#[derive(Debug, Clone)]
pub struct TillSettings {
    /// Currency symbol echoed in read responses.
    pub currency_symbol: String,
    /// Business timezone deciding the current day.
    pub timezone: Tz,
}

impl TillSettings {
    /// Resolves the till section of the configuration.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Configuration` for an unknown timezone.
    pub fn from_config(config: &TillConfig) -> Result<Self, AppError> {
        Ok(Self {
            currency_symbol: config.currency_symbol.clone(),
            timezone: config.business_timezone()?,
        })
    }

    /// Current business day in the configured timezone.
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.timezone).date_naive()
    }
}

/// Application state shared across handlers.
pub struct AppState<S: MovementStore> {
    /// Till ledger.
    pub ledger: Arc<LedgerService<S>>,
    /// JWT service for token validation.
    pub jwt_service: Arc<JwtService>,
    /// Till display and calendar settings.
    pub till: Arc<TillSettings>,
}

impl<S: MovementStore> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            ledger: Arc::clone(&self.ledger),
            jwt_service: Arc::clone(&self.jwt_service),
            till: Arc::clone(&self.till),
        }
    }
}

impl<S: MovementStore> AppState<S> {
    /// Creates the application state.
    #[must_use]
    pub fn new(ledger: LedgerService<S>, jwt_service: JwtService, till: TillSettings) -> Self {
        Self {
            ledger: Arc::new(ledger),
            jwt_service: Arc::new(jwt_service),
            till: Arc::new(till),
        }
    }
}

/// Creates the main application router.
pub fn create_router<S: MovementStore + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
