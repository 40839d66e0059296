//! ParkDesk API Server
//!
//! Main entry point for the till ledger service.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use parkdesk_api::{AppState, TillSettings, create_router};
use parkdesk_core::till::LedgerService;
use parkdesk_db::{PoolOptions, TillRepository, connect};
use parkdesk_shared::{AppConfig, JwtConfig, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "parkdesk=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load()?;
    let till = TillSettings::from_config(&config.till)?;
    info!(
        currency_symbol = %till.currency_symbol,
        timezone = %till.timezone,
        "Till settings loaded"
    );

    let db = connect(
        &config.database.url,
        PoolOptions {
            max_connections: config.database.max_connections,
            min_connections: config.database.min_connections,
        },
    )
    .await?;
    info!("Connected to database");

    let ledger = LedgerService::new(Arc::new(TillRepository::new(db)));
    let jwt_service = JwtService::new(JwtConfig::from(&config.jwt));
    let state = AppState::new(ledger, jwt_service, till);

    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
