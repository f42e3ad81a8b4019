use std::sync::Arc;

use tracing::{info, Level};

use chat_bank_backend::config::Config;
use chat_bank_backend::domain::{LedgerService, RegistrationService};
use chat_bank_backend::rest::{create_router, AppState};
use chat_bank_backend::storage::DbConnection;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    let config = Config::from_env()?;

    info!("Setting up database");
    let db = Arc::new(DbConnection::new(&config.database_url).await?);

    info!("Setting up domain services");
    let state = AppState::new(
        LedgerService::new(db.clone()),
        RegistrationService::new(db),
    );

    let app = create_router(state);

    info!("Starting server on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
