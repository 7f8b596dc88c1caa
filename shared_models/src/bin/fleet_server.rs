//! Fleet API over sqlite.
//!
//! ```bash
//! DATABASE_URL=sqlite://fleet.db?mode=rwc RUST_LOG=querygate=debug cargo run --bin fleet_server
//! ```

use std::env;

use sea_orm::Database;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let database_url = env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite::memory:".to_string());
    let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

    let db = Database::connect(&database_url).await?;
    shared_models::create_schema(&db).await?;

    let app = shared_models::router(db);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(%bind_addr, "fleet API listening");
    axum::serve(listener, app).await?;
    Ok(())
}
