use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use meridian::config::Config;
use meridian::db::Database;
use meridian::routes::{self, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "meridian=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "meridian.toml".to_string());
    let config = Config::load(&config_path)?;
    info!(
        "Loaded {} sources from {}",
        config.sources.len(),
        config_path
    );

    // Initialize database
    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite:meridian.db?mode=rwc".to_string());
    let db = Database::new(&database_url).await?;
    db.initialize().await?;
    db.sync_sources(&config.sources).await?;
    info!("Database initialized");

    let bind_address = config.bind_address.clone();
    let state = Arc::new(AppState {
        db: Arc::new(db),
        config: Arc::new(config),
    });

    let app = routes::router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!("Server starting on http://{}", bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
