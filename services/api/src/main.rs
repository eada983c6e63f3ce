use std::time::Duration;

use anyhow::Result;
use api::{
    MIGRATOR, accounts,
    config::{AppConfig, StoreBackend},
    jwt::JwtService,
    routes,
    state::AppState,
};
use common::{
    database::{self, DatabaseConfig},
    error::DatabaseError,
    storage::{self, StorageConfig},
};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Pause between database connection attempts at start-up
const DB_RETRY_DELAY: Duration = Duration::from_secs(1);

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting recipe API service");

    let config = AppConfig::load()?;
    let jwt_service = JwtService::new(config.jwt_config());

    let storage_config = StorageConfig::from_env()?;
    let storage = storage::from_config(&storage_config).await?;

    let app_state = match config.store_backend {
        StoreBackend::Postgres => {
            let db_config = DatabaseConfig::from_env()?;
            let pool = database::wait_for_db(&db_config, DB_RETRY_DELAY).await?;

            // Check database connectivity
            if database::health_check(&pool).await? {
                info!("Database connection successful");
            } else {
                anyhow::bail!("Failed to connect to database");
            }

            MIGRATOR
                .run(&pool)
                .await
                .map_err(|e| DatabaseError::Migration(e.to_string()))?;
            info!("Database migrations applied");

            AppState::with_postgres(pool, storage, jwt_service)
        }
        StoreBackend::Memory => {
            info!("Using in-memory store; data is lost on exit");
            AppState::with_memory(storage, jwt_service)
        }
    };

    if let Some((email, password)) = config.admin_credentials() {
        let admin = accounts::ensure_superuser(app_state.users.as_ref(), email, password).await?;
        info!("Superuser {} ready", admin.id);
    }

    info!("API service initialized successfully");

    // Start the web server
    let app = routes::create_router(app_state);

    let listener = TcpListener::bind(&config.bind_address).await?;
    info!("API service listening on {}", config.bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
