use sqlx::postgres::PgPoolOptions;
use std::net::TcpListener;
use std::time::Duration;

use quizdeck::auth::prune_expired;
use quizdeck::configuration::get_configuration;
use quizdeck::startup::run;
use quizdeck::telemetry::init_telemetry;

// Expired and revoked refresh tokens are swept out of storage on this
// cadence. Validation never depends on the sweep; it is hygiene only.
const PRUNE_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_telemetry();

    tracing::info!("Starting application");

    let configuration = match get_configuration() {
        Ok(config) => {
            tracing::info!("Configuration loaded successfully");
            config
        }
        Err(e) => {
            tracing::error!("Failed to read configuration: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Configuration error",
            ));
        }
    };

    let connection_string = configuration.database.connection_string();
    tracing::info!("Attempting to connect to database");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&connection_string)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create connection pool: {}", e);
            std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "Database connection error",
            )
        })?;

    tracing::info!("Database connection pool created successfully");

    // Single background sweep task; never runs concurrently with itself.
    let prune_pool = pool.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PRUNE_INTERVAL);
        loop {
            interval.tick().await;
            match prune_expired(&prune_pool).await {
                Ok(pruned) => {
                    if pruned > 0 {
                        tracing::info!(pruned = pruned, "Pruned stale refresh tokens");
                    }
                }
                Err(e) => tracing::warn!("Refresh token prune sweep failed: {}", e),
            }
        }
    });

    let address = format!("127.0.0.1:{}", configuration.application.port);
    tracing::info!("Binding server to address: {}", address);

    let listener = TcpListener::bind(&address)?;
    tracing::info!("Server listening on: {}", address);

    let server = run(listener, pool, configuration.auth.clone())?;
    tracing::info!("Server started successfully");

    let _ = server.await;

    Ok(())
}
