use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use auth_service::{
    Argon2Hasher, AppState, AuthService, Config, Database, MemoryCache, SqlUserStore,
    TokenManager, WebServer,
};

/// How often expired cache entries are swept.
const CACHE_PURGE_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    // Load configuration
    let mut config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {config_path}: {e}");
            eprintln!("Using default configuration.");
            Config::default()
        }
    };

    // Initialize logging
    if let Err(e) = auth_service::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        auth_service::logging::init_console_only(&config.logging.level);
    }

    // Overrides never touch [logging] and may warn, so they run once a
    // subscriber exists.
    config.apply_env_overrides();

    if let Err(e) = run(config).await {
        error!(error = %e, "Auth service stopped");
        std::process::exit(1);
    }
}

async fn run(config: Config) -> auth_service::Result<()> {
    config.validate()?;

    info!("Auth service starting");

    let db = Database::connect(&config.database.url, config.database.max_connections).await?;
    let users = Arc::new(SqlUserStore::new(db.pool().clone()));

    let cache = Arc::new(MemoryCache::new());
    cache.clone().start_purge_task(CACHE_PURGE_INTERVAL);

    let hasher = Argon2Hasher::new(config.hash_params())
        .map_err(|e| auth_service::AuthServiceError::Config(format!("argon2: {e}")))?;
    let tokens = Arc::new(TokenManager::new(&config.token_config()));

    let auth = AuthService::new(
        users,
        Arc::new(hasher),
        tokens.clone(),
        cache,
        config.auth_policy(),
    );

    let server = WebServer::new(&config.server, AppState::new(Arc::new(auth), tokens))?;
    info!(
        addr = %server.addr(),
        max_attempts = config.auth.max_attempts,
        block_window_secs = config.auth.block_window_secs,
        "Server configured"
    );

    server.run().await?;
    Ok(())
}
