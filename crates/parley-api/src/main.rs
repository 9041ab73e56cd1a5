use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use parley::{InMemoryPersistenceClient, MongoPersistenceClient, PersistenceClient};
use parley_api::{
    app::build_router,
    config::{Config, StorageBackend},
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    init_logging(&config);

    tracing::info!("Starting Parley API server");
    tracing::info!("Config loaded: {}:{}", config.server.host, config.server.port);

    let persist = connect_store(&config).await?;

    if config.auth.enabled {
        tracing::info!("Bearer token authentication enabled");
    } else {
        tracing::warn!("Authentication disabled; all API routes are open");
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = Arc::new(AppState::new(config, persist));
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check: http://{}/health", addr);
    tracing::info!("API docs: http://{}/api/docs", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn connect_store(config: &Config) -> anyhow::Result<Arc<dyn PersistenceClient>> {
    match config.storage.backend {
        StorageBackend::Mongodb => {
            tracing::info!("Connecting to MongoDB");
            let client =
                MongoPersistenceClient::connect(&config.mongodb_uri, &config.mongodb.database)
                    .await?;
            tracing::info!("MongoDB connected");
            Ok(Arc::new(client))
        }
        StorageBackend::Memory => {
            tracing::info!("Using in-memory storage");
            let client = InMemoryPersistenceClient::new();
            for username in &config.storage.seed_users {
                let user = client.create_user(username).await?;
                tracing::info!(user_id = user.id, username = %user.username, "Seeded user");
            }
            Ok(Arc::new(client))
        }
    }
}

fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.logging.format.as_str() {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }
}
