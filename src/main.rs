//! spin-gateway server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints.

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use axum::routing::get;
use rand::Rng;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use spin_gateway::api;
use spin_gateway::app_state::AppState;
use spin_gateway::auth::{OperatorPolicy, StaticOperatorList};
use spin_gateway::config::{GatewayConfig, LogFormat, StoreKind};
use spin_gateway::domain::{EventBus, ResultSigner, ThreadRandom};
use spin_gateway::persistence::{InMemoryStore, PostgresStore, StoreBackend};
use spin_gateway::transfer::{DisabledTransfer, NftTransfer, RelayTransfer};
use spin_gateway::ws::handler::ws_handler;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = GatewayConfig::from_env()?;
    init_tracing(config.log_format);
    tracing::info!(addr = %config.listen_addr, backend = ?config.store_backend, "starting spin-gateway");

    // Build persistence layer
    let store = Arc::new(build_store(&config).await?);
    tracing::info!(backend = store.name(), "store ready");

    let signer = match &config.result_hash_secret {
        Some(secret) => ResultSigner::new(secret),
        None => {
            tracing::warn!(
                "RESULT_HASH_SECRET not set, using an ephemeral key; result hashes will not verify after restart"
            );
            let mut key = [0u8; 32];
            rand::rng().fill(&mut key);
            ResultSigner::new(hex::encode(key))
        }
    };

    let transfer: Arc<dyn NftTransfer> = match &config.transfer_relay_url {
        Some(url) => Arc::new(
            RelayTransfer::new(url.clone(), config.transfer_timeout)
                .context("failed to build transfer relay client")?,
        ),
        None => {
            tracing::warn!("TRANSFER_RELAY_URL not set, NFT claims will fail");
            Arc::new(DisabledTransfer)
        }
    };

    let operators = StaticOperatorList::new(&config.operator_addresses);
    if operators.is_empty() {
        tracing::warn!("OPERATOR_ADDRESSES is empty, admin routes are locked");
    }
    let operators: Arc<dyn OperatorPolicy> = Arc::new(operators);

    // Build application state
    let event_bus = EventBus::new(config.event_bus_capacity);
    let app_state = AppState::new(
        store,
        event_bus,
        signer,
        Arc::new(ThreadRandom),
        transfer,
        operators,
    );

    // Build router
    let app = Router::new()
        .merge(api::build_router())
        .route("/ws", get(ws_handler));

    #[cfg(feature = "swagger-ui")]
    let app = {
        use utoipa::OpenApi;
        app.merge(
            utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", api::ApiDoc::openapi()),
        )
    };

    let app = app
        .layer(TimeoutLayer::new(config.request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

async fn build_store(config: &GatewayConfig) -> anyhow::Result<StoreBackend> {
    match config.store_backend {
        StoreKind::Memory => {
            tracing::warn!("using in-memory store, state is lost on restart");
            Ok(StoreBackend::Memory(InMemoryStore::new()))
        }
        StoreKind::Postgres => {
            let store = PostgresStore::connect(config)
                .await
                .context("failed to connect to PostgreSQL")?;
            if config.run_migrations {
                store.migrate().await.context("failed to run migrations")?;
                tracing::info!("migrations applied");
            }
            Ok(StoreBackend::Postgres(store))
        }
    }
}
