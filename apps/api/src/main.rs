use std::net::SocketAddr;
use std::sync::Arc;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{CorsLayer, Any};
use tower_http::trace::{self, TraceLayer};
use tracing::{Level, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod router;

use arrival_cell::ArrivalCellState;
use shared_config::{debug_logging_from_env, AppConfig};
use shared_database::{EncounterStore, InMemoryEncounterStore, RedisEncounterStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    let default_filter = if debug_logging_from_env() {
        "debug"
    } else {
        "info,tower_http=debug"
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting arrival notifier API server");

    // Load configuration
    let config = Arc::new(AppConfig::from_env());

    // Encounter storage
    let store: Arc<dyn EncounterStore> = match config.redis_url.as_deref() {
        Some(url) => {
            info!("Using Redis encounter store");
            Arc::new(RedisEncounterStore::new(url).await?)
        }
        None => {
            warn!("REDIS_URL not set, encounters are kept in memory and lost on restart");
            Arc::new(InMemoryEncounterStore::new())
        }
    };

    if config.ehr_writeback_enabled {
        info!(
            "EHR writeback enabled, target {}:{}",
            config.mllp_host, config.mllp_port
        );
    } else {
        info!("EHR writeback disabled, arrivals are recorded without HL7 notification");
    }

    // Set up CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Create shared state
    let state = Arc::new(ArrivalCellState::new(config.clone(), store)?);

    // Build the application router
    let app = router::create_router(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new()
                    .level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new()
                    .level(Level::INFO)),
        )
        .layer(cors);

    // Run the server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
