use std::net::SocketAddr;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dealhouse_backend::{api, config::Config, db, db::RoomDirectory, ws};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "dealhouse_backend=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load config
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    // The room directory (C7) is backed by Postgres when DATABASE_URL is
    // set, falling back to the in-memory store so the crate runs end to end
    // without a second service.
    let directory = match &config.database_url {
        Some(url) => {
            let pool = db::create_pool(url).await?;
            RoomDirectory::Postgres(pool)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, running the in-memory room directory");
            RoomDirectory::in_memory()
        }
    };

    let registry = ws::new_registry();

    // Build application state
    let app_state = api::AppState {
        directory,
        registry,
        config: config.clone(),
    };

    // Build router
    let app = Router::new()
        .merge(api::routes())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    tracing::info!("dealhouse server starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
