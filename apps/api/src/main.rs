use std::sync::Arc;

use anyhow::Context;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{self, TraceLayer};
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use clinic_api::create_router;
use seed_cell::{seed_database, SeedOptions};
use shared_config::AppConfig;
use shared_database::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting clinic server");

    let config = AppConfig::from_env();
    let bind_address = config.bind_address.clone();
    let state = AppState::from_config(config);

    if state.config.seed_on_startup {
        let options = SeedOptions {
            seed: state.config.seed,
            ..SeedOptions::default()
        };
        let summary = seed_database(&state, options)
            .await
            .context("seeding the store at startup failed")?;
        info!("Demo data loaded:\n{}", summary);
    }

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(Arc::new(state))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors);

    let listener = TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("cannot bind {}", bind_address))?;
    info!("Listening on {}", bind_address);

    axum::serve(listener, app).await?;
    Ok(())
}
