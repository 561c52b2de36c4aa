use anyhow::Context;
use axum::{Router, middleware, routing::get};
use mlp_api::{ApiConfig, ApiState};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = ApiConfig::from_env().context("invalid configuration")?;

    mlp_api::tracing::init_tracing(config.env);
    let metrics_handle = mlp_api::metrics::init_metrics()?;

    let pool = mlp_db::create_pool(&config.database_url, config.db_max_connections).await?;
    mlp_db::ensure_db_and_migrate(&config.database_url, &pool).await?;
    tracing::info!("database migrated");

    let port = config.port;
    let environment = config.env;
    let cors = mlp_api::middleware::cors::create_cors_layer(config.parsed_allowed_origins());
    let state = ApiState::new(config, pool)?;

    let job_handles = mlp_api::jobs::start_background_jobs(state.pool.clone());

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let metrics_app = Router::new()
        .route("/metrics", get(mlp_api::metrics::metrics_handler))
        .with_state(metrics_handle);

    let app = mlp_api::router::router()
        .with_state(state)
        .merge(metrics_app)
        .layer(cors)
        .layer(trace_layer)
        .layer(middleware::from_fn(mlp_api::metrics::track_metrics))
        .layer(middleware::from_fn(
            mlp_api::middleware::request_id::request_id_middleware,
        ));
    let app = mlp_api::middleware::security_headers::apply_security_headers(app, environment);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!(port, environment = ?environment, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    for handle in job_handles {
        handle.abort();
    }
    tracing::info!("server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}
