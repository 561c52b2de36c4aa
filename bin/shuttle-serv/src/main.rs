use axum::{Router, middleware, routing::get};
use mlp_api::{ApiConfig, ApiState};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

#[shuttle_runtime::main]
async fn main(
    #[shuttle_shared_db::Postgres] database_url: String,
    #[shuttle_runtime::Secrets] secrets: shuttle_runtime::SecretStore,
) -> shuttle_axum::ShuttleAxum {
    let config = ApiConfig::from_shuttle_secrets(&secrets, database_url)
        .map_err(|e| anyhow::anyhow!("Config error: {e}"))?;

    // Shuttle installs its own tracing subscriber

    let metrics_handle = mlp_api::metrics::init_metrics()?;

    let pool = mlp_db::create_pool(&config.database_url, config.db_max_connections).await?;
    sqlx::migrate!("../../crates/mlp-db/migrations")
        .run(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Migration error: {e}"))?;

    let environment = config.env;
    let cors = mlp_api::middleware::cors::create_cors_layer(config.parsed_allowed_origins());
    let state = ApiState::new(config, pool)?;

    let _job_handles = mlp_api::jobs::start_background_jobs(state.pool.clone());
    tracing::info!("background jobs started (token cleanup, streak decay, challenge expiry)");

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

    tracing::info!(environment = ?environment, "shuttle service ready");

    Ok(app.into())
}
