mod access;
mod builder;
mod config;
mod db;
mod errors;
mod llm_client;
mod models;
mod profile;
mod render;
mod routes;
mod state;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::access::receipts::S3ReceiptStore;
use crate::access::subscriptions::PgSubscriptionStore;
use crate::builder::improve::LlmTextImprover;
use crate::builder::session::SessionStore;
use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::LlmClient;
use crate::profile::PgProfileStore;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting CV builder API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Initialize S3 / MinIO (payment receipts)
    let s3 = build_s3_client(&config).await;
    info!("S3 client initialized (bucket: {})", config.s3_bucket);

    // Initialize LLM client; a single request may not outlive the improve deadline
    let llm = LlmClient::new(config.anthropic_api_key.clone(), config.improve_timeout())?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    let sessions = SessionStore::new(config.session_limit);
    info!(
        "Session store ready (limit: {}, improve timeout: {}s)",
        config.session_limit, config.improve_timeout_secs
    );

    // Build app state
    let state = AppState {
        profiles: Arc::new(PgProfileStore::new(db.clone())),
        subscriptions: Arc::new(PgSubscriptionStore::new(db)),
        receipts: Arc::new(S3ReceiptStore::new(
            s3,
            config.s3_bucket.clone(),
            config.s3_endpoint.clone(),
        )),
        improver: Arc::new(LlmTextImprover(llm)),
        sessions,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins to the web app's domain

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "cv-builder-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    aws_sdk_s3::Client::new(&s3_config)
}
