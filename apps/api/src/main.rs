mod config;
mod db;
mod errors;
mod files;
mod jobs;
mod llm_client;
mod models;
mod notify;
mod repository;
mod routes;
mod screening;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::HeaderValue;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::LlmClient;
use crate::notify::gmail::GMAIL_COMPOSE_SCOPE;
use crate::notify::{CredentialCache, GmailDrafter, MailToken};
use crate::repository::PgRepository;
use crate::routes::build_router;
use crate::screening::evaluation::LlmEvaluator;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("screening_api={}", &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Screening API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL (runs migrations)
    let db = create_pool(&config.database_url).await?;
    let repo = Arc::new(PgRepository::new(db));

    // Initialize LLM client and evaluator
    let llm = LlmClient::new(config.anthropic_api_key.clone(), config.llm_timeout)
        .context("Failed to build LLM client")?;
    info!(
        "LLM client initialized (model: {}, timeout: {:?})",
        llm_client::MODEL,
        config.llm_timeout
    );
    let evaluator = Arc::new(LlmEvaluator::new(llm, config.company_name.clone()));

    // Initialize the draft mailer and its encrypted token cache
    let credentials = CredentialCache::new(&config.gmail_key_file, &config.gmail_token_file);
    if let Some(access_token) = &config.gmail_access_token {
        credentials
            .store(&MailToken {
                access_token: access_token.clone(),
                expires_at: None,
            })
            .await
            .context("Failed to seal GMAIL_ACCESS_TOKEN into the credential cache")?;
    }
    let mailer = Arc::new(
        GmailDrafter::new(credentials, config.hr_email.clone(), config.mail_timeout)
            .context("Failed to build Gmail client")?,
    );
    info!("Gmail drafter initialized (scope: {GMAIL_COMPOSE_SCOPE})");

    let upload_policy = config.upload_policy();
    if !upload_policy.enforce_type {
        warn!("RESUME_TYPE_CHECK=off: resume uploads are accepted without type validation");
    }
    info!(
        "Resumes stored under {} (limit {} bytes)",
        upload_policy.uploads_dir.display(),
        upload_policy.max_bytes
    );

    // Build app state
    let state = AppState {
        repo,
        evaluator,
        mailer,
        upload_policy: Arc::new(upload_policy),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(config.cors_allowed_origin.as_deref())?);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn cors_layer(allowed_origin: Option<&str>) -> Result<CorsLayer> {
    match allowed_origin {
        Some(origin) => {
            let origin = HeaderValue::from_str(origin)
                .with_context(|| format!("CORS_ALLOWED_ORIGIN '{origin}' is not a valid origin"))?;
            Ok(CorsLayer::permissive().allow_origin(origin))
        }
        None => Ok(CorsLayer::permissive()),
    }
}
