use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use clinical_intake::adapters::ai::oracle_from_config;
use clinical_intake::adapters::assessment::InMemoryAssessmentRepository;
use clinical_intake::adapters::http::{app_router, IntakeHandlers};
use clinical_intake::config::{AppConfig, ServerConfig};

/// Starts the intake HTTP server.
///
/// Configuration comes from `CLINICAL_INTAKE__*` environment variables (and
/// `.env` when present); see [`AppConfig::load`].
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("loading configuration")?;
    init_tracing(&config.server)?;
    config.validate().context("validating configuration")?;

    let oracle = oracle_from_config(&config.ai).context("building oracle client")?;
    let info = oracle.provider_info();
    let settings = config.intake.engine_settings(config.ai.temperature);

    let handlers = IntakeHandlers::new(
        oracle,
        Arc::new(InMemoryAssessmentRepository::new()),
        settings,
    );
    let app = app_router(handlers, &config.server);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;

    tracing::info!(
        %addr,
        provider = %info.name,
        model = %info.model,
        environment = ?config.server.environment,
        "Clinical intake listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    tracing::info!("Clinical intake stopped");
    Ok(())
}

fn init_tracing(server: &ServerConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&server.log_level))
        .context("parsing log filter")?;

    let registry = tracing_subscriber::registry().with(filter);
    if server.is_production() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
