use std::sync::Arc;

use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use prd_dashboard_service::{
    AppConfig, OpenAiClient, PrdGenerator, build_router,
    dashboard::generate_dataset,
    generation::{ApiKey, CompletionProvider},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv = dotenvy::dotenv();
    init_tracing();
    if let Ok(path) = dotenv {
        tracing::debug!(?path, "loaded environment file");
    }

    let config = Arc::new(AppConfig::from_env()?);
    tracing::info!(?config.listen_addr, model = %config.generator.model, "starting service");

    let provider = OpenAiClient::new(
        config.api_base.clone(),
        ApiKey::Env(config.api_key_var.clone()),
        config.request_timeout,
    )?;
    if !provider.has_credential() {
        tracing::warn!(
            var = %config.api_key_var,
            "API key not found; PRD generation will fail until it is set"
        );
    }
    let generator = PrdGenerator::new(Arc::new(provider), config.generator.clone());

    let dataset = Arc::new(generate_dataset(
        config.dashboard_start,
        config.dashboard_end,
        config.dashboard_seed,
    )?);
    tracing::info!(
        points = dataset.points().len(),
        seed = dataset.seed(),
        "dashboard dataset ready"
    );

    let router = build_router(config.clone(), generator, dataset);

    let listener = TcpListener::bind(config.listen_addr).await?;
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "REST server ready");

    axum::serve(listener, router).await?;

    Ok(())
}

fn init_tracing() {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,hyper=warn,axum::rejection=trace".into());
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .compact();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}
