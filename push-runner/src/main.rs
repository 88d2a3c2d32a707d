use anyhow::Result;
use push_api::run as run_api;
use push_core::{Config, PushContext};
use tracing;
use tracing_subscriber;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Starting Wander push gateway");

    let config = Config::from_env()?;
    if config.apns.resolved().is_err() {
        tracing::warn!("Push provider not fully configured; webhook requests will fail until it is");
    }
    let ctx = PushContext::new(config).await?;

    tracing::info!("Push context initialized");

    run_api(ctx).await?;

    Ok(())
}
