use anyhow::Context;

use salesdesk_infra::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    salesdesk_observability::init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    let app = salesdesk_api::app::build_app(&config)
        .await
        .context("failed to build application")?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
