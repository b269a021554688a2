use anyhow::Context;
use clap::Parser;

use ers_api::app::services;
use ers_api::config::{AppConfig, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = AppConfig::load(cli.service, cli.config.as_deref())?;

    ers_observability::init(cli.service.name(), &cfg.log);
    tracing::info!(
        service = cli.service.name(),
        bind = %cfg.server.bind,
        persistent = cfg.database.url.is_some(),
        "starting"
    );

    let app = services::build_router(cli.service, &cfg).await?;

    let listener = tokio::net::TcpListener::bind(cfg.server.bind)
        .await
        .with_context(|| format!("failed to bind {}", cfg.server.bind))?;

    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app)
        .await
        .context("server terminated")?;
    Ok(())
}
