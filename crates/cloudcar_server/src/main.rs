use anyhow::{anyhow, Context};
use axum::http::HeaderValue;
use clap::Parser;
use cloudcar_core::{default_log_level, init_logging};
use cloudcar_server::{build_router, ServerConfig, Store};
use log::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::parse();

    let level = config
        .log_level
        .clone()
        .unwrap_or_else(|| default_log_level().to_string());
    let log_dir = config
        .log_dir
        .as_deref()
        .map(|dir| dir.to_str().context("log directory must be valid UTF-8"))
        .transpose()?;
    init_logging(&level, log_dir).map_err(|err| anyhow!(err))?;

    let allowed_origin = HeaderValue::from_str(&config.allowed_origin)
        .with_context(|| format!("invalid allowed origin `{}`", config.allowed_origin))?;
    let store = Store::open(&config.db).with_context(|| {
        format!(
            "cannot serve {}; run `cloudcar migrate --db {}` first if the schema is behind",
            config.db.display(),
            config.db.display()
        )
    })?;

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    info!(
        "event=server_start module=server status=ok bind={} db={} allowed_origin={}",
        config.bind,
        config.db.display(),
        config.allowed_origin
    );

    axum::serve(listener, build_router(store, allowed_origin))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server terminated with error")?;

    info!("event=server_stop module=server status=ok");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("event=server_signal module=server status=error error={err}");
    }
}
