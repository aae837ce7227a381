use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio::{
    net::TcpListener,
    signal::unix::{SignalKind, signal},
};

use crate::{api::build_router, config::Config, state::AppState};

pub async fn run(config: Config) -> Result<()> {
    let address = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("unable to bind {address}"))?;
    serve(listener, AppState::from_config(config)?).await
}

/// Serves until SIGINT or SIGTERM, then drains in-flight requests.
pub async fn serve(listener: TcpListener, state: AppState) -> Result<()> {
    let local_addr = listener
        .local_addr()
        .context("unable to read listener address")?;
    let mut sigint =
        signal(SignalKind::interrupt()).context("unable to listen for SIGINT (Ctrl+C)")?;
    let mut sigterm = signal(SignalKind::terminate()).context("unable to listen for SIGTERM")?;

    tracing::info!(target: "http", address = %local_addr, "server_listening");

    let shutdown = async move {
        let signal_name = tokio::select! {
            _ = sigint.recv() => "SIGINT",
            _ = sigterm.recv() => "SIGTERM",
        };
        tracing::info!(target: "http", signal = signal_name, "shutdown_requested");
    };

    axum::serve(
        listener,
        build_router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await
    .context("http server failed")?;

    tracing::info!(target: "http", "server_stopped");
    Ok(())
}
