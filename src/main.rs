use anyhow::Context;
use agri_advisory::{SERVICE_NAME, cli::config_path_from_args, config::Config, logging, server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = config_path_from_args()?;
    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;
    let _log_guard = logging::install(&config.logging, SERVICE_NAME)?;

    let result = server::run(config).await;
    if let Err(err) = &result {
        tracing::error!(target: "http", error = %format!("{err:#}"), "server_exited_with_error");
    }
    result
}
