use addrcast_core::Config;
use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    addrcast_core::init()?;

    let config_path = Config::default_path()?;
    tracing::info!("Loading configuration from {}", config_path.display());
    let (config, _) = Config::load_validated(&config_path)?;

    addrcast_server::serve(&config).await
}
