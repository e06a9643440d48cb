use std::env;
use std::path::PathBuf;

use anyhow::anyhow;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use bitran::{ServerConfig, routes, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Initialize crypto provider for TLS connections
    // This must be done before any TLS connections are attempted
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow!("Failed to install default crypto provider"))?;

    // Optional path to a YAML config file; otherwise the environment is used
    let mut args = env::args().skip(1);
    let config = match args.next() {
        Some(path) => {
            if let Some(extra) = args.next() {
                anyhow::bail!("Unexpected argument '{extra}' after config path");
            }
            ServerConfig::from_file(&PathBuf::from(path)).map_err(|e| anyhow!(e.to_string()))?
        }
        None => ServerConfig::from_env().map_err(|e| anyhow!(e.to_string()))?,
    };
    let address = config.address();
    println!("Starting server on {address}");

    let app_state = AppState::new(config)?;
    let app = routes::create_app(app_state);

    let listener = TcpListener::bind(&address).await?;

    println!("Server listening on {address}");

    axum::serve(listener, app).await?;

    Ok(())
}
