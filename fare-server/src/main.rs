use std::process::ExitCode;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use fare_server::config::ServerConfig;
use fare_server::fares::{FareClient, FareLookup, FareStore};
use fare_server::stations::StationDirectory;
use fare_server::web::{AppState, create_router};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::from_env()?;

    // Fail fast: no partial directory is ever served
    let stations = StationDirectory::load(&config.stations_path)?;
    info!(
        count = stations.len(),
        path = %config.stations_path.display(),
        "loaded stations"
    );

    let client = FareClient::new(config.fare_client_config())?;
    let store = FareStore::new(&config.cache_path);
    info!(
        endpoint = client.endpoint(),
        cache = %store.path().display(),
        "fare lookup ready"
    );
    let fares = FareLookup::new(client, store);

    let app = create_router(AppState::new(stations, fares));

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    info!("Metro fare server listening on http://{}", config.addr);
    info!("  GET  /health          - Health check");
    info!("  GET  /metrodata       - Fare between two stations");
    info!("  GET  /searchstations  - Search stations by name");
    info!("  POST /calculatefare   - Total fare for a batch of trips");

    axum::serve(listener, app).await?;
    Ok(())
}
