//! Referral reconciler server binary — loads settings, opens the store,
//! starts the HTTP server, and waits for a shutdown signal.

#![deny(unsafe_code)]

use std::process::ExitCode;

use referral_server::ServerConfig;
use referral_settings::Settings;
use referral_store::StoreAdapter;
use referral_store::sqlite::connection::ConnectionConfig;

#[tokio::main]
async fn main() -> ExitCode {
    let settings = match referral_settings::load_settings() {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("configuration error: {err}");
            return ExitCode::from(2);
        }
    };

    referral_logging::init(settings.environment);

    match run(settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "startup failed");
            ExitCode::from(1)
        }
    }
}

async fn run(settings: Settings) -> Result<(), Box<dyn std::error::Error>> {
    let store = if settings.database.path == ":memory:" {
        StoreAdapter::open_in_memory(&ConnectionConfig::default())?
    } else {
        StoreAdapter::open_file(&settings.database.path, &ConnectionConfig::default())?
    };
    tracing::info!(path = %settings.database.path, "database opened");

    let config = ServerConfig { port: settings.server.port, ..ServerConfig::default() };
    let port = config.port;
    let mut handle =
        referral_server::start(config, store, settings.environment, &settings.auth.jwt_secret)
            .await?;

    tracing::info!(port, "referral reconciler ready");

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received");

    handle.shutdown();
    handle.drain().await;

    Ok(())
}
