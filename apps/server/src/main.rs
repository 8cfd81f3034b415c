#![warn(clippy::all, clippy::pedantic)]

use std::sync::Arc;

use actix_web::{App, HttpServer, web};
use chrono::Utc;
use clap::{Parser, ValueEnum};
use connwatch::{
    Dispatcher, Heartbeat, LibsqlDirectory, Monitor, SenderConfig, ServerConfig, detector,
};
use tokio::sync::broadcast;
use tracing::info;

mod error;
mod routes;
mod state;
mod validation;

use error::AppError;
use logger::init_tracing;
use state::AppState;

/// Single-link liveness monitor
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Run the monitoring server or the heartbeat sender
    #[arg(long, value_enum, default_value_t = Mode::Server)]
    mode: Mode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    Server,
    Sender,
}

#[actix_web::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    match Cli::parse().mode {
        Mode::Server => run_server(ServerConfig::from_env()?).await,
        Mode::Sender => run_sender(SenderConfig::from_env()?).await,
    }
}

async fn run_server(config: ServerConfig) -> Result<(), AppError> {
    info!("{config}");

    let directory = Arc::new(LibsqlDirectory::open(&config.database_path).await?);
    let detector = detector::from_config(&config, Utc::now());
    let (shutdown_tx, _) = broadcast::channel(1);

    if config.notification_disabled {
        info!("notification disabled");
    } else {
        let dispatcher = Dispatcher::from_config(&config, directory.clone())?;
        let monitor = Monitor::new(detector.clone(), dispatcher, config.heartbeat_interval);
        tokio::spawn(monitor.run(shutdown_tx.subscribe()));
    }

    let state = web::Data::new(AppState::new(detector, directory));
    HttpServer::new(move || App::new().app_data(state.clone()).configure(routes::routes))
        .bind(config.listen_addr)?
        .run()
        .await?;

    let _ = shutdown_tx.send(());
    Ok(())
}

async fn run_sender(config: SenderConfig) -> Result<(), AppError> {
    let heartbeat = Heartbeat::new(&config)?;
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let task = tokio::spawn(heartbeat.run(shutdown_rx));

    tokio::signal::ctrl_c().await?;
    info!("interrupt received, stopping heartbeat");
    let _ = shutdown_tx.send(());
    task.await.ok();

    Ok(())
}
