mod orbit;
mod telemetry;
mod web;

use clap::Parser;
use std::process::ExitCode;

use crate::web::Config;

#[derive(Parser)]
#[command(name = "iss-relay")]
#[command(about = "Relay live ISS telemetry to WebSocket subscribers")]
struct Cli {
    /// YAML configuration file; built-in defaults apply when omitted
    #[arg(short, long)]
    config: Option<String>,
    /// Listen address, overrides the configuration file
    #[arg(long)]
    bind: Option<String>,
    /// Listen on 0.0.0.0:PORT, overrides --bind
    #[arg(long, env = "PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => match Config::from_file(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config {}: {}", path, e);
                return ExitCode::FAILURE;
            }
        },
        None => Config::default(),
    };

    if let Some(bind) = cli.bind {
        config.web.bind = bind;
    }
    if let Some(port) = cli.port {
        config.web.bind = format!("0.0.0.0:{}", port);
    }

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
        log::info!("Shutting down");
    };

    match web::run_server(config, shutdown).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("Server error: {}", e);
            ExitCode::FAILURE
        }
    }
}
