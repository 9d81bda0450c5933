use clap::Parser;
use colored::Colorize;
use std::env;
use tracing::{info, Level};
use tracing_subscriber::{
    fmt::{self, time::ChronoUtc},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use configra_server::{create_app, ConfigraServer, Settings};
use error_common::{log_error, ConfigraError, Result};

/// Configra HTTP Server
#[derive(Parser, Debug)]
#[command(name = "configra-server")]
#[command(about = "Schema-validated, versioned configuration API server")]
struct Args {
    /// Server bind address (overrides settings)
    #[arg(long, env = "CONFIGRA_HOST")]
    host: Option<String>,

    /// Server port (overrides settings)
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// Settings file path (default: ./configra.toml if present)
    #[arg(short, long)]
    config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON log lines
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    init_tracing(args.verbose, args.json_logs);

    if let Err(e) = run(args).await {
        log_error("configra-server", &e);
        return Err(e);
    }
    Ok(())
}

async fn run(args: Args) -> Result<()> {
    let mut settings = Settings::load(args.config.as_deref())
        .map_err(|e| ConfigraError::ConfigError(e.to_string()))?;
    if let Some(host) = args.host {
        settings.server.host = host;
    }
    if let Some(port) = args.port {
        settings.server.port = port;
    }

    info!("{}", "Starting Configra API server".bright_cyan());
    info!(version = env!("CARGO_PKG_VERSION"), backend = ?settings.storage.backend);

    let server = ConfigraServer::from_settings(&settings).await?;
    let app = create_app(server.clone());

    let addr = settings.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| ConfigraError::NetworkError(format!("Failed to bind to {addr}: {e}")))?;

    info!("{}", format!("Configra API listening on http://{addr}").bright_green());
    info!("{}", format!("Health check available at: http://{addr}/health").bright_blue());

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ConfigraError::ServerError(format!("HTTP server error: {e}")));

    server.shutdown().await;
    info!("Configra API stopped");
    served
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

fn init_tracing(verbose: bool, json_logs: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    let is_production = env::var("CONFIGRA_ENV").is_ok_and(|v| v == "production");

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "configra_server={level},config_engine={level},database_layer={level},tower_http=info,sqlx=warn"
        )
        .into()
    });

    if json_logs || is_production {
        // Structured JSON logging for production
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(false)
                    .json(),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_level(true),
            )
            .init();
    }
}
