//! Portico Gateway - Main Entry Point
//! `run` handles one CLI-mode request, `serve` fronts HTTP, `fingerprint` prints the host digest

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{Map, Value};
use std::net::SocketAddr;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use portico_core::application::{BootOutcome, Halt, HandlerRegistry, JsonInputReader};
use portico_core::domain::{RequestEnv, Stage};
use portico_core::port::BufferedResponse;
use portico_daemon::{config, server, Gateway};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "portico")]
#[command(about = "Portico request lifecycle gateway", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (toml, json, yaml, ini); defaults to ~/.portico/portico.toml if present
    #[arg(long, global = true, env = "PORTICO_CONFIG")]
    config: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one request in CLI mode and print the payload
    Run {
        /// Command string, e.g. "system-ping|backup"
        #[arg(short, long)]
        cmd: Option<String>,

        /// Request data as a JSON object
        #[arg(short, long)]
        data: Option<String>,

        /// Last stage to run (INIT, READ, EXEC, FLUSH or 1-4)
        #[arg(short, long, default_value = "FLUSH")]
        stage: Stage,
    },

    /// Serve HTTP requests
    Serve {
        /// Listen address
        #[arg(short, long, env = "PORTICO_BIND", default_value = server::DEFAULT_BIND)]
        bind: SocketAddr,
    },

    /// Print the machine fingerprint
    Fingerprint,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    init_logging()?;
    let cli = Cli::parse();

    info!("Portico Gateway v{} starting...", VERSION);

    let os_adapter = portico_infra_system::detect();

    if let Commands::Fingerprint = cli.command {
        let digest = os_adapter.fingerprint().await?;
        println!("{digest}");
        return Ok(ExitCode::SUCCESS);
    }

    let gateway_config = config::load(cli.config.as_deref())?;
    let gateway = Gateway::new(gateway_config, HandlerRegistry::new(), os_adapter);

    match cli.command {
        Commands::Run { cmd, data, stage } => run_once(&gateway, cmd, data, stage).await,
        Commands::Serve { bind } => {
            server::serve(gateway, bind).await?;
            info!("Shutdown complete.");
            Ok(ExitCode::SUCCESS)
        }
        Commands::Fingerprint => Ok(ExitCode::SUCCESS),
    }
}

/// Logs go to stderr; stdout carries only the payload
fn init_logging() -> Result<()> {
    let log_format = std::env::var("PORTICO_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("portico=info"))
        .context("Failed to create env filter")?;

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty().with_writer(std::io::stderr))
                .init();
        }
    }
    Ok(())
}

async fn run_once(
    gateway: &Gateway,
    cmd: Option<String>,
    data: Option<String>,
    stage: Stage,
) -> Result<ExitCode> {
    let mut fields: Map<String, Value> = match data {
        Some(raw) => serde_json::from_str(&raw).context("--data must be a JSON object")?,
        None => Map::new(),
    };
    if let Some(cmd) = cmd {
        fields.insert("cmd".to_string(), Value::String(cmd));
    }

    let mut controller = gateway.controller(
        RequestEnv::from_process_env(),
        JsonInputReader::new(fields),
        BufferedResponse::new(),
    );
    let outcome = controller.boot(stage).await;
    let (pool, sink) = controller.into_parts();

    print!("{}", sink.body());

    match outcome {
        BootOutcome::Completed(_) | BootOutcome::Halted(Halt::Stopped) if pool.errors.is_empty() => {
            Ok(ExitCode::SUCCESS)
        }
        _ => Ok(ExitCode::FAILURE),
    }
}
