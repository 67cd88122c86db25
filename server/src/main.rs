//! HelloWorld server
//!
//! Serves `pb.hello.HelloWorld` over gRPC, with an optional admin HTTP
//! endpoint for health checks, Prometheus metrics and the service map.

use anyhow::{Context, Result};
use clap::Parser;
use hello_server::{
    config::ServerConfig,
    server::{self, http, Readiness},
};
use std::path::PathBuf;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "hello-server")]
#[command(about = "pb.hello.HelloWorld gRPC server", long_about = None)]
#[command(version)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// gRPC listen address (overrides config)
    #[arg(short, long)]
    listen: Option<String>,

    /// Admin HTTP listen address (overrides config)
    #[arg(long)]
    admin: Option<String>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool, json: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn load_config(args: &Args) -> Result<ServerConfig> {
    let mut config = ServerConfig::load(args.config.as_deref())?;
    if let Some(listen) = &args.listen {
        config.listen_addr = listen.clone();
    }
    if let Some(admin) = &args.admin {
        config.admin_addr = Some(admin.clone());
    }
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose, args.json_logs);

    let config = load_config(&args)?;
    if args.print_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    let shutdown = CancellationToken::new();
    let readiness = Readiness::new();

    if let Some(admin_addr) = config.admin_socket_addr()? {
        let readiness = readiness.clone();
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if let Err(e) = http::serve_admin(admin_addr, readiness, shutdown).await {
                error!("Admin HTTP server error: {}", e);
            }
        });
    }

    let listen_addr = config.listen_socket_addr()?;
    let listener = TcpListener::bind(listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", listen_addr))?;
    info!("Starting HelloWorld server on {}", listen_addr);

    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown signal received");
                signal_token.cancel();
            }
            Err(e) => warn!("Cannot listen for shutdown signal: {}", e),
        }
    });

    server::serve(&config, listener, readiness, shutdown).await
}
