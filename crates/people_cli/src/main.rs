//! Process entry point for the person store.
//!
//! # Responsibility
//! - Initialize logging and open the single shared connection.
//! - Run exactly one store operation chosen by subcommand.
//! - Keep an HTTP listener with no routes open until Ctrl-C.
//!
//! # Invariants
//! - A connection or operation failure is logged; the listener still starts.

mod command;

use anyhow::Context;
use clap::Parser;
use command::Command;
use log::{error, info};
use people_core::{
    connect, default_log_level, init_logging, redact_uri, PersonStore, StoreConfig,
    DEFAULT_LISTEN_PORT, URI_ENV,
};
use std::net::SocketAddr;

#[derive(Debug, Parser)]
#[command(name = "people", version, about = "Person document store demo")]
struct Cli {
    /// trace|debug|info|warn|error (defaults by build mode)
    #[arg(long)]
    log_level: Option<String>,

    /// Absolute directory for rolling log files; stderr when omitted
    #[arg(long)]
    log_dir: Option<String>,

    /// Database URI
    #[arg(long, env = URI_ENV)]
    uri: Option<String>,

    /// Listener port
    #[arg(long, default_value_t = DEFAULT_LISTEN_PORT)]
    port: u16,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = cli.log_level.as_deref().unwrap_or(default_log_level());
    init_logging(level, cli.log_dir.as_deref()).map_err(anyhow::Error::msg)?;

    let mut config = StoreConfig::from_env();
    if let Some(uri) = cli.uri {
        config.uri = Some(uri);
    }

    run_command(&config, cli.command).await;
    serve(cli.port).await
}

async fn run_command(config: &StoreConfig, command: Command) {
    let name = command.name();
    let conn = match connect(config).await {
        Ok(conn) => {
            info!(
                "event=connected module=cli status=ok backend={} uri={}",
                conn.backend_name(),
                config.uri.as_deref().map(redact_uri).unwrap_or_default()
            );
            conn
        }
        Err(err) => {
            error!(
                "event=command module=cli status=skipped command={} reason=connect_failed error={}",
                name, err
            );
            return;
        }
    };

    let store = PersonStore::connect_to(&conn, &config.collection);
    match command.run(&store).await {
        Ok(()) => info!("event=command module=cli status=ok command={}", name),
        Err(err) => error!(
            "event=command module=cli status=error command={} error={:#}",
            name, err
        ),
    }
}

async fn serve(port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind listener on {addr}"))?;
    info!("event=listen module=cli status=ok addr={}", addr);
    println!("Server running on port {port}");

    axum::serve(listener, axum::Router::new())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("listener failed")?;

    info!("event=shutdown module=cli status=ok");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(
            "event=shutdown module=cli status=error error_code=signal_install_failed error={}",
            err
        );
        std::future::pending::<()>().await;
    }
}
