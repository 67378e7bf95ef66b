use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use wicket::config::Config;
use wicket::http::client;
use wicket::reply;
use wicket::server::{Server, shutdown};

#[derive(Parser)]
#[command(name = "wicket", about = "Minimal HTTP/1.1 server with an admin kill switch")]
struct Cli {
    /// YAML config file (defaults to $WICKET_CONFIG, then built-in defaults)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the service and admin listeners
    Serve,
    /// Send the kill message to a running server
    Kill {
        /// Admin address to contact instead of the configured one
        #[arg(long)]
        addr: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let cfg = match cli.config {
        Some(path) => Config::load_from(Some(path.as_path())),
        None => Config::load(),
    }
    .context("Failed to load configuration")?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(cfg).await,
        Command::Kill { addr } => kill(cfg, addr).await,
    }
}

async fn serve(cfg: Config) -> anyhow::Result<()> {
    let server = Server::bind(&cfg, reply::handler()).await?;
    let handle = server.shutdown_handle();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received");
            handle.trigger();
        }
    });

    server.run().await
}

async fn kill(cfg: Config, addr: Option<String>) -> anyhow::Result<()> {
    let addr = addr.unwrap_or_else(|| cfg.admin.listen_addr.clone());
    let kill = shutdown::kill_message(&cfg.admin);

    let reply = client::send_request(&addr, &kill, cfg.server.read_limits()).await?;
    tracing::info!(
        status = reply.status_code(),
        reason = reply.status_reason(),
        "{}",
        reply.body_text()
    );

    if reply.status_code() != 200 {
        anyhow::bail!("server refused the kill message");
    }
    Ok(())
}
