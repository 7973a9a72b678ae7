//! Chat server entry point
//!
//! Binds the listening socket and runs the accept loop.

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use chatline::serve;

/// Line-oriented TCP chat server
#[derive(Parser, Debug)]
#[command(name = "chatline-server", version, about)]
struct Cli {
    /// TCP port to listen on
    #[arg(value_parser = clap::value_parser!(u16).range(1..))]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging with environment filter
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=chatline=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chatline=info")),
        )
        .init();

    let cli = Cli::parse();

    // Socket setup failures are the only fatal runtime errors.
    let addr = format!("0.0.0.0:{}", cli.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to listen on {addr}"))?;

    info!("chat server listening on {}", addr);

    serve(listener).await?;
    Ok(())
}
