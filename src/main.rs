//! linkcard-web server
//!
//! Serves the link preview endpoint and health probes.

use anyhow::Context;
use clap::Parser;
use linkcard_web::config::{parse_host, ServerConfig};

/// Link preview service
#[derive(Parser, Debug)]
#[command(name = "linkcard")]
#[command(version)]
#[command(about = "Fetches URLs and returns Open Graph preview cards")]
struct Args {
    /// Port to listen on (overrides LINKCARD_PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Host to bind to (overrides LINKCARD_HOST)
    #[arg(short = 'H', long)]
    host: Option<String>,

    /// Outbound fetch timeout in milliseconds (overrides LINKCARD_FETCH_TIMEOUT_MS)
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // RUST_LOG wins over --verbose
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(if args.verbose { "debug" } else { "info" })
    });

    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = ServerConfig::from_env().context("failed to load configuration")?;

    if let Some(host) = args.host.as_deref() {
        config.host = parse_host(host).context("invalid --host")?;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(timeout_ms) = args.timeout_ms {
        config.fetch.timeout_ms = timeout_ms;
    }
    config.validate().context("invalid configuration")?;

    tracing::info!(
        "{} {} starting on {}",
        linkcard_web::NAME,
        linkcard_web::VERSION,
        config.bind_addr()
    );
    config.log_summary();

    linkcard_web::server::serve(config)
        .await
        .context("server exited with an error")?;

    Ok(())
}
