use anyhow::{Context, Result};
use clap::Parser;
use junction::actuation::LogDriver;
use junction::config::Config;
use junction::remote;
use junction::runtime::Runtime;
use junction::status::NoLink;
use junction::traffic::{ControlMessage, Signal};
use std::path::PathBuf;
use tokio::io::BufReader;
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "junction", version, about = "Adaptive two-phase traffic controller")]
struct Cli {
    /// TOML configuration file; built-in defaults when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Begin the phase cycle immediately instead of waiting for a start command
    #[arg(short, long, default_value_t = false)]
    start: bool,

    /// Print the transition audit trail as JSON on exit
    #[arg(long, default_value_t = false)]
    audit: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => Config::default(),
    };
    info!(?config, "configuration loaded");

    let (reports_tx, mut reports_rx) = mpsc::channel(8);
    let runtime = Runtime::spawn(config, LogDriver, NoLink, reports_tx);
    let inbox = runtime.inbox();

    if cli.start {
        inbox
            .send(ControlMessage::Signal(Signal::Start))
            .await
            .context("controller stopped before the cycle could start")?;
    }

    let reader = tokio::spawn(async move {
        match remote::forward_lines(BufReader::new(tokio::io::stdin()), inbox).await {
            Ok(forwarded) => info!(forwarded, "remote input closed"),
            Err(e) => error!("reading remote commands failed: {e}"),
        }
    });

    let printer = tokio::spawn(async move {
        while let Some(report) = reports_rx.recv().await {
            match report.to_event_json() {
                Ok(line) => println!("{line}"),
                Err(e) => warn!("cannot serialize status report: {e}"),
            }
        }
    });

    signal::ctrl_c().await?;
    info!("Ctrl+C received, shutting down");
    reader.abort();

    let history = runtime.shutdown().await;
    let _ = printer.await;

    if cli.audit {
        if let Some(history) = history {
            println!("{}", serde_json::to_string_pretty(&history)?);
        }
    }

    // A blocked stdin read would otherwise hold the runtime open on drop.
    std::process::exit(0)
}
