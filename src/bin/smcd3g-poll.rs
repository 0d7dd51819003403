use std::error::Error;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::Parser;
use tracing::{error, info};
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use smcd3g_poll::modem_modules::config::{PollerConfig, PollerOverrides, load_config};
use smcd3g_poll::{
    ModemSession, PollError, ReportFormat, VERSION, default_sections, read_saved_page, render,
    scrape_status,
};

/// Polls an SMC SMCD3G cable modem and prints its downstream and upstream channel status.
#[derive(Parser, Debug)]
#[command(name = "smcd3g-poll", version = VERSION)]
struct Args {
    /// TOML file with `address`, `username`, `password` and `timeout_seconds`.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Modem address, e.g. 10.1.10.1 or 192.168.0.1:8080.
    #[arg(long)]
    address: Option<String>,

    #[arg(long)]
    username: Option<String>,

    #[arg(long)]
    password: Option<String>,

    /// Per-request HTTP timeout, at least 1.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    timeout_seconds: Option<u64>,

    /// Render a saved status page instead of contacting the modem.
    #[arg(long)]
    page: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    format: ReportFormat,

    /// Also write JSON logs, rotated daily, into this directory.
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

fn init_logging(log_dir: Option<&Path>) {
    // stdout carries the report, so human-readable logs go to stderr.
    let stderr_layer = fmt::layer().with_writer(io::stderr);

    let file_layer = log_dir.map(|dir| {
        fmt::layer()
            .with_writer(rolling::daily(dir, "smcd3g-poll.log"))
            .with_ansi(false)
            .json()
    });

    // Default to `warn` if RUST_LOG is not set.
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();
}

fn resolve_config(args: &Args) -> Result<PollerConfig, PollError> {
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => PollerConfig::default(),
    };

    config.with_overrides(PollerOverrides {
        address: args.address.clone(),
        username: args.username.clone(),
        password: args.password.clone(),
        timeout_seconds: args.timeout_seconds,
    })
}

async fn fetch_page(args: &Args) -> Result<Vec<u8>, PollError> {
    if let Some(path) = &args.page {
        return read_saved_page(path);
    }

    let config = resolve_config(args)?;
    let session = ModemSession::new(&config)?;
    session.poll().await
}

async fn run(args: &Args) -> Result<(), PollError> {
    let page = fetch_page(args).await?;
    let table = scrape_status(&page)?;
    info!(metrics = table.len(), "Status page scraped.");

    // Render fully before printing anything.
    let sections = default_sections();
    let mut report = Vec::new();
    render(&mut report, &table, &sections, args.format)?;

    let mut stdout = io::stdout().lock();
    stdout.write_all(&report)?;
    stdout.flush()?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    init_logging(args.log_dir.as_deref());
    info!(version = VERSION, "Starting modem poll.");

    if let Err(e) = run(&args).await {
        error!(error = %e, "Modem poll failed.");
        return Err(e.into());
    }
    Ok(())
}
