use anyhow::{Context, Result};
use clap::Parser;
use std::future::Future;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use airbnb_fetch::commands::fetch::{self, RunTally};
use airbnb_fetch::core::config::{Config, DEFAULT_DATA_DIR, DEFAULT_TIMEOUT_SECS};
use airbnb_fetch::core::download::Downloader;
use airbnb_fetch::core::registry::DatasetRegistry;

#[derive(Parser)]
#[clap(name = "airbnb-fetch")]
#[clap(about = "Download Inside Airbnb listings and calendar datasets")]
#[clap(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Directory that receives one sub-directory per city
    #[clap(long, default_value = DEFAULT_DATA_DIR)]
    data_dir: PathBuf,
    /// Only fetch the named city (repeatable; default: all cities)
    #[clap(long = "city")]
    cities: Vec<String>,
    /// Connect and inactivity timeout in seconds
    #[clap(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout: u64,
    /// Print the final tally as JSON
    #[clap(long)]
    json: bool,
    /// Enable debug logging
    #[clap(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "debug,hyper=warn,hyper_util=warn,reqwest=warn,rustls=warn"
    } else {
        "info,hyper=warn,hyper_util=warn,reqwest=warn,rustls=warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Registers the termination handlers now and resolves once one fires.
#[cfg(unix)]
fn interrupt_signal() -> impl Future<Output = ()> {
    use tokio::signal::unix::{signal, SignalKind};

    let sigterm = signal(SignalKind::terminate());
    let sigint = signal(SignalKind::interrupt());

    async move {
        match (sigterm, sigint) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => info!("Received SIGTERM"),
                    _ = sigint.recv() => info!("Received SIGINT (Ctrl+C)"),
                }
            }
            _ => {
                warn!("Could not register signal handlers, falling back to ctrl_c");
                if tokio::signal::ctrl_c().await.is_err() {
                    std::future::pending::<()>().await;
                }
            }
        }
    }
}

#[cfg(windows)]
fn interrupt_signal() -> impl Future<Output = ()> {
    let ctrl_c = tokio::signal::windows::ctrl_c();

    async move {
        match ctrl_c {
            Ok(mut ctrl_c) => {
                ctrl_c.recv().await;
                info!("Received Ctrl+C");
            }
            Err(e) => {
                warn!("Failed to listen for Ctrl+C: {e}");
                std::future::pending::<()>().await;
            }
        }
    }
}

async fn run(cli: &Cli) -> Result<RunTally> {
    let interrupted = interrupt_signal();

    let config = Config::default()
        .with_data_dir(&cli.data_dir)
        .with_timeout(Duration::from_secs(cli.timeout));
    let registry = DatasetRegistry::builtin().select(&cli.cities)?;
    let downloader = Downloader::new(&config).context("Failed to build HTTP client")?;

    info!(
        "Downloading listings and calendar data for {}",
        registry.city_names().join(", ")
    );

    let tally = fetch::fetch_until(&config, &registry, &downloader, interrupted).await?;
    Ok(tally)
}

fn report(cli: &Cli, tally: &RunTally) -> Result<()> {
    if cli.json {
        println!("{}", serde_json::to_string(tally)?);
    } else {
        tally.print_summary();
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to start runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    let result = runtime.block_on(run(&cli));
    // An interrupted extraction may still hold a blocking thread; don't wait for it.
    runtime.shutdown_background();

    let result = result.and_then(|tally| report(&cli, &tally).map(|_| tally));
    if let Err(e) = &result {
        error!("{e:#}");
    }
    ExitCode::from(fetch::exit_status(&result))
}
