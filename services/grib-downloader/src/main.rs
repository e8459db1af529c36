//! GRIB file downloader.
//!
//! Resolves a zone (or explicit coordinates) against a configured provider
//! model and streams the GRIB file into the output directory:
//! - Zones from the built-in registry plus config/zones.yaml
//! - Providers from config/models/*.yaml
//! - One `*` on stdout per 100 KiB received
//! - Ctrl+C aborts the transfer and keeps the partial file

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use grib_common::Coordinates;
use grib_downloader::config::{load_provider_configs, load_zones};
use grib_downloader::{ConsoleProgress, DownloadConfig, GribDownloader, NoProgress, ProgressReporter};

#[derive(Parser, Debug)]
#[command(name = "grib-downloader")]
#[command(about = "Download a GRIB file for a zone or a bounding box")]
struct Args {
    /// Provider model id (see --list-models)
    #[arg(short, long, env = "GRIB_MODEL")]
    model: Option<String>,

    /// Named zone (see --list-zones)
    #[arg(short, long, conflicts_with = "coords")]
    zone: Option<String>,

    /// Explicit bounding box: long_min,long_max,lat_min,lat_max
    #[arg(long, value_parser = Coordinates::from_cli_string, allow_hyphen_values = true)]
    coords: Option<Coordinates>,

    /// Directory for downloaded files (default: working directory)
    #[arg(short, long, env = "GRIB_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Configuration directory (contains models/*.yaml and zones.yaml)
    #[arg(long, env = "GRIB_CONFIG_DIR", default_value = "config")]
    config_dir: PathBuf,

    /// Request timeout in seconds
    #[arg(long, env = "GRIB_TIMEOUT_SECS", default_value = "600")]
    timeout_secs: u64,

    /// Ignore HTTP_PROXY / HTTPS_PROXY
    #[arg(long)]
    no_proxy: bool,

    /// List known zones and exit
    #[arg(long)]
    list_zones: bool,

    /// List configured models and exit
    #[arg(long)]
    list_models: bool,

    /// Do not print progress markers
    #[arg(short, long)]
    quiet: bool,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

fn init_tracing(args: &Args) -> Result<()> {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // Logs go to stderr so stdout only carries progress markers.
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);

    if args.log_json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing(&args)?;

    let zones = load_zones(&args.config_dir)?;
    let catalog = load_provider_configs(&args.config_dir)?;

    if args.list_zones {
        for id in zones.zone_ids() {
            if let Some(bbox) = zones.get(id) {
                println!(
                    "{}\tlong {}..{}\tlat {}..{}",
                    id, bbox.long_min, bbox.long_max, bbox.lat_min, bbox.lat_max
                );
            }
        }
        return Ok(());
    }

    if args.list_models {
        for provider in catalog.iter() {
            println!("{}\t{}\t{}", provider.model.id, provider.model.name, provider.model.description);
        }
        return Ok(());
    }

    let model_id = match &args.model {
        Some(id) => id,
        None => bail!("--model is required (see --list-models)"),
    };
    let mut model = catalog.model(model_id)?;

    if let Some(zone) = &args.zone {
        model
            .set_zone(&zones, zone)
            .with_context(|| format!("Cannot use zone '{}' with model '{}'", zone, model_id))?;
    }

    let download_config = DownloadConfig {
        request_timeout: Duration::from_secs(args.timeout_secs),
        system_proxy: !args.no_proxy,
        ..DownloadConfig::default()
    };
    let downloader = GribDownloader::new(download_config)?;

    // Ctrl+C cancels the in-flight download
    let cancel = CancellationToken::new();
    let cancel_on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal");
            cancel_on_signal.cancel();
        }
    });

    let progress: &dyn ProgressReporter = if args.quiet { &NoProgress } else { &ConsoleProgress };

    let result = downloader
        .download_with_cancel(
            &model,
            args.coords,
            args.output_dir.as_deref(),
            progress,
            &cancel,
        )
        .await
        .context("Download failed")?;

    info!(
        path = %result.path.display(),
        bytes = result.bytes_written,
        "Download complete"
    );

    Ok(())
}
