//! punchsync - pull attendance punches from a ZKTeco terminal and upload
//! them to a remote collector.

mod config;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use punchsync::sync::{self, SyncOptions, SyncReport};
use punchsync::{DeviceSession, HttpRecordTransport};
use tracing_subscriber::EnvFilter;

use config::AppConfig;

/// Sync attendance records from a ZKTeco device to the remote API.
#[derive(Parser, Debug)]
#[command(name = "punchsync", version)]
struct Cli {
    /// Config file (defaults to ./punchsync.toml when present)
    #[arg(short, long, env = "PUNCHSYNC_CONFIG")]
    config: Option<PathBuf>,

    /// Records per upload request
    #[arg(long)]
    batch_size: Option<usize>,

    /// Clear the device log after a successful sync
    #[arg(long)]
    clear: bool,

    /// Only test connectivity to the device and the remote API
    #[arg(long)]
    test: bool,

    /// Enable debug output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let filter = if verbose {
        filter.add_directive(tracing::Level::DEBUG.into())
    } else {
        filter
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let mut config = AppConfig::load(cli.config.as_deref()).context("Failed to load config")?;
    config
        .apply_env(|name| std::env::var(name).ok())
        .context("Invalid environment override")?;

    if let Some(batch_size) = cli.batch_size {
        config.sync.batch_size = batch_size;
    }
    if cli.clear {
        config.sync.auto_clear_device = true;
    }

    config.validate()?;

    let mut device = DeviceSession::udp(
        config.device.ip.trim(),
        config.device.port,
        config.device_timeout(),
    );
    let transport = HttpRecordTransport::new(config.http_config(), config.device_info())?;

    if cli.test {
        test_connections(&mut device, &transport).await;
        return Ok(ExitCode::SUCCESS);
    }

    let uploader = config.uploader()?;
    let options = SyncOptions {
        clear_after_sync: config.sync.auto_clear_device,
    };

    tracing::info!(
        device = %device.address(),
        api = transport.base_url(),
        batch_size = uploader.batch_size(),
        "Starting attendance sync"
    );

    let report = sync::run(&mut device, &uploader, &transport, options)
        .await
        .with_context(|| format!("Sync from {} failed", device.address()))?;

    print_report(&report);

    if report.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

async fn test_connections(device: &mut DeviceSession, transport: &HttpRecordTransport) {
    println!("Testing device connection to {}...", device.address());
    match device.connect().await {
        Ok(()) => {
            println!("  Device: OK");
            device.disconnect().await;
        }
        Err(e) => println!("  Device: FAILED ({})", e),
    }

    println!("Testing remote API at {}...", transport.base_url());
    if transport.test_connection().await {
        println!("  Remote API: OK");
        if let Some(status) = transport.sync_status().await {
            println!("  Sync status: {}", status);
        }
    } else {
        println!("  Remote API: FAILED");
    }
}

fn print_report(report: &SyncReport) {
    let Some(upload) = &report.upload else {
        println!("No attendance records found on device");
        return;
    };

    println!("Records read:  {}", report.records_read);
    println!("Batches:       {}", upload.batch_count);
    println!("Sent:          {}", upload.sent);
    println!("Failed:        {}", upload.failed);

    for (index, batch) in upload.batches.iter().enumerate().filter(|(_, b)| !b.success) {
        println!(
            "  batch {}: {}{}",
            index + 1,
            batch.message,
            batch
                .error
                .as_deref()
                .map(|e| format!(" ({})", e))
                .unwrap_or_default()
        );
    }

    if report.cleared {
        println!("Device log cleared");
    }

    println!("{}", upload.message);
}
