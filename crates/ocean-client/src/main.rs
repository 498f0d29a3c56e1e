//! ocean-watch: stream one relayer channel to the log.

use anyhow::{Context, Result};
use clap::Parser;
use ocean_client::{ClientConfig, OceanClient, WatchTarget};
use ocean_ws::Channel;
use std::time::Duration;
use tracing::{info, warn};

/// Subscribe to a relayer stream channel and log every message.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via OCEAN_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,

    /// Channel: order_book, candlesticks, trade_history, user_history, user_data, ticker_stats
    #[arg(long, default_value = "ticker_stats")]
    channel: String,

    /// Base token address
    #[arg(long)]
    base: Option<String>,

    /// Quote token address
    #[arg(long)]
    quote: Option<String>,

    /// Candlestick interval in seconds
    #[arg(long)]
    interval: Option<u64>,

    /// User id for user channels
    #[arg(long)]
    user_id: Option<String>,
}

impl Args {
    fn target(&self) -> Result<WatchTarget> {
        let channel: Channel = self.channel.parse()?;
        let target = WatchTarget {
            channel,
            base_token: self.base.clone(),
            quote_token: self.quote.clone(),
            interval: self.interval,
            user_id: self.user_id.clone(),
        };
        target.validate()?;
        Ok(target)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    ocean_ws::init_crypto();

    let args = Args::parse();

    ocean_telemetry::init_logging()?;

    info!("Starting ocean-watch v{}", env!("CARGO_PKG_VERSION"));

    // Config path: CLI arg > OCEAN_CONFIG env var > default
    let config_path = args
        .config
        .clone()
        .or_else(|| std::env::var("OCEAN_CONFIG").ok())
        .unwrap_or_else(|| "config/default.toml".to_string());

    info!(config_path = %config_path, "Loading configuration");
    let config = ClientConfig::from_file(&config_path)?;
    info!(api = %config.api.base_url, stream = %config.stream.url, "Configuration loaded");

    let target = args.target()?;
    let client = OceanClient::new(config).await?;
    client
        .connect_stream()
        .await
        .context("stream connection failed")?;

    let channel = target.channel;
    let handle = client
        .stream()
        .subscribe(channel, target.payload(), move |payload| {
            info!(channel = %channel, payload = %payload, "Stream message");
        })?;
    info!(channel = %channel, key = %handle.key(), "Watching");

    let mut check = tokio::time::interval(Duration::from_secs(1));
    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal.context("failed to listen for Ctrl-C")?;
                info!("Shutdown requested");
                break;
            }
            _ = check.tick() => {
                if !client.stream().is_connected() {
                    warn!("Stream closed by server");
                    break;
                }
            }
        }
    }

    client.shutdown().await;
    Ok(())
}
