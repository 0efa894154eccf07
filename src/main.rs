//! Heartline notification replay tool.
//!
//! Wires the realtime notification pipeline to in-process adapters and
//! drives it from JSON lines on stdin. Raised toasts are printed to stdout
//! as JSON, followed by the final unread summary.

use std::sync::Arc;

use async_trait::async_trait;
use clap::Parser;
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{EnvFilter, fmt};

use heartline_core::config::AppConfig;
use heartline_core::result::AppResult;
use heartline_core::traits::{ChannelStatus, ProfileSummary, SystemNotifier};
use heartline_core::types::{IncomingMessageEvent, NotificationId, PeerId};
use heartline_realtime::NotificationCenter;
use heartline_realtime::bridge::{MemoryFeed, NetworkMonitor, StaticProfiles};

/// Replay a message stream through the notification pipeline.
#[derive(Debug, Parser)]
#[command(name = "heartline-notify", version, about)]
struct Cli {
    /// Signed-in user id
    #[arg(short, long)]
    user: String,

    /// Base configuration file (without extension)
    #[arg(short, long, default_value = "config/default")]
    config: String,

    /// Environment overlay under `config/` (defaults to $HEARTLINE_ENV or "development")
    #[arg(short, long)]
    env: Option<String>,

    /// Known sender profile as `peer=Display Name`; repeatable
    #[arg(short, long = "profile", value_parser = parse_profile)]
    profiles: Vec<(PeerId, String)>,

    /// Start with the network offline
    #[arg(long)]
    offline: bool,

    /// Time to let in-flight deliveries settle after end of input
    #[arg(long, default_value_t = 200)]
    settle_ms: u64,
}

fn parse_profile(raw: &str) -> Result<(PeerId, String), String> {
    match raw.split_once('=') {
        Some((peer, name)) if !peer.is_empty() && !name.is_empty() => {
            Ok((PeerId::new(peer), name.to_string()))
        }
        _ => Err(format!("expected peer=name, got '{raw}'")),
    }
}

/// One line of replay input.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ReplayLine {
    /// A row delivered by the change feed
    Message(IncomingMessageEvent),
    /// The user opened a conversation
    Open { peer: PeerId },
    /// The user left the open conversation
    Close,
    /// The user dismissed a toast
    Dismiss { id: NotificationId },
    /// Connectivity lost
    Offline,
    /// Connectivity restored
    Online,
    /// Channel status pushed by the feed, e.g. `{"type":"status","status":"TIMED_OUT"}`
    Status(ChannelStatus),
}

/// Platform notifier that records alerts in the log.
#[derive(Debug)]
struct TracingNotifier;

#[async_trait]
impl SystemNotifier for TracingNotifier {
    async fn show(&self, title: &str, body: &str, icon_url: Option<&str>) -> AppResult<()> {
        tracing::info!(icon = icon_url.unwrap_or("-"), "[system] {}: {}", title, body);
        Ok(())
    }

    async fn play_chime(&self) -> AppResult<()> {
        tracing::debug!("[system] chime");
        Ok(())
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let env = cli
        .env
        .clone()
        .or_else(|| std::env::var("HEARTLINE_ENV").ok())
        .unwrap_or_else(|| "development".to_string());

    let config = match AppConfig::load_from(&cli.config, &env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(cli, config).await {
        tracing::error!("Replay error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing/logging. Logs go to stderr so stdout stays JSON.
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(std::io::stderr)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

async fn run(cli: Cli, config: AppConfig) -> AppResult<()> {
    tracing::info!("Starting heartline-notify v{}", env!("CARGO_PKG_VERSION"));

    let profiles = Arc::new(StaticProfiles::new());
    for (peer, name) in cli.profiles {
        profiles.insert(
            peer,
            ProfileSummary {
                display_name: name,
                photo_url: None,
            },
        );
    }

    let feed = Arc::new(MemoryFeed::with_auto_ack());
    let network = Arc::new(NetworkMonitor::new(!cli.offline));

    let center = NotificationCenter::new(
        PeerId::new(cli.user),
        profiles,
        Some(Arc::new(TracingNotifier)),
        config.notifications.clone(),
    );
    center
        .connect(feed.clone(), network.clone(), &config.feed)
        .await?;

    let mut toasts = center.on_notification();
    let printer = tokio::spawn(async move {
        while let Ok(entry) = toasts.recv().await {
            match serde_json::to_string(&entry) {
                Ok(line) => println!("{line}"),
                Err(e) => tracing::warn!("Failed to encode notification: {}", e),
            }
        }
    });

    let every = config
        .notifications
        .sweep_interval()
        .max(std::time::Duration::from_secs(1));
    let mut sweep = tokio::time::interval(every);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("Interrupted, shutting down");
                break;
            }
            _ = sweep.tick() => {
                let removed = center.sweep_notifications();
                if removed > 0 {
                    tracing::debug!(removed, "Swept stale notifications");
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match serde_json::from_str::<ReplayLine>(line) {
                    Ok(cmd) => apply(&center, &feed, &network, cmd),
                    Err(e) => tracing::warn!("Skipping malformed input line: {}", e),
                }
            }
        }
    }

    tokio::time::sleep(std::time::Duration::from_millis(cli.settle_ms)).await;

    let summary = center.unread_summary();
    center.close().await;
    drop(center);
    if let Err(e) = printer.await {
        tracing::warn!("Notification printer ended abnormally: {}", e);
    }

    println!("{}", serde_json::to_string(&summary)?);
    Ok(())
}

fn apply(
    center: &NotificationCenter,
    feed: &MemoryFeed,
    network: &NetworkMonitor,
    cmd: ReplayLine,
) {
    match cmd {
        ReplayLine::Message(evt) => {
            if feed.deliver(evt) == 0 {
                tracing::debug!("No active subscription accepted the message");
            }
        }
        ReplayLine::Open { peer } => center.open_conversation(peer),
        ReplayLine::Close => center.close_conversation(),
        ReplayLine::Dismiss { id } => {
            if !center.dismiss_notification(id) {
                tracing::debug!(notification = %id, "Notification already gone");
            }
        }
        ReplayLine::Offline => network.set_online(false),
        ReplayLine::Online => network.set_online(true),
        ReplayLine::Status(status) => {
            feed.report(status);
        }
    }
}

/// Wait for Ctrl+C. Never resolves if the handler cannot be installed.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }
}
