use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use config::{Config, Environment, File};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use statuswatch_engine::{Engine, EngineSources};
use statuswatch_http::{
    ConnectionSource, HubClient, OsSource, StashSource, SystemInfoSource,
};

mod host;

use host::{format_system_info, ConsoleToolbar, LogNotifier};

#[derive(Parser, Debug)]
#[command(name = "statuswatch")]
#[command(about = "Console status monitor for a device hub")]
struct Args {
    /// Device hub endpoint
    #[arg(short, long, default_value = "http://127.0.0.1:8000")]
    endpoint: String,

    /// Optional config file, merged with STATUSWATCH_* environment
    /// variables
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Connection poll interval in milliseconds
    #[arg(long, default_value = "500")]
    connection_interval_ms: u64,

    /// OS/update poll interval in milliseconds
    #[arg(long, default_value = "2000")]
    update_interval_ms: u64,

    /// Stash readiness poll interval in milliseconds
    #[arg(long, default_value = "2000")]
    stash_interval_ms: u64,

    /// System-info poll interval in milliseconds
    #[arg(long, default_value = "5000")]
    system_info_interval_ms: u64,

    /// Toast auto-close in milliseconds
    #[arg(long, default_value = "5000")]
    auto_close_ms: u64,

    /// HTTP request timeout in seconds
    #[arg(long, default_value = "10")]
    request_timeout_secs: u64,
}

/// Resolve the endpoint, letting a config file and STATUSWATCH_*
/// environment variables override the command line default.
fn resolve_endpoint(args: &Args) -> Result<String> {
    let Some(path) = &args.config else {
        return Ok(args.endpoint.clone());
    };

    let settings = Config::builder()
        .add_source(File::from(path.as_path()))
        .add_source(Environment::with_prefix("STATUSWATCH"))
        .build()?;

    Ok(settings
        .get_string("endpoint")
        .unwrap_or_else(|_| args.endpoint.clone()))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let endpoint = resolve_endpoint(&args)?;

    let client = HubClient::builder()
        .endpoint(&endpoint)
        .timeout(Duration::from_secs(args.request_timeout_secs))
        .build();

    // The stash watcher only runs when the hub reports the feature
    // online; a failed probe disables it for this run.
    let stash_enabled = match client.stash_capability().await {
        Ok(enabled) => enabled,
        Err(error) => {
            warn!(%error, "capability probe failed, stash watcher disabled");
            false
        }
    };

    let engine = Engine::builder(ConsoleToolbar::default(), LogNotifier::default())
        .connection_interval(Duration::from_millis(args.connection_interval_ms))
        .update_interval(Duration::from_millis(args.update_interval_ms))
        .stash_interval(Duration::from_millis(args.stash_interval_ms))
        .system_info_interval(Duration::from_millis(args.system_info_interval_ms))
        .auto_close(Duration::from_millis(args.auto_close_ms))
        .stash_enabled(stash_enabled)
        .start(EngineSources {
            connection: ConnectionSource::new(client.clone()),
            os: OsSource::new(client.clone()),
            stash: StashSource::new(client.clone()),
            system_info: SystemInfoSource::new(client),
        });

    // Mirror system-info changes onto the console; the task ends when
    // shutdown drops the engine's sender.
    let mut system_info = engine.system_info();
    tokio::spawn(async move {
        while system_info.changed().await.is_ok() {
            let line = format_system_info(&system_info.borrow_and_update());
            println!("[system-info] {line}");
        }
    });

    info!(%endpoint, stash_enabled, "statuswatch running, ctrl-c to stop");

    tokio::signal::ctrl_c().await?;

    info!("shutting down");
    engine.shutdown().await;

    Ok(())
}
