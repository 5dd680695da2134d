mod client;
mod factory;
mod store;

use anyhow::Context;
use batch_manager::ConsumerManager;
use batch_reconciler::{Reconciler, REQUEUE_INTERVAL};
use batch_subscription::MemoryBroker;
use batch_telemetry::{init_metrics, init_tracing, Metrics, MetricsCallbacks};
use clap::Parser;
use factory::MemoryConsumerFactory;
use std::net::SocketAddr;
use std::sync::Arc;
use store::FileTriggerStore;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "batch-runner")]
#[command(about = "Runs one Consumer per BatchTrigger config file")]
struct Args {
    /// Path to a BatchTrigger YAML document; repeatable.
    #[arg(required = true)]
    config: Vec<String>,

    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[arg(long, env = "METRICS_ADDR", default_value = "0.0.0.0:9090")]
    metrics_addr: SocketAddr,

    #[arg(long, env = "DISABLE_METRICS", default_value_t = false)]
    disable_metrics: bool,
}

fn parse_level(raw: &str) -> tracing::Level {
    match raw.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        other => {
            eprintln!("invalid log level '{other}', defaulting to 'info'");
            tracing::Level::INFO
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    init_tracing("batch_runner", parse_level(&args.log_level))
        .context("initializing tracing")?;

    if args.disable_metrics {
        warn!("metrics exporter disabled via --disable-metrics");
    } else {
        init_metrics(args.metrics_addr).context("initializing metrics exporter")?;
    }

    let store = Arc::new(FileTriggerStore::load(&args.config)?);
    let keys = store.keys();
    if keys.is_empty() {
        warn!("no triggers loaded, nothing to do");
        return Ok(());
    }

    let broker = Arc::new(MemoryBroker::new());
    let factory = Arc::new(MemoryConsumerFactory::new(broker));
    let callbacks = Arc::new(MetricsCallbacks::new(Metrics::default()));
    let manager = Arc::new(ConsumerManager::with_callbacks(factory, callbacks));
    let reconciler = Arc::new(Reconciler::new(store, manager.clone()));

    info!(count = keys.len(), "starting reconcile loop");

    let mut ticker = tokio::time::interval(REQUEUE_INTERVAL);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                for key in &keys {
                    reconciler.reconcile(key).await;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown signal received");
                break;
            }
        }
    }

    manager.stop_all();
    Ok(())
}
