//! Ambient logging/metrics init shared by the `batch-runner` binary.
//! Every BatchTrigger's `spec.logLevel` narrows its own target filter on
//! top of whatever this sets process-wide.

use anyhow::Context;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod metrics;

pub use metrics::{Metrics, MetricsCallbacks};

/// Installs a JSON-formatted `tracing` subscriber. Every target logs at
/// `default_level` unless `service_name` needs to run louder or quieter
/// than that baseline. Call once at startup.
pub fn init_tracing(service_name: &str, default_level: tracing::Level) -> anyhow::Result<()> {
    let filter = Targets::new()
        .with_default(LevelFilter::from_level(default_level))
        .with_target(service_name.to_string(), default_level);

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().json().with_target(true))
        .try_init()
        .context("installing global tracing subscriber")?;

    Ok(())
}

/// Starts the Prometheus exporter's HTTP listener. Distinct from the
/// in-memory `ConsumerStats` the Reconciler reads synchronously for
/// status write-back — this is for external scraping only.
pub fn init_metrics(listen_addr: SocketAddr) -> anyhow::Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(listen_addr)
        .install()
        .context("installing Prometheus metrics exporter")?;
    Ok(())
}
