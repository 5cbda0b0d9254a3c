use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

pub const CACHE_HITS: &str = "estate_cache_hits_total";
pub const CACHE_MISSES: &str = "estate_cache_misses_total";
pub const NAZOTTE_SEARCHES: &str = "estate_nazotte_searches_total";

#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    pub service_name: String,
    pub environment: String,
    pub region: Option<String>,
    pub log_level: String,
    pub metrics_addr: Option<String>,
}

impl ObservabilityConfig {
    /// Labels attached to every exported metric. `region` is omitted when unset.
    pub fn global_labels(&self) -> Vec<(&'static str, String)> {
        let mut labels = vec![
            ("service", self.service_name.clone()),
            ("environment", self.environment.clone()),
        ];
        if let Some(region) = &self.region {
            labels.push(("region", region.clone()));
        }
        labels
    }
}

#[derive(Debug, Clone)]
pub struct ObservabilityHandle {
    pub service_name: String,
    pub region: Option<String>,
    pub metrics_enabled: bool,
}

/// Installs the global tracing subscriber (logs go to stderr, leaving stdout
/// for command output) and, when configured, the Prometheus listener.
pub fn init(config: &ObservabilityConfig) -> ObservabilityHandle {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(log_filter(&config.log_level))
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    let metrics_enabled = metrics_listener(config)
        .map(|addr| install_exporter(config, addr))
        .unwrap_or(false);
    describe_metrics();

    ObservabilityHandle {
        service_name: config.service_name.clone(),
        region: config.region.clone(),
        metrics_enabled,
    }
}

pub fn log_startup(handle: &ObservabilityHandle, environment: &str) {
    tracing::info!(
        service = %handle.service_name,
        environment = %environment,
        region = handle.region.as_deref().unwrap_or("-"),
        metrics_enabled = handle.metrics_enabled,
        "estate service starting"
    );
}

fn log_filter(level: &str) -> EnvFilter {
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
}

fn describe_metrics() {
    metrics::describe_counter!(CACHE_HITS, "Estate lookups answered from the cache");
    metrics::describe_counter!(CACHE_MISSES, "Estate lookups that went to the store");
    metrics::describe_counter!(NAZOTTE_SEARCHES, "Polygon searches executed");
}

fn metrics_listener(config: &ObservabilityConfig) -> Option<SocketAddr> {
    let raw = config.metrics_addr.as_deref()?;
    raw.parse()
        .inspect_err(|err| {
            tracing::warn!(
                service = %config.service_name,
                metrics_addr = raw,
                error = %err,
                "ignoring unparsable ESTATE_METRICS_ADDR"
            );
        })
        .ok()
}

fn install_exporter(config: &ObservabilityConfig, addr: SocketAddr) -> bool {
    let builder = config
        .global_labels()
        .into_iter()
        .fold(PrometheusBuilder::new().with_http_listener(addr), |builder, (key, value)| {
            builder.add_global_label(key, value)
        });

    builder
        .install()
        .inspect_err(|err| {
            tracing::warn!(
                service = %config.service_name,
                %addr,
                error = %err,
                "prometheus exporter not installed"
            );
        })
        .is_ok()
}
