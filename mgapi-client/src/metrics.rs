//! Client metrics definitions
//!
//! OpenTelemetry instruments for monitoring call health and session churn.
//! They are exported through whatever meter provider the application
//! installed (see `mgapi_core::init_observability`).
//!
//! # Metrics Collected
//!
//! - **calls_total**: Logical calls completed, by method and status (counter)
//! - **call_duration**: Logical call latency, retries included (histogram)
//! - **errors_total**: Errors surfaced to callers, by kind (counter)
//! - **authentications_total**: Authentication exchanges, by outcome (counter)
//! - **reauthentications_total**: Session-invalidity retries (counter)
//! - **redirects_total**: Home-server redirections applied (counter)
//! - **multicall_size**: Calls per multicall batch (histogram)
//! - **timeouts_total**: Bounded waits that elapsed (counter)
//!
//! # Examples
//!
//! ```rust,no_run
//! use mgapi_client::ClientMetrics;
//!
//! let metrics = ClientMetrics::new("fleet-sync");
//! metrics.record_call("Get", "success", 0.12);
//! ```

use opentelemetry::{
    global,
    metrics::{Counter, Histogram, Meter},
    KeyValue,
};

/// Client metrics for monitoring
pub struct ClientMetrics {
    /// Total number of logical calls completed
    pub calls_total: Counter<u64>,
    /// Logical call duration in seconds
    pub call_duration: Histogram<f64>,
    /// Total number of errors surfaced to callers
    pub errors_total: Counter<u64>,
    /// Total number of authentication exchanges
    pub authentications_total: Counter<u64>,
    /// Total number of re-authentications triggered by invalid sessions
    pub reauthentications_total: Counter<u64>,
    /// Total number of home-server redirections
    pub redirects_total: Counter<u64>,
    /// Multicall batch size distribution
    pub multicall_size: Histogram<u64>,
    /// Total number of elapsed bounded waits
    pub timeouts_total: Counter<u64>,
}

impl ClientMetrics {
    /// Create a new ClientMetrics instance
    pub fn new(service_name: impl Into<String>) -> Self {
        let name: &'static str = Box::leak(service_name.into().into_boxed_str());
        let meter = global::meter(name);
        Self::new_with_meter(&meter)
    }

    /// Create a new ClientMetrics instance with a custom meter
    pub fn new_with_meter(meter: &Meter) -> Self {
        Self {
            calls_total: meter
                .u64_counter("mgapi.client.calls.total")
                .with_description("Total number of logical calls completed")
                .build(),
            call_duration: meter
                .f64_histogram("mgapi.client.call.duration")
                .with_description("Logical call duration in seconds, retries included")
                .build(),
            errors_total: meter
                .u64_counter("mgapi.client.errors.total")
                .with_description("Total number of errors surfaced to callers")
                .build(),
            authentications_total: meter
                .u64_counter("mgapi.client.authentications.total")
                .with_description("Total number of authentication exchanges")
                .build(),
            reauthentications_total: meter
                .u64_counter("mgapi.client.reauthentications.total")
                .with_description("Total number of re-authentications after an invalid session")
                .build(),
            redirects_total: meter
                .u64_counter("mgapi.client.redirects.total")
                .with_description("Total number of home-server redirections applied")
                .build(),
            multicall_size: meter
                .u64_histogram("mgapi.client.multicall.size")
                .with_description("Number of calls in multicall batches")
                .build(),
            timeouts_total: meter
                .u64_counter("mgapi.client.timeouts.total")
                .with_description("Total number of bounded waits that elapsed")
                .build(),
        }
    }

    /// Record a completed logical call
    pub fn record_call(&self, method: &str, status: &str, duration_secs: f64) {
        let attributes = &[
            KeyValue::new("method", method.to_string()),
            KeyValue::new("status", status.to_string()),
        ];
        self.calls_total.add(1, attributes);
        self.call_duration.record(duration_secs, attributes);
    }

    /// Record an error surfaced to a caller
    pub fn record_error(&self, kind: &str) {
        let attributes = &[KeyValue::new("error_kind", kind.to_string())];
        self.errors_total.add(1, attributes);
    }

    /// Record an authentication exchange
    pub fn record_authentication(&self, outcome: &str) {
        let attributes = &[KeyValue::new("outcome", outcome.to_string())];
        self.authentications_total.add(1, attributes);
    }

    /// Record a re-authentication triggered by an invalid session
    pub fn record_reauthentication(&self, method: &str) {
        let attributes = &[KeyValue::new("method", method.to_string())];
        self.reauthentications_total.add(1, attributes);
    }

    /// Record a redirection to a home server
    pub fn record_redirect(&self) {
        self.redirects_total.add(1, &[]);
    }

    /// Record a multicall batch
    pub fn record_multicall(&self, size: u64) {
        self.multicall_size.record(size, &[]);
    }

    /// Record an elapsed bounded wait
    pub fn record_timeout(&self, method: &str) {
        let attributes = &[KeyValue::new("method", method.to_string())];
        self.timeouts_total.add(1, attributes);
    }
}
