//! Prometheus metrics collection for authzd.
//!
//! - `authz_operations_total{operation}` - Service operations by name
//! - `authz_operation_errors_total{operation,error}` - Failed operations by error code
//! - `authz_operation_duration_seconds{operation}` - Operation latency histogram
//! - `authz_denials_total{step}` - Authorization denials by decision step
//! - `authz_containers_created_total` - Containers created
//! - `authz_registered_capabilities` - Capabilities with at least one holder

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::OnceLock;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

/// Service operations processed, by operation name.
pub static OPERATION_COUNTER: OnceLock<IntCounterVec> = OnceLock::new();

/// Service operation latency, by operation name.
pub static OPERATION_LATENCY: OnceLock<HistogramVec> = OnceLock::new();

/// Failed operations, by operation name and error code.
pub static OPERATION_ERRORS: OnceLock<IntCounterVec> = OnceLock::new();

/// Authorization denials, by the decision step that failed.
pub static DENIALS: OnceLock<IntCounterVec> = OnceLock::new();

pub static CONTAINERS_CREATED: OnceLock<IntCounter> = OnceLock::new();

/// Capabilities currently tracked by the holder registry.
pub static REGISTERED_CAPABILITIES: OnceLock<IntGauge> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Safe to call more than once; only the first call registers.
pub fn init() {
    let r = registry();

    macro_rules! register {
        ($metric:ident, $init:expr) => {
            if $metric.get().is_none() {
                match $init {
                    Ok(m) => {
                        if let Err(e) = r.register(Box::new(m.clone())) {
                            tracing::warn!(error = %e, concat!("Failed to register metric ", stringify!($metric)));
                        }
                        let _ = $metric.set(m);
                    }
                    Err(e) => {
                        tracing::error!(error = %e, concat!("Failed to create metric ", stringify!($metric)));
                    }
                }
            }
        };
    }

    register!(OPERATION_COUNTER, IntCounterVec::new(Opts::new("authz_operations_total", "Authorization operations by name"), &["operation"]));
    register!(OPERATION_LATENCY, HistogramVec::new(
        HistogramOpts::new("authz_operation_duration_seconds", "Authorization operation latency by name")
            .buckets(vec![0.00005, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5]),
        &["operation"]));
    register!(OPERATION_ERRORS, IntCounterVec::new(Opts::new("authz_operation_errors_total", "Failed authorization operations"), &["operation", "error"]));
    register!(DENIALS, IntCounterVec::new(Opts::new("authz_denials_total", "Authorization denials by decision step"), &["step"]));
    register!(CONTAINERS_CREATED, IntCounter::new("authz_containers_created_total", "Containers created"));
    register!(REGISTERED_CAPABILITIES, IntGauge::new("authz_registered_capabilities", "Capabilities with registered holders"));
}

/// Gather all metrics and encode them in Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry().gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode Prometheus metrics");
        return String::new();
    }
    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Prometheus metrics were not valid UTF-8");
            String::new()
        }
    }
}

/// Record a completed operation with latency.
#[inline]
pub fn record_operation(operation: &str, duration_secs: f64) {
    if let Some(c) = OPERATION_COUNTER.get() {
        c.with_label_values(&[operation]).inc();
    }
    if let Some(h) = OPERATION_LATENCY.get() {
        h.with_label_values(&[operation]).observe(duration_secs);
    }
}

#[inline]
pub fn record_operation_error(operation: &str, error: &str) {
    if let Some(c) = OPERATION_ERRORS.get() {
        c.with_label_values(&[operation, error]).inc();
    }
}

/// Record a denial at decision step `step`.
#[inline]
pub fn record_denial(step: &str) {
    if let Some(c) = DENIALS.get() {
        c.with_label_values(&[step]).inc();
    }
}

#[inline]
pub fn record_container_created() {
    if let Some(c) = CONTAINERS_CREATED.get() {
        c.inc();
    }
}

#[inline]
pub fn set_registered_capabilities(count: usize) {
    if let Some(g) = REGISTERED_CAPABILITIES.get() {
        g.set(count as i64);
    }
}
