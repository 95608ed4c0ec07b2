//! Telemetry utilities for operation timing and tracing spans.

use std::time::Instant;

/// Guard for timing an operation and recording metrics.
///
/// Records operation latency when dropped.
pub struct OpTimer {
    operation: &'static str,
    start: Instant,
}

impl OpTimer {
    /// Start timing an operation.
    pub fn new(operation: &'static str) -> Self {
        Self {
            operation,
            start: Instant::now(),
        }
    }
}

impl Drop for OpTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        crate::metrics::record_operation(self.operation, duration);
    }
}

/// Standardized span constructors for authorization observability.
pub mod spans {
    use authz_proto::ContainerId;
    use tracing::{Span, info_span};

    /// Create a span for a service operation against `container`.
    pub fn operation(name: &'static str, container: ContainerId) -> Span {
        info_span!("operation", op = name, container = %container)
    }
}
