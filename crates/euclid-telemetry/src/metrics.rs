//! Request counters.
//!
//! Metrics go through the `metrics` facade; the host application decides
//! which recorder (if any) receives them.
//!
//! | Metric | Type | Labels |
//! |--------|------|--------|
//! | `euclid_requests_total` | Counter | `operation`, `outcome`, `status` |
//! | `euclid_request_duration_seconds` | Histogram | `operation` |
//! | `euclid_validation_failures_total` | Counter | `operation`, `error_type` |

use std::sync::Once;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_histogram, histogram};

/// Requests dispatched, by terminal state.
pub const REQUESTS_TOTAL: &str = "euclid_requests_total";
/// Handler latency.
pub const REQUEST_DURATION: &str = "euclid_request_duration_seconds";
/// Requests rejected by contract validation.
pub const VALIDATION_FAILURES_TOTAL: &str = "euclid_validation_failures_total";

static DESCRIBED: Once = Once::new();

/// Registers metric descriptions with the installed recorder.
pub fn describe_metrics() {
    DESCRIBED.call_once(|| {
        describe_counter!(REQUESTS_TOTAL, "Requests dispatched by the router");
        describe_histogram!(
            REQUEST_DURATION,
            metrics::Unit::Seconds,
            "Time from dispatch to response"
        );
        describe_counter!(
            VALIDATION_FAILURES_TOTAL,
            "Requests rejected before reaching a handler"
        );
    });
}

/// Records a completed request.
pub fn record_request(operation: &str, outcome: &str, status: u16, duration: Duration) {
    counter!(
        REQUESTS_TOTAL,
        "operation" => operation.to_string(),
        "outcome" => outcome.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!(REQUEST_DURATION, "operation" => operation.to_string())
        .record(duration.as_secs_f64());
}

/// Records a request rejected by validation.
pub fn record_validation_failure(operation: &str, error_type: &str) {
    counter!(
        VALIDATION_FAILURES_TOTAL,
        "operation" => operation.to_string(),
        "error_type" => error_type.to_string()
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_functions_dont_panic() {
        describe_metrics();
        describe_metrics();
        record_request("listPets", "handled", 200, Duration::from_millis(3));
        record_request("unmatched", "unmatched", 404, Duration::ZERO);
        record_validation_failure("createPet", "MissingRequired");
    }
}
