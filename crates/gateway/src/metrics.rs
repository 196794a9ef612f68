//! Balancer metrics definitions.
//!
//! Counters go through the `metrics` facade; the binary decides whether a
//! Prometheus recorder is installed. Without one every call is a no-op.

use metrics::{counter, describe_counter};

/// Admissions by outcome (`ok`, `invalid-address`, `unreachable`).
pub const ADMISSIONS_TOTAL: &str = "lb_admissions_total";
/// Routed requests by outcome (`ok`, `unavailable`).
pub const ROUTES_TOTAL: &str = "lb_routes_total";
/// Management requests rejected by the rate limiter.
pub const RATE_LIMITED_TOTAL: &str = "lb_rate_limited_total";

/// Register metric descriptions with the installed recorder.
pub fn init_metrics() {
    describe_counter!(ADMISSIONS_TOTAL, "Server admission attempts by outcome");
    describe_counter!(ROUTES_TOTAL, "Routed requests by outcome");
    describe_counter!(
        RATE_LIMITED_TOTAL,
        "Management requests rejected by the per-client rate limiter"
    );
}

fn outcome<T>(result: &corelib::Result<T>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(e) => e.reason(),
    }
}

pub fn record_admission<T>(result: &corelib::Result<T>) {
    counter!(ADMISSIONS_TOTAL, "outcome" => outcome(result)).increment(1);
}

pub fn record_route<T>(result: &corelib::Result<T>) {
    counter!(ROUTES_TOTAL, "outcome" => outcome(result)).increment(1);
}

pub fn record_rate_limited() {
    counter!(RATE_LIMITED_TOTAL).increment(1);
}
