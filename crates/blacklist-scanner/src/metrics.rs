//! Scan metrics
//!
//! Recorded through the `metrics` facade; nothing is exported unless the
//! caller installs a recorder.

use metrics::{counter, gauge, histogram};
use std::time::Duration;

pub const STAGE_LENGTH: &str = "length";
pub const STAGE_ELEMENTS: &str = "elements";
pub const STAGE_ENRICH: &str = "enrich";

pub const OUTCOME_OK: &str = "ok";
pub const OUTCOME_ERROR: &str = "error";
pub const OUTCOME_TIMEOUT: &str = "timeout";

pub fn record_remote_op(stage: &str, outcome: &str, duration: Duration) {
    counter!("blacklist_remote_ops_total", "stage" => stage.to_string(), "outcome" => outcome.to_string()).increment(1);
    histogram!("blacklist_remote_op_duration_seconds", "stage" => stage.to_string())
        .record(duration.as_secs_f64());
}

pub fn record_retry(stage: &str) {
    counter!("blacklist_remote_retries_total", "stage" => stage.to_string()).increment(1);
}

pub fn record_remote_in_flight(stage: &str, delta: f64) {
    gauge!("blacklist_remote_ops_in_flight", "stage" => stage.to_string()).increment(delta);
}

pub fn record_stage(stage: &str, items: usize, duration: Duration) {
    counter!("blacklist_stage_items_total", "stage" => stage.to_string()).increment(items as u64);
    histogram!("blacklist_stage_duration_seconds", "stage" => stage.to_string())
        .record(duration.as_secs_f64());
}

pub fn set_array_length(length: u64) {
    gauge!("blacklist_array_length").set(length as f64);
}

pub fn set_retained(count: usize) {
    gauge!("blacklist_retained_addresses").set(count as f64);
}
