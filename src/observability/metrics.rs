//! Metrics collection.
//!
//! # Metrics
//! - `anchor_runs_total` (counter): finished runs by outcome category
//! - `anchor_uniqueness_conflicts_total` (counter): rejected candidates
//! - `anchor_rpc_errors_total` (counter): ledger errors by kind
//! - `anchor_cache_lookups_total` (counter): verification cache hits/misses
//!
//! Recording goes through the `metrics` facade; without an installed
//! recorder every call is a no-op.

use metrics::counter;

pub fn record_run(outcome: &'static str) {
    counter!("anchor_runs_total", "outcome" => outcome).increment(1);
}

pub fn record_uniqueness_conflict() {
    counter!("anchor_uniqueness_conflicts_total").increment(1);
}

pub fn record_rpc_error(kind: &'static str) {
    counter!("anchor_rpc_errors_total", "kind" => kind).increment(1);
}

pub fn record_cache_lookup(hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    counter!("anchor_cache_lookups_total", "result" => result).increment(1);
}
