//! Translation metrics.
//!
//! Counters describing how translation requests were resolved. Each
//! orchestrator owns its own instance so separate sessions report separately.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct TranslationMetrics {
    /// Requests dropped before any remote call because the text was blank
    skipped_inputs: AtomicUsize,

    /// Calls made to the remote translation service
    remote_calls: AtomicUsize,

    /// Calls that failed outright (transport, service error, panic)
    remote_failures: AtomicUsize,

    /// Calls that succeeded but returned an unusable mapping
    malformed_responses: AtomicUsize,
}

impl TranslationMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_skipped_input(&self) {
        self.skipped_inputs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_remote_call(&self) {
        self.remote_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_remote_failure(&self) {
        self.remote_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_malformed_response(&self) {
        self.malformed_responses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn skipped_inputs(&self) -> usize {
        self.skipped_inputs.load(Ordering::Relaxed)
    }

    pub fn remote_calls(&self) -> usize {
        self.remote_calls.load(Ordering::Relaxed)
    }

    pub fn remote_failures(&self) -> usize {
        self.remote_failures.load(Ordering::Relaxed)
    }

    pub fn malformed_responses(&self) -> usize {
        self.malformed_responses.load(Ordering::Relaxed)
    }

    /// Generate a metrics report.
    pub fn report(&self) -> MetricsReport {
        let calls = self.remote_calls();
        let failures = self.remote_failures();
        let malformed = self.malformed_responses();
        let succeeded = calls.saturating_sub(failures + malformed);
        let success_rate = if calls > 0 {
            (succeeded as f64 / calls as f64) * 100.0
        } else {
            0.0
        };

        MetricsReport {
            skipped_inputs: self.skipped_inputs(),
            remote_calls: calls,
            remote_failures: failures,
            malformed_responses: malformed,
            success_rate,
        }
    }
}

/// Snapshot of translation statistics.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    pub skipped_inputs: usize,
    pub remote_calls: usize,
    pub remote_failures: usize,
    pub malformed_responses: usize,

    /// Share of remote calls that produced a usable mapping, as a percentage (0-100)
    pub success_rate: f64,
}
