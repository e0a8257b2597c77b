//! Global atomic counters for riskgate observability.
//!
//! Counters are incremented silently at the call site. Call
//! [`Metrics::flush`] to emit current values as a single
//! `tracing::info!` event.

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

/// Lightweight atomic counters.
pub struct Metrics {
    decisions_computed: AtomicU64,
    artifacts_generated: AtomicU64,
    artifacts_rejected: AtomicU64,
    sessions_started: AtomicU64,
    remediation_attempts: AtomicU64,
    sessions_timed_out: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            decisions_computed: AtomicU64::new(0),
            artifacts_generated: AtomicU64::new(0),
            artifacts_rejected: AtomicU64::new(0),
            sessions_started: AtomicU64::new(0),
            remediation_attempts: AtomicU64::new(0),
            sessions_timed_out: AtomicU64::new(0),
        }
    }

    pub fn inc_decisions(&self) {
        self.decisions_computed.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "decisions_computed", "counter incremented");
    }

    /// Record one generation pass: `valid` kept, `rejected` filtered out.
    pub fn add_artifacts(&self, valid: u64, rejected: u64) {
        self.artifacts_generated.fetch_add(valid, Ordering::Relaxed);
        self.artifacts_rejected.fetch_add(rejected, Ordering::Relaxed);
        tracing::trace!(metric = "artifacts", valid, rejected, "counters incremented");
    }

    pub fn inc_sessions_started(&self) {
        self.sessions_started.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "sessions_started", "counter incremented");
    }

    pub fn inc_remediation_attempts(&self) {
        self.remediation_attempts.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "remediation_attempts", "counter incremented");
    }

    pub fn inc_sessions_timed_out(&self) {
        self.sessions_timed_out.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "sessions_timed_out", "counter incremented");
    }

    /// Emit all current counter values as a single `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            decisions_computed = self.decisions_computed(),
            artifacts_generated = self.artifacts_generated(),
            artifacts_rejected = self.artifacts_rejected(),
            sessions_started = self.sessions_started(),
            remediation_attempts = self.remediation_attempts(),
            sessions_timed_out = self.sessions_timed_out(),
        );
    }

    pub fn decisions_computed(&self) -> u64 {
        self.decisions_computed.load(Ordering::Relaxed)
    }

    pub fn artifacts_generated(&self) -> u64 {
        self.artifacts_generated.load(Ordering::Relaxed)
    }

    pub fn artifacts_rejected(&self) -> u64 {
        self.artifacts_rejected.load(Ordering::Relaxed)
    }

    pub fn sessions_started(&self) -> u64 {
        self.sessions_started.load(Ordering::Relaxed)
    }

    pub fn remediation_attempts(&self) -> u64 {
        self.remediation_attempts.load(Ordering::Relaxed)
    }

    pub fn sessions_timed_out(&self) -> u64 {
        self.sessions_timed_out.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        self.decisions_computed.store(0, Ordering::Relaxed);
        self.artifacts_generated.store(0, Ordering::Relaxed);
        self.artifacts_rejected.store(0, Ordering::Relaxed);
        self.sessions_started.store(0, Ordering::Relaxed);
        self.remediation_attempts.store(0, Ordering::Relaxed);
        self.sessions_timed_out.store(0, Ordering::Relaxed);
    }
}
