//! Metrics collection for observability
//!
//! Each [`Ledger`](crate::Ledger) owns its own Prometheus registry, so
//! several ledgers can live in one process (tests do this constantly).
//!
//! # Metrics
//!
//! - `tracker_deposits_total` - Accepted deposits
//! - `tracker_withdrawals_total` - Accepted withdrawals
//! - `tracker_withdrawals_rejected_total` - Withdrawals rejected for insufficient balance
//! - `tracker_operations_cancelled_total` - Operations whose context fired while waiting
//! - `tracker_accounts` - Accounts with an entry in the ledger
//! - `tracker_operation_duration_seconds` - Latency of ledger operations, by operation

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntGauge, Opts, Registry, TextEncoder,
};
use std::fmt;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Accepted deposits
    pub deposits_total: IntCounter,

    /// Accepted withdrawals
    pub withdrawals_total: IntCounter,

    /// Rejected withdrawals
    pub withdrawals_rejected_total: IntCounter,

    /// Cancelled operations
    pub cancelled_total: IntCounter,

    /// Tracked accounts
    pub accounts: IntGauge,

    /// Operation latency, labelled by operation name
    pub operation_duration: HistogramVec,

    registry: Registry,
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let deposits_total = IntCounter::new("tracker_deposits_total", "Accepted deposits")?;
        registry.register(Box::new(deposits_total.clone()))?;

        let withdrawals_total =
            IntCounter::new("tracker_withdrawals_total", "Accepted withdrawals")?;
        registry.register(Box::new(withdrawals_total.clone()))?;

        let withdrawals_rejected_total = IntCounter::new(
            "tracker_withdrawals_rejected_total",
            "Withdrawals rejected for insufficient balance",
        )?;
        registry.register(Box::new(withdrawals_rejected_total.clone()))?;

        let cancelled_total = IntCounter::new(
            "tracker_operations_cancelled_total",
            "Operations whose context fired while waiting for an account lock",
        )?;
        registry.register(Box::new(cancelled_total.clone()))?;

        let accounts = IntGauge::with_opts(Opts::new(
            "tracker_accounts",
            "Accounts with an entry in the ledger",
        ))?;
        registry.register(Box::new(accounts.clone()))?;

        let operation_duration = HistogramVec::new(
            HistogramOpts::new(
                "tracker_operation_duration_seconds",
                "Latency of ledger operations, lock wait included",
            )
            .buckets(vec![
                0.000_01, 0.000_05, 0.000_1, 0.000_5, 0.001, 0.005, 0.010, 0.050, 0.100, 1.0,
            ]),
            &["operation"],
        )?;
        registry.register(Box::new(operation_duration.clone()))?;

        Ok(Self {
            deposits_total,
            withdrawals_total,
            withdrawals_rejected_total,
            cancelled_total,
            accounts,
            operation_duration,
            registry,
        })
    }

    /// Record an accepted deposit
    pub fn record_deposit(&self) {
        self.deposits_total.inc();
    }

    /// Record an accepted withdrawal
    pub fn record_withdrawal(&self) {
        self.withdrawals_total.inc();
    }

    /// Record a withdrawal rejected for insufficient balance
    pub fn record_rejected_withdrawal(&self) {
        self.withdrawals_rejected_total.inc();
    }

    /// Record a cancelled wait
    pub fn record_cancelled(&self) {
        self.cancelled_total.inc();
    }

    /// Record a newly created account entry
    pub fn record_account_created(&self) {
        self.accounts.inc();
    }

    /// Record operation duration
    pub fn record_duration(&self, operation: &str, duration_seconds: f64) {
        self.operation_duration
            .with_label_values(&[operation])
            .observe(duration_seconds);
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Render all metrics in the Prometheus text format
    pub fn encode_text(&self) -> prometheus::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

impl fmt::Debug for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Metrics")
            .field("deposits_total", &self.deposits_total.get())
            .field("withdrawals_total", &self.withdrawals_total.get())
            .field("withdrawals_rejected_total", &self.withdrawals_rejected_total.get())
            .field("cancelled_total", &self.cancelled_total.get())
            .field("accounts", &self.accounts.get())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().unwrap();
        assert_eq!(metrics.deposits_total.get(), 0);
        assert_eq!(metrics.withdrawals_total.get(), 0);
        assert_eq!(metrics.accounts.get(), 0);
    }

    #[test]
    fn test_independent_registries() {
        let first = Metrics::new().unwrap();
        let second = Metrics::new().unwrap();

        first.record_deposit();
        first.record_deposit();
        second.record_withdrawal();

        assert_eq!(first.deposits_total.get(), 2);
        assert_eq!(second.deposits_total.get(), 0);
        assert_eq!(second.withdrawals_total.get(), 1);
    }

    #[test]
    fn test_encode_text() {
        let metrics = Metrics::new().unwrap();
        metrics.record_rejected_withdrawal();
        metrics.record_account_created();
        metrics.record_account_created();
        metrics.record_account_created();
        metrics.record_duration("deposit", 0.0002);

        let text = metrics.encode_text().unwrap();
        assert!(text.contains("tracker_withdrawals_rejected_total 1"));
        assert!(text.contains("tracker_accounts 3"));
        assert!(text.contains("tracker_operation_duration_seconds_count{operation=\"deposit\"} 1"));
    }
}
