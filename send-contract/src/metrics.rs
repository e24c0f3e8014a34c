//! Metrics collection for observability
//!
//! # Metrics
//!
//! - `send_check_total{outcome}` - CheckTx calls by outcome
//! - `send_deliver_total{outcome}` - DeliverTx calls by outcome
//! - `send_transferred_amount_total` - Sum of delivered transfer amounts
//! - `send_pruned_accounts_total` - Drained accounts deleted from state
//!
//! Outcome is `ok` or [`crate::Error::kind`].

use prometheus::{IntCounter, IntCounterVec, Opts, Registry};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// CheckTx outcomes
    pub check_total: IntCounterVec,

    /// DeliverTx outcomes
    pub deliver_total: IntCounterVec,

    /// Total amount moved by delivered transfers
    pub transferred_amount: IntCounter,

    /// Accounts deleted after being drained
    pub pruned_accounts: IntCounter,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector with its own registry
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let check_total = IntCounterVec::new(
            Opts::new("send_check_total", "CheckTx calls by outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(check_total.clone()))?;

        let deliver_total = IntCounterVec::new(
            Opts::new("send_deliver_total", "DeliverTx calls by outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(deliver_total.clone()))?;

        let transferred_amount = IntCounter::new(
            "send_transferred_amount_total",
            "Sum of delivered transfer amounts",
        )?;
        registry.register(Box::new(transferred_amount.clone()))?;

        let pruned_accounts = IntCounter::new(
            "send_pruned_accounts_total",
            "Drained accounts deleted from state",
        )?;
        registry.register(Box::new(pruned_accounts.clone()))?;

        Ok(Self {
            check_total,
            deliver_total,
            transferred_amount,
            pruned_accounts,
            registry,
        })
    }

    /// Record a CheckTx outcome
    pub fn record_check(&self, outcome: &str) {
        self.check_total.with_label_values(&[outcome]).inc();
    }

    /// Record a DeliverTx outcome
    pub fn record_deliver(&self, outcome: &str) {
        self.deliver_total.with_label_values(&[outcome]).inc();
    }

    /// Record a committed transfer
    pub fn record_transfer(&self, amount: u64, pruned: bool) {
        self.transferred_amount.inc_by(amount);
        if pruned {
            self.pruned_accounts.inc();
        }
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Render all metrics in the Prometheus text format
    pub fn render(&self) -> prometheus::Result<String> {
        use prometheus::{Encoder, TextEncoder};

        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics")
            .field("transferred_amount", &self.transferred_amount.get())
            .field("pruned_accounts", &self.pruned_accounts.get())
            .finish_non_exhaustive()
    }
}
