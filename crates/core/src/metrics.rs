//! Metrics Module
//!
//! Gauges and counters for pool monitoring.

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics instance
pub static METRICS: once_cell::sync::Lazy<Metrics> = once_cell::sync::Lazy::new(Metrics::new);

/// Pool metrics collection
pub struct Metrics {
    /// Number of transactions currently pooled
    pub mem_pool_size: AtomicU64,
    /// Estimated pool memory footprint in bytes
    pub mem_pool_bytes: AtomicU64,
    /// Transactions accepted since startup
    pub txs_accepted: AtomicU64,
    /// Transactions evicted by fee replacement since startup
    pub txs_evicted: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            mem_pool_size: AtomicU64::new(0),
            mem_pool_bytes: AtomicU64::new(0),
            txs_accepted: AtomicU64::new(0),
            txs_evicted: AtomicU64::new(0),
        }
    }

    /// Set pool size gauge
    pub fn set_mem_pool_size(&self, size: u64) {
        self.mem_pool_size.store(size, Ordering::Relaxed);
    }

    /// Set pool bytes gauge
    pub fn set_mem_pool_bytes(&self, bytes: u64) {
        self.mem_pool_bytes.store(bytes, Ordering::Relaxed);
    }

    /// Increment accepted counter
    pub fn inc_txs_accepted(&self) {
        self.txs_accepted.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment evicted counter
    pub fn inc_txs_evicted(&self) {
        self.txs_evicted.fetch_add(1, Ordering::Relaxed);
    }

    /// Get metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            mem_pool_size: self.mem_pool_size.load(Ordering::Relaxed),
            mem_pool_bytes: self.mem_pool_bytes.load(Ordering::Relaxed),
            txs_accepted: self.txs_accepted.load(Ordering::Relaxed),
            txs_evicted: self.txs_evicted.load(Ordering::Relaxed),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Metrics snapshot for reporting
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub mem_pool_size: u64,
    pub mem_pool_bytes: u64,
    pub txs_accepted: u64,
    pub txs_evicted: u64,
}
