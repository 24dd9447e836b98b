use crate::types::{NodeIdentity, NodeStatus};
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Latency recorded for a node that has never answered, or whose last probe failed
pub const UNREACHABLE_LATENCY_NS: i64 = i64::MAX;

/// A cached status older than this must be refreshed before it is used again
pub const NODE_STATUS_UPDATE_INTERVAL_MS: i64 = 60 * 1000;

/// Cached liveness and latency of one node.
///
/// Fields are updated independently; readers may observe a mix of two
/// refreshes, which is acceptable for advisory ranking data.
#[derive(Debug)]
pub struct HealthSample {
    status: RwLock<Option<NodeStatus>>,
    last_update_time_ms: AtomicI64,
    last_response_latency_ns: AtomicI64,
}

impl HealthSample {
    pub fn new() -> Self {
        Self {
            status: RwLock::new(None),
            last_update_time_ms: AtomicI64::new(0),
            last_response_latency_ns: AtomicI64::new(UNREACHABLE_LATENCY_NS),
        }
    }

    /// Last status obtained from the node, if any
    pub fn status(&self) -> Option<NodeStatus> {
        self.status.read().clone()
    }

    pub fn has_status(&self) -> bool {
        self.status.read().is_some()
    }

    pub fn last_update_time_ms(&self) -> i64 {
        self.last_update_time_ms.load(Ordering::Acquire)
    }

    pub fn last_response_latency_ns(&self) -> i64 {
        self.last_response_latency_ns.load(Ordering::Acquire)
    }

    /// A sample is fresh when it holds a status no older than the update interval
    pub fn is_fresh(&self, now_ms: i64) -> bool {
        self.has_status()
            && now_ms.saturating_sub(self.last_update_time_ms()) <= NODE_STATUS_UPDATE_INTERVAL_MS
    }

    pub fn record_success(&self, status: NodeStatus, now_ms: i64, latency_ns: i64) {
        *self.status.write() = Some(status);
        self.last_update_time_ms.store(now_ms, Ordering::Release);
        self.last_response_latency_ns
            .store(latency_ns, Ordering::Release);
    }

    /// Marks the node unreachable. Status and update time are left alone so
    /// the next lookup probes again instead of waiting out the interval.
    pub fn record_failure(&self) {
        self.last_response_latency_ns
            .store(UNREACHABLE_LATENCY_NS, Ordering::Release);
    }
}

impl Default for HealthSample {
    fn default() -> Self {
        Self::new()
    }
}

/// Concurrent map of node identity to its health sample
#[derive(Debug, Default)]
pub struct HealthCache {
    samples: DashMap<NodeIdentity, Arc<HealthSample>>,
}

impl HealthCache {
    pub fn new() -> Self {
        Self {
            samples: DashMap::new(),
        }
    }

    /// Returns the node's sample, creating it on first access.
    ///
    /// Creation happens under the shard lock of the key, so concurrent
    /// callers always share a single sample per node.
    pub fn get_or_create(&self, node: &NodeIdentity) -> Arc<HealthSample> {
        if let Some(sample) = self.samples.get(node) {
            return sample.value().clone();
        }

        self.samples
            .entry(node.clone())
            .or_insert_with(|| Arc::new(HealthSample::new()))
            .value()
            .clone()
    }

    pub fn get(&self, node: &NodeIdentity) -> Option<Arc<HealthSample>> {
        self.samples.get(node).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Drops every cached sample
    pub fn reset_all(&self) {
        self.samples.clear();
    }
}
