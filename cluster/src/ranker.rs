use crate::clock::{Clock, SystemClock};
use crate::config::ClusterConfig;
use crate::health::{HealthCache, HealthSample};
use crate::probe::{StatusProbe, StatusProbeKind};
use crate::transport::ClusterMembership;
use crate::types::NodeIdentity;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Orders replicas so that live, low-latency nodes are contacted first.
///
/// Health of remote nodes is cached and refreshed lazily: a node is probed
/// only when its cached status is missing or older than
/// [`NODE_STATUS_UPDATE_INTERVAL_MS`](crate::health::NODE_STATUS_UPDATE_INTERVAL_MS).
pub struct ReplicaRanker {
    membership: Arc<dyn ClusterMembership>,
    probe: Arc<dyn StatusProbe>,
    clock: Arc<dyn Clock>,
    cache: HealthCache,
    cancel: CancellationToken,
}

impl ReplicaRanker {
    /// Create a ranker probing through the transport selected by `config`
    pub fn new(config: &ClusterConfig, membership: Arc<dyn ClusterMembership>) -> Self {
        let cancel = CancellationToken::new();
        let kind = StatusProbeKind::from_config(config);
        let probe = kind.build(membership.clone(), cancel.clone());

        info!(this_node = %config.this_node, probe = %kind, "Replica ranker created");

        Self::with_probe(membership, probe, Arc::new(SystemClock::new()), cancel)
    }

    pub fn with_probe(
        membership: Arc<dyn ClusterMembership>,
        probe: Arc<dyn StatusProbe>,
        clock: Arc<dyn Clock>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            membership,
            probe,
            clock,
            cache: HealthCache::new(),
            cancel,
        }
    }

    /// Returns `nodes` sorted by ascending response latency.
    ///
    /// The input is left untouched and ties keep their relative order. Each
    /// distinct node is resolved once per call, which may probe it.
    pub async fn reorder(&self, nodes: &[NodeIdentity]) -> Vec<NodeIdentity> {
        let mut latencies: HashMap<&NodeIdentity, i64> = HashMap::with_capacity(nodes.len());
        for node in nodes {
            if latencies.contains_key(node) {
                continue;
            }
            let latency = self.resolve_status(node).await.last_response_latency_ns();
            latencies.insert(node, latency);
        }

        let mut ranked: Vec<(i64, &NodeIdentity)> =
            nodes.iter().map(|node| (latencies[node], node)).collect();
        ranked.sort_by_key(|(latency, _)| *latency);

        ranked.into_iter().map(|(_, node)| node.clone()).collect()
    }

    /// Latency of the node's last successful probe in nanoseconds, or
    /// [`UNREACHABLE_LATENCY_NS`](crate::health::UNREACHABLE_LATENCY_NS)
    pub async fn last_response_latency(&self, node: &NodeIdentity) -> i64 {
        self.resolve_status(node).await.last_response_latency_ns()
    }

    /// Returns the node's health sample, refreshing it first if it is stale
    pub async fn resolve_status(&self, node: &NodeIdentity) -> Arc<HealthSample> {
        let sample = self.cache.get_or_create(node);
        if *node == self.membership.this_node() {
            return sample;
        }

        if sample.is_fresh(self.clock.wall_millis()) {
            return sample;
        }

        let started = self.clock.monotonic_nanos();
        let status = self.probe.fetch_status(node).await;
        let elapsed = self.clock.monotonic_nanos().saturating_sub(started);
        let elapsed = i64::try_from(elapsed).unwrap_or(i64::MAX);

        match status {
            Some(status) => {
                sample.record_success(status, self.clock.wall_millis(), elapsed);
                info!(
                    node = %node,
                    probe = %self.probe.kind(),
                    latency_ns = elapsed,
                    "Node status updated"
                );
            }
            None => {
                sample.record_failure();
                info!(
                    node = %node,
                    probe = %self.probe.kind(),
                    has_status = sample.has_status(),
                    "Node status unavailable, marked unreachable"
                );
            }
        }

        sample
    }

    /// Forgets every cached sample
    pub fn reset_all(&self) {
        debug!("Clearing {} cached node samples", self.cache.len());
        self.cache.reset_all();
    }

    /// Interrupts in-flight probes; later probes fail immediately
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn cache(&self) -> &HealthCache {
        &self.cache
    }

    pub fn probe_kind(&self) -> StatusProbeKind {
        self.probe.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::health::UNREACHABLE_LATENCY_NS;
    use crate::transport::{AsyncMetaClient, PooledClient};
    use crate::types::NodeStatus;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::time::Duration;

    struct StaticMembership {
        this_node: NodeIdentity,
    }

    impl ClusterMembership for StaticMembership {
        fn this_node(&self) -> NodeIdentity {
            self.this_node.clone()
        }

        fn sync_client(&self, _node: &NodeIdentity) -> Option<PooledClient> {
            None
        }

        fn async_client(&self, _node: &NodeIdentity) -> Option<Arc<dyn AsyncMetaClient>> {
            None
        }
    }

    /// Probe answering with per-node latencies, advancing a manual clock
    struct LatencyProbe {
        clock: Arc<ManualClock>,
        latencies: Mutex<HashMap<NodeIdentity, Duration>>,
        calls: Mutex<Vec<NodeIdentity>>,
    }

    #[async_trait]
    impl StatusProbe for LatencyProbe {
        async fn fetch_status(&self, node: &NodeIdentity) -> Option<NodeStatus> {
            self.calls.lock().push(node.clone());
            let latency = self.latencies.lock().get(node).copied()?;
            self.clock.advance(latency);
            Some(NodeStatus::default())
        }

        fn kind(&self) -> StatusProbeKind {
            StatusProbeKind::Async
        }
    }

    fn node(id: i32) -> NodeIdentity {
        NodeIdentity::new(format!("10.0.0.{}", id), 9003, id, 40010, 6667)
    }

    fn ranker_with(
        latencies: &[(NodeIdentity, u64)],
    ) -> (ReplicaRanker, Arc<LatencyProbe>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(1_000_000));
        let probe = Arc::new(LatencyProbe {
            clock: clock.clone(),
            latencies: Mutex::new(
                latencies
                    .iter()
                    .map(|(n, ms)| (n.clone(), Duration::from_millis(*ms)))
                    .collect(),
            ),
            calls: Mutex::new(Vec::new()),
        });
        let membership = Arc::new(StaticMembership { this_node: node(0) });
        let ranker = ReplicaRanker::with_probe(
            membership,
            probe.clone(),
            clock.clone(),
            CancellationToken::new(),
        );
        (ranker, probe, clock)
    }

    #[tokio::test]
    async fn test_reorder_by_latency() {
        let (ranker, _, _) = ranker_with(&[(node(1), 50), (node(2), 10), (node(3), 30)]);

        let ordered = ranker.reorder(&[node(1), node(2), node(3)]).await;

        assert_eq!(ordered, vec![node(2), node(3), node(1)]);
    }

    #[tokio::test]
    async fn test_reorder_empty() {
        let (ranker, probe, _) = ranker_with(&[]);

        assert!(ranker.reorder(&[]).await.is_empty());
        assert!(probe.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_duplicates_probe_once() {
        let (ranker, probe, _) = ranker_with(&[(node(1), 20), (node(2), 5)]);

        let ordered = ranker.reorder(&[node(1), node(2), node(1)]).await;

        assert_eq!(ordered, vec![node(2), node(1), node(1)]);
        assert_eq!(probe.calls.lock().len(), 2);
    }

    #[tokio::test]
    async fn test_ties_keep_input_order() {
        let (ranker, _, _) = ranker_with(&[]);

        // every node unreachable, so all share the sentinel key
        let input = vec![node(4), node(1), node(3), node(2)];
        let ordered = ranker.reorder(&input).await;

        assert_eq!(ordered, input);
    }

    #[tokio::test]
    async fn test_self_is_never_probed() {
        let (ranker, probe, clock) = ranker_with(&[(node(0), 1)]);

        clock.advance(Duration::from_secs(3600));
        assert_eq!(
            ranker.last_response_latency(&node(0)).await,
            UNREACHABLE_LATENCY_NS
        );
        assert!(probe.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_failed_probe_is_retried_next_call() {
        let (ranker, probe, _) = ranker_with(&[]);

        ranker.last_response_latency(&node(9)).await;
        ranker.last_response_latency(&node(9)).await;

        assert_eq!(probe.calls.lock().len(), 2);
    }

    #[tokio::test]
    async fn test_reset_all_forgets_samples() {
        let (ranker, _, _) = ranker_with(&[(node(1), 3)]);
        assert_eq!(ranker.last_response_latency(&node(1)).await, 3_000_000);

        ranker.reset_all();

        assert!(ranker.cache().is_empty());
    }

    #[tokio::test]
    async fn test_latency_beyond_i64_is_clamped() {
        let slow_ms = i64::MAX as u64 / 1_000_000 + 1;
        let (ranker, _, _) = ranker_with(&[(node(1), slow_ms), (node(2), 5)]);

        assert_eq!(ranker.last_response_latency(&node(1)).await, i64::MAX);
        assert_eq!(
            ranker.reorder(&[node(1), node(2)]).await,
            vec![node(2), node(1)]
        );
    }

    #[test]
    fn test_new_selects_probe_from_config() {
        let membership = Arc::new(StaticMembership { this_node: node(0) });
        let config = ClusterConfig {
            this_node: node(0),
            use_async_transport: false,
        };

        let ranker = ReplicaRanker::new(&config, membership);

        assert_eq!(ranker.probe_kind(), StatusProbeKind::Sync);
        assert!(!ranker.is_cancelled());
        ranker.cancel();
        assert!(ranker.is_cancelled());
    }
}
