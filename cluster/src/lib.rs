//! Replica ranking and raft status reporting for the tsdb cluster.
//!
//! [`ReplicaRanker`] decides in which order the replicas of a group are
//! contacted, using cached, lazily refreshed liveness and latency samples.
//! [`NodeReport`] snapshots the local node's raft group memberships for
//! diagnostics.

pub mod clock;
pub mod config;
pub mod health;
pub mod probe;
pub mod ranker;
pub mod report;
pub mod transport;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::ClusterConfig;
pub use health::{HealthCache, HealthSample, NODE_STATUS_UPDATE_INTERVAL_MS, UNREACHABLE_LATENCY_NS};
pub use probe::{AsyncStatusProbe, ProbeError, StatusProbe, StatusProbeKind, SyncStatusProbe};
pub use ranker::ReplicaRanker;
pub use report::{DataMemberReport, MetaMemberReport, NodeReport, RaftMemberReport, RaftMemberReporter};
pub use transport::{
    AsyncMetaClient, ClusterMembership, PooledClient, SyncClientPool, SyncMetaClient, TransportError,
};
pub use types::*;
