//! Strategies for fetching the live status of a remote node.
//!
//! A probe never fails towards its caller: every failure is logged and
//! collapses to `None`.

use crate::config::ClusterConfig;
use crate::transport::{ClusterMembership, TransportError};
use crate::types::{NodeIdentity, NodeStatus};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

/// Why a probe produced no status
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    #[error("no client available")]
    TransportUnavailable,

    #[error(transparent)]
    RemoteCall(#[from] TransportError),

    #[error("probe cancelled")]
    Cancelled,
}

/// Which transport a probe talks through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusProbeKind {
    Sync,
    Async,
}

impl StatusProbeKind {
    pub fn from_config(config: &ClusterConfig) -> Self {
        if config.use_async_transport {
            StatusProbeKind::Async
        } else {
            StatusProbeKind::Sync
        }
    }

    /// Builds the probe for this transport
    pub fn build(
        self,
        membership: Arc<dyn ClusterMembership>,
        cancel: CancellationToken,
    ) -> Arc<dyn StatusProbe> {
        match self {
            StatusProbeKind::Sync => Arc::new(SyncStatusProbe::new(membership, cancel)),
            StatusProbeKind::Async => Arc::new(AsyncStatusProbe::new(membership, cancel)),
        }
    }
}

impl std::fmt::Display for StatusProbeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatusProbeKind::Sync => write!(f, "sync"),
            StatusProbeKind::Async => write!(f, "async"),
        }
    }
}

/// Fetches one remote node's status
#[async_trait]
pub trait StatusProbe: Send + Sync {
    /// Returns the node's status, or `None` on any failure
    async fn fetch_status(&self, node: &NodeIdentity) -> Option<NodeStatus>;

    fn kind(&self) -> StatusProbeKind;
}

/// Probe over pooled blocking connections
pub struct SyncStatusProbe {
    membership: Arc<dyn ClusterMembership>,
    cancel: CancellationToken,
}

impl SyncStatusProbe {
    pub fn new(membership: Arc<dyn ClusterMembership>, cancel: CancellationToken) -> Self {
        Self { membership, cancel }
    }

    async fn try_fetch(&self, node: &NodeIdentity) -> Result<NodeStatus, ProbeError> {
        if self.cancel.is_cancelled() {
            return Err(ProbeError::Cancelled);
        }

        let client = self
            .membership
            .sync_client(node)
            .ok_or(ProbeError::TransportUnavailable)?;

        // The blocking call runs off the async workers. The client goes back
        // to its pool on success and is discarded on transport failure, even
        // if the caller stops waiting.
        let call = tokio::task::spawn_blocking(move || {
            let mut client = client;
            let result = client.query_node_status();
            if result.is_err() {
                client.discard();
            }
            result
        });

        let joined = with_cancel(&self.cancel, call).await?;
        let result = joined.map_err(|e| TransportError::Remote {
            message: format!("status query task failed: {}", e),
        })?;

        Ok(result?)
    }
}

#[async_trait]
impl StatusProbe for SyncStatusProbe {
    async fn fetch_status(&self, node: &NodeIdentity) -> Option<NodeStatus> {
        self.try_fetch(node)
            .await
            .map_err(|e| log_failure(self.kind(), node, &e))
            .ok()
    }

    fn kind(&self) -> StatusProbeKind {
        StatusProbeKind::Sync
    }
}

/// Probe over non-blocking client handles
pub struct AsyncStatusProbe {
    membership: Arc<dyn ClusterMembership>,
    cancel: CancellationToken,
}

impl AsyncStatusProbe {
    pub fn new(membership: Arc<dyn ClusterMembership>, cancel: CancellationToken) -> Self {
        Self { membership, cancel }
    }

    async fn try_fetch(&self, node: &NodeIdentity) -> Result<NodeStatus, ProbeError> {
        if self.cancel.is_cancelled() {
            return Err(ProbeError::Cancelled);
        }

        let client = self
            .membership
            .async_client(node)
            .ok_or(ProbeError::TransportUnavailable)?;

        let status = with_cancel(&self.cancel, client.query_node_status()).await??;
        Ok(status)
    }
}

#[async_trait]
impl StatusProbe for AsyncStatusProbe {
    async fn fetch_status(&self, node: &NodeIdentity) -> Option<NodeStatus> {
        self.try_fetch(node)
            .await
            .map_err(|e| log_failure(self.kind(), node, &e))
            .ok()
    }

    fn kind(&self) -> StatusProbeKind {
        StatusProbeKind::Async
    }
}

/// Waits for `fut` unless the token fires first
async fn with_cancel<F: Future>(
    cancel: &CancellationToken,
    fut: F,
) -> Result<F::Output, ProbeError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ProbeError::Cancelled),
        output = fut => Ok(output),
    }
}

fn log_failure(kind: StatusProbeKind, node: &NodeIdentity, err: &ProbeError) {
    match err {
        ProbeError::TransportUnavailable if kind == StatusProbeKind::Async => {
            warn!(node = %node, "No async client for node status query, skipping");
        }
        ProbeError::TransportUnavailable => {
            error!(node = %node, "Cannot query the node status for no available client");
        }
        ProbeError::RemoteCall(TransportError::Connect { message }) => {
            warn!(node = %node, "Cannot query the node status: {}", message);
        }
        ProbeError::RemoteCall(TransportError::Interrupted) | ProbeError::Cancelled => {
            error!(node = %node, "Node status query interrupted");
        }
        ProbeError::RemoteCall(e) => {
            error!(node = %node, error = %e, "Query node status failed");
        }
    }
}
