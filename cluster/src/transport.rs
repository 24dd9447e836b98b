//! Seams to the transport layer that carries status queries.
//!
//! Connection management lives outside this crate; the ranker only needs a
//! way to borrow a blocking client from a pool or to grab a non-blocking
//! client handle for a given node.

use crate::types::{NodeIdentity, NodeStatus};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Failures reported by a transport client
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The connection could not be established or was refused
    #[error("connection failed: {message}")]
    Connect { message: String },

    /// The remote side or the protocol failed mid-call
    #[error("remote call failed: {message}")]
    Remote { message: String },

    /// The call was interrupted before it completed
    #[error("call interrupted")]
    Interrupted,
}

/// Blocking client for the meta service of one node
pub trait SyncMetaClient: Send {
    fn query_node_status(&mut self) -> Result<NodeStatus, TransportError>;

    /// Closes the underlying connection
    fn close(&mut self);
}

/// Pool that owns blocking clients
pub trait SyncClientPool: Send + Sync {
    fn put_back(&self, node: &NodeIdentity, client: Box<dyn SyncMetaClient>);
}

/// Non-blocking client for the meta service of one node
#[async_trait]
pub trait AsyncMetaClient: Send + Sync {
    async fn query_node_status(&self) -> Result<NodeStatus, TransportError>;
}

/// The local node's view of the cluster and its connections
pub trait ClusterMembership: Send + Sync {
    fn this_node(&self) -> NodeIdentity;

    /// Borrows a pooled blocking client, `None` when no connection is available
    fn sync_client(&self, node: &NodeIdentity) -> Option<PooledClient>;

    /// Returns a non-blocking client, `None` when the node is unreachable or
    /// its connection backlog is full
    fn async_client(&self, node: &NodeIdentity) -> Option<Arc<dyn AsyncMetaClient>>;
}

/// A blocking client borrowed from a pool.
///
/// Dropping the guard hands the client back to its pool. A client that saw a
/// transport failure must be [`discard`](PooledClient::discard)ed instead; a
/// guard dropped while unwinding is closed as well.
pub struct PooledClient {
    node: NodeIdentity,
    client: Option<Box<dyn SyncMetaClient>>,
    pool: Arc<dyn SyncClientPool>,
}

impl PooledClient {
    pub fn new(
        node: NodeIdentity,
        client: Box<dyn SyncMetaClient>,
        pool: Arc<dyn SyncClientPool>,
    ) -> Self {
        Self {
            node,
            client: Some(client),
            pool,
        }
    }

    pub fn node(&self) -> &NodeIdentity {
        &self.node
    }

    pub fn query_node_status(&mut self) -> Result<NodeStatus, TransportError> {
        match self.client.as_mut() {
            Some(client) => client.query_node_status(),
            None => Err(TransportError::Connect {
                message: "client already released".to_string(),
            }),
        }
    }

    /// Closes the client without returning it to the pool
    pub fn discard(mut self) {
        if let Some(mut client) = self.client.take() {
            debug!(node = %self.node, "Discarding pooled client");
            client.close();
        }
    }
}

impl Drop for PooledClient {
    fn drop(&mut self) {
        if let Some(mut client) = self.client.take() {
            if std::thread::panicking() {
                client.close();
            } else {
                self.pool.put_back(&self.node, client);
            }
        }
    }
}

impl std::fmt::Debug for PooledClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledClient")
            .field("node", &self.node)
            .field("released", &self.client.is_none())
            .finish()
    }
}
