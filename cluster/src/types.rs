use serde::{Deserialize, Serialize};

/// Identity of one cluster member: its host plus the service endpoints it exposes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeIdentity {
    pub ip: String,
    pub meta_port: u16,
    pub node_identifier: i32,
    pub data_port: u16,
    pub client_port: u16,
}

impl NodeIdentity {
    pub fn new(
        ip: impl Into<String>,
        meta_port: u16,
        node_identifier: i32,
        data_port: u16,
        client_port: u16,
    ) -> Self {
        Self {
            ip: ip.into(),
            meta_port,
            node_identifier,
            data_port,
            client_port,
        }
    }
}

impl Default for NodeIdentity {
    fn default() -> Self {
        Self::new("127.0.0.1", 9003, 0, 40010, 6667)
    }
}

impl std::fmt::Display for NodeIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Node(ip:{}, metaPort:{}, nodeIdentifier:{}, dataPort:{}, clientPort:{})",
            self.ip, self.meta_port, self.node_identifier, self.data_port, self.client_port
        )
    }
}

/// Role of a member inside one raft group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeCharacter {
    /// Accepts writes and replicates its log to the followers
    Leader,

    /// Replicates the leader's log
    Follower,

    /// Campaigning in an election
    Elector,
}

impl std::fmt::Display for NodeCharacter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeCharacter::Leader => write!(f, "LEADER"),
            NodeCharacter::Follower => write!(f, "FOLLOWER"),
            NodeCharacter::Elector => write!(f, "ELECTOR"),
        }
    }
}

/// Status blob returned by a remote node's status endpoint.
///
/// The ranker only cares whether one was obtained; the payload is kept for
/// diagnostics and never interpreted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStatus {
    pub payload: Vec<u8>,
}

impl NodeStatus {
    pub fn new(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            payload: payload.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_node_identity_display() {
        let node = NodeIdentity::new("192.168.1.10", 9003, 2, 40010, 6667);
        assert_eq!(
            node.to_string(),
            "Node(ip:192.168.1.10, metaPort:9003, nodeIdentifier:2, dataPort:40010, clientPort:6667)"
        );
    }

    #[test]
    fn test_node_identity_equality_covers_all_endpoints() {
        let a = NodeIdentity::new("10.0.0.1", 9003, 1, 40010, 6667);
        let b = NodeIdentity::new("10.0.0.1", 9003, 1, 40011, 6667);

        assert_ne!(a, b);

        let mut set = HashSet::new();
        set.insert(a.clone());
        set.insert(a.clone());
        set.insert(b);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_node_character_display() {
        assert_eq!(NodeCharacter::Leader.to_string(), "LEADER");
        assert_eq!(NodeCharacter::Follower.to_string(), "FOLLOWER");
        assert_eq!(NodeCharacter::Elector.to_string(), "ELECTOR");
    }
}
