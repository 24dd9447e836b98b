//! Point-in-time reports of the local node's raft group memberships.
//!
//! The rendered text is consumed by operational tooling and must stay stable.

use crate::types::{NodeCharacter, NodeIdentity};
use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tsdb_common::{Result, TsdbError};

/// State shared by every raft member report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaftMemberReport {
    pub character: NodeCharacter,
    pub leader: Option<NodeIdentity>,
    pub term: u64,
    pub last_log_term: u64,
    pub last_log_index: u64,
    pub read_only: bool,
    /// Wall-clock milliseconds of the last heartbeat received
    pub last_heartbeat_received_time_ms: i64,
}

impl RaftMemberReport {
    pub fn new(
        character: NodeCharacter,
        leader: Option<NodeIdentity>,
        term: u64,
        last_log_term: u64,
        last_log_index: u64,
        read_only: bool,
        last_heartbeat_received_time_ms: i64,
    ) -> Self {
        Self {
            character,
            leader,
            term,
            last_log_term,
            last_log_index,
            read_only,
            last_heartbeat_received_time_ms,
        }
    }

    fn leader_display(&self) -> String {
        match &self.leader {
            Some(leader) => leader.to_string(),
            None => "null".to_string(),
        }
    }
}

/// The node's membership in the cluster metadata group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaMemberReport {
    pub member: RaftMemberReport,
}

impl MetaMemberReport {
    pub fn new(member: RaftMemberReport) -> Self {
        Self { member }
    }
}

impl fmt::Display for MetaMemberReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = &self.member;
        write!(
            f,
            "MetaMemberReport{{character={}, Leader={}, term={}, lastLogTerm={}, lastLogIndex={}, readOnly={}, lastHeartbeat={}}}",
            m.character,
            m.leader_display(),
            m.term,
            m.last_log_term,
            m.last_log_index,
            m.read_only,
            render_timestamp(m.last_heartbeat_received_time_ms),
        )
    }
}

/// The node's membership in one data group, identified by the group's header node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataMemberReport {
    pub header: NodeIdentity,
    pub member: RaftMemberReport,
    /// Last measured response latency of the header node, in nanoseconds
    pub header_latency_ns: i64,
}

impl DataMemberReport {
    pub fn new(header: NodeIdentity, member: RaftMemberReport, header_latency_ns: i64) -> Self {
        Self {
            header,
            member,
            header_latency_ns,
        }
    }
}

impl fmt::Display for DataMemberReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = &self.member;
        write!(
            f,
            "DataMemberReport{{header={}, character={}, Leader={}, term={}, lastLogTerm={}, lastLogIndex={}, readOnly={}, headerLatency={}, lastHeartbeat={}}}",
            self.header,
            m.character,
            m.leader_display(),
            m.term,
            m.last_log_term,
            m.last_log_index,
            m.read_only,
            self.header_latency_ns,
            render_timestamp(m.last_heartbeat_received_time_ms),
        )
    }
}

/// A raft member able to describe itself
pub trait RaftMemberReporter {
    type Report;

    fn gen_report(&self) -> Self::Report;
}

/// Snapshot of every raft group membership hosted by one node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeReport {
    owner: NodeIdentity,
    meta_member_report: MetaMemberReport,
    data_member_reports: Vec<DataMemberReport>,
}

impl NodeReport {
    pub fn new(
        owner: NodeIdentity,
        meta_member_report: MetaMemberReport,
        data_member_reports: Vec<DataMemberReport>,
    ) -> Self {
        Self {
            owner,
            meta_member_report,
            data_member_reports,
        }
    }

    /// Asks each local member for its report, keeping the data members' order
    pub fn collect<'a, M, D, I>(owner: NodeIdentity, meta_member: &M, data_members: I) -> Self
    where
        M: RaftMemberReporter<Report = MetaMemberReport> + ?Sized,
        D: RaftMemberReporter<Report = DataMemberReport> + ?Sized + 'a,
        I: IntoIterator<Item = &'a D>,
    {
        let meta_member_report = meta_member.gen_report();
        let data_member_reports = data_members
            .into_iter()
            .map(|member| member.gen_report())
            .collect();

        Self::new(owner, meta_member_report, data_member_reports)
    }

    pub fn owner(&self) -> &NodeIdentity {
        &self.owner
    }

    pub fn meta_member_report(&self) -> &MetaMemberReport {
        &self.meta_member_report
    }

    pub fn data_member_reports(&self) -> &[DataMemberReport] {
        &self.data_member_reports
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| TsdbError::serialization(e.to_string()))
    }
}

impl fmt::Display for NodeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Report of {}", self.owner)?;
        writeln!(f, "{}", self.meta_member_report)?;
        for report in &self.data_member_reports {
            writeln!(f, "{}", report)?;
        }
        Ok(())
    }
}

/// Renders epoch milliseconds as e.g. `Sun Sep 13 12:26:40 UTC 2020`
pub fn render_timestamp(millis: i64) -> String {
    match Utc.timestamp_millis_opt(millis).single() {
        Some(time) => time.format("%a %b %d %H:%M:%S UTC %Y").to_string(),
        None => millis.to_string(),
    }
}
