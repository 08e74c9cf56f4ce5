//! Data structures for the JSON stats API.

use serde::Serialize;

/// JSON response for GET /v1/stats.
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Engine uptime in seconds since startup
    pub uptime_seconds: u64,
    /// Aggregate lead counts
    pub leads: LeadStats,
    /// Aggregate agent counts
    pub agents: AgentStats,
    /// Per-source rotation pool breakdown
    pub pools: Vec<PoolStats>,
}

/// Aggregate lead statistics.
#[derive(Debug, Clone, Serialize)]
pub struct LeadStats {
    /// Total leads tracked
    pub total: usize,
    /// Leads still in the fresh window
    pub fresh: usize,
    /// Leads with no current owner
    pub unassigned: usize,
}

/// Aggregate agent statistics.
#[derive(Debug, Clone, Serialize)]
pub struct AgentStats {
    /// Total registered agents
    pub total: usize,
    /// Agents currently eligible to receive leads
    pub eligible: usize,
}

/// Per-source rotation pool statistics.
#[derive(Debug, Clone, Serialize)]
pub struct PoolStats {
    /// Lead source this pool serves
    pub source_id: String,
    /// Ring size
    pub members: usize,
    /// Ring members currently eligible
    pub eligible: usize,
    /// Agent holding the next-in-rotation flag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_in_rotation: Option<String>,
}
