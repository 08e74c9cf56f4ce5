//! Entity types shared across the engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Lifecycle status of a lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    New,
    Contacted,
    NoAnswer,
    NotInterested,
    Qualified,
    Closed,
}

impl LeadStatus {
    /// Terminal statuses are never picked up by reclamation jobs.
    pub fn is_terminal(&self) -> bool {
        matches!(self, LeadStatus::Qualified | LeadStatus::Closed)
    }
}

impl FromStr for LeadStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "new" => Ok(LeadStatus::New),
            "contacted" => Ok(LeadStatus::Contacted),
            "no_answer" => Ok(LeadStatus::NoAnswer),
            "not_interested" => Ok(LeadStatus::NotInterested),
            "qualified" => Ok(LeadStatus::Qualified),
            "closed" => Ok(LeadStatus::Closed),
            _ => Err(format!("Unknown lead status: {}", s)),
        }
    }
}

impl std::fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LeadStatus::New => write!(f, "new"),
            LeadStatus::Contacted => write!(f, "contacted"),
            LeadStatus::NoAnswer => write!(f, "no_answer"),
            LeadStatus::NotInterested => write!(f, "not_interested"),
            LeadStatus::Qualified => write!(f, "qualified"),
            LeadStatus::Closed => write!(f, "closed"),
        }
    }
}

/// A sales prospect. Owned by at most one primary agent at a time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    /// Source the lead came in through (portal, campaign, referral partner).
    pub source_id: String,
    pub status: LeadStatus,
    /// Current primary owner, if any.
    pub agent_id: Option<String>,
    /// Times this lead has been (re)assigned. Equals the number of
    /// assignment-history rows for the lead.
    pub assignment_count: u32,
    /// Times the no-answer recycler has rotated this lead.
    pub no_answer_count: u32,
    /// True until the lead has been reassigned enough times to lose
    /// priority treatment.
    pub is_fresh: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Lead {
    /// Create a new intake lead with fresh-lead priority.
    pub fn new(id: String, name: String, source_id: String, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name,
            phone: None,
            source_id,
            status: LeadStatus::New,
            agent_id: None,
            assignment_count: 0,
            no_answer_count: 0,
            is_fresh: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A sales agent. Eligibility for rotation requires active, available,
/// and not excluded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    pub name: String,
    pub active: bool,
    pub available: bool,
    pub excluded: bool,
}

impl Agent {
    pub fn new(id: String, name: String) -> Self {
        Self {
            id,
            name,
            active: true,
            available: true,
            excluded: false,
        }
    }

    pub fn is_eligible(&self) -> bool {
        self.active && self.available && !self.excluded
    }
}

/// Acceptance state of an assignment edge.
///
/// `Pending` transitions to `Accepted` or `Rejected`; both are terminal for
/// the edge, which can only be closed afterwards by a later reassignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcceptanceState {
    Pending,
    Accepted,
    Rejected,
}

/// Why an assignment edge was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    Reassigned,
    Rejected,
    NoActivity,
    NoAnswerRecycled,
    NotInterestedRecycled,
}

impl std::fmt::Display for CloseReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CloseReason::Reassigned => write!(f, "reassigned"),
            CloseReason::Rejected => write!(f, "rejected"),
            CloseReason::NoActivity => write!(f, "no_activity"),
            CloseReason::NoAnswerRecycled => write!(f, "no_answer_recycled"),
            CloseReason::NotInterestedRecycled => write!(f, "not_interested_recycled"),
        }
    }
}

/// How an assignment came to be, recorded in history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentReason {
    Manual,
    RoundRobin,
    MultiAgent,
    Reassignment,
    NoActivityRotation,
    NoAnswerRecycle,
    NotInterestedRecycle,
    FallbackEscalation,
}

impl std::fmt::Display for AssignmentReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssignmentReason::Manual => write!(f, "manual"),
            AssignmentReason::RoundRobin => write!(f, "round_robin"),
            AssignmentReason::MultiAgent => write!(f, "multi_agent"),
            AssignmentReason::Reassignment => write!(f, "reassignment"),
            AssignmentReason::NoActivityRotation => write!(f, "no_activity_rotation"),
            AssignmentReason::NoAnswerRecycle => write!(f, "no_answer_recycle"),
            AssignmentReason::NotInterestedRecycle => write!(f, "not_interested_recycle"),
            AssignmentReason::FallbackEscalation => write!(f, "fallback_escalation"),
        }
    }
}

/// A time-boxed ownership edge between a lead and an agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadAssignment {
    pub id: String,
    pub lead_id: String,
    pub agent_id: String,
    pub assigned_at: DateTime<Utc>,
    pub acceptance: AcceptanceState,
    pub last_activity_at: Option<DateTime<Utc>>,
    /// Set when this edge was created by no-activity rotation; prevents the
    /// same job from rotating the lead again before any new activity lands.
    pub loop_guard: bool,
    pub closed_at: Option<DateTime<Utc>>,
    pub close_reason: Option<CloseReason>,
}

impl LeadAssignment {
    pub fn is_open(&self) -> bool {
        self.closed_at.is_none()
    }
}

/// Immutable audit record of one ownership change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentHistoryEntry {
    pub id: String,
    pub lead_id: String,
    pub from_agent: Option<String>,
    pub to_agent: String,
    pub actor: String,
    pub reason: AssignmentReason,
    pub recorded_at: DateTime<Utc>,
}
