//! Rotation strategies for picking the receiving agent.
//!
//! Ring and Random encode different fairness intents (global round-robin
//! fairness vs. breaking correlated no-answer patterns) and are kept as
//! distinct, named strategies rather than being merged.

use std::str::FromStr;

/// Strategy a reclamation flow uses to pick the receiving agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RotationStrategy {
    /// Walk the source's ring; advance the next-assign flag.
    #[default]
    Ring,

    /// Uniformly random eligible agent different from the current owner.
    Random,

    /// Route to the configured fallback/admin agent, bypassing the pool.
    Fallback,
}

impl FromStr for RotationStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ring" => Ok(RotationStrategy::Ring),
            "random" => Ok(RotationStrategy::Random),
            "fallback" => Ok(RotationStrategy::Fallback),
            _ => Err(format!("Unknown rotation strategy: {}", s)),
        }
    }
}

impl std::fmt::Display for RotationStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RotationStrategy::Ring => write!(f, "ring"),
            RotationStrategy::Random => write!(f, "random"),
            RotationStrategy::Fallback => write!(f, "fallback"),
        }
    }
}
