//! Rotor - Lead distribution and rotation engine
//!
//! This library provides round-robin lead distribution over per-source agent
//! pools, assignment lifecycle orchestration, and scheduled reclamation jobs
//! that recover stale, unanswered, and rejected leads.

pub mod activity;
pub mod api;
pub mod assignment;
pub mod cli;
pub mod config;
pub mod jobs;
pub mod logging;
pub mod metrics;
pub mod notify;
pub mod pool;
pub mod rotation;
pub mod scheduler;
pub mod settings;
pub mod store;
