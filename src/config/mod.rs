//! Configuration module for the rotation engine
//!
//! Provides layered configuration loading from files, environment variables, and defaults.
//!
//! # Configuration Precedence
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`ROTOR_*`)
//! 3. Configuration file (TOML)
//! 4. Default values (lowest priority)
//!
//! # Example
//!
//! ```rust
//! use rotor::config::RotorConfig;
//!
//! // Load defaults
//! let config = RotorConfig::default();
//! assert_eq!(config.server.port, 8600);
//!
//! // Parse from TOML
//! let toml = r#"
//! [rotation]
//! batch_size = 25
//! "#;
//! let config: RotorConfig = toml::from_str(toml).unwrap();
//! assert_eq!(config.rotation.batch_size, 25);
//! ```

pub mod error;
pub mod jobs;
pub mod logging;
pub mod rotation;
pub mod server;

pub use error::ConfigError;
pub use jobs::{JobSchedule, JobsConfig};
pub use logging::{LogFormat, LoggingConfig};
pub use rotation::{OfficeHoursConfig, RotationConfig};
pub use server::ServerConfig;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// A seeded agent definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSeed {
    pub id: String,
    pub name: String,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default = "default_true")]
    pub available: bool,
    #[serde(default)]
    pub excluded: bool,
}

/// A lead source and the agents in its round-robin pool, in ring order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSeed {
    pub id: String,
    #[serde(default)]
    pub agents: Vec<String>,
}

fn default_true() -> bool {
    true
}

/// Unified configuration for the rotation engine.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RotorConfig {
    /// Admin HTTP server
    pub server: ServerConfig,
    /// Rotation thresholds and batch limits
    pub rotation: RotationConfig,
    /// Per-job schedules
    pub jobs: JobsConfig,
    /// Office-hours gate for rotation jobs
    pub office_hours: OfficeHoursConfig,
    /// Feature-enable overrides consulted through the settings gate
    pub settings: HashMap<String, String>,
    /// Seeded agents
    pub agents: Vec<AgentSeed>,
    /// Seeded sources and their pools
    pub sources: Vec<SourceSeed>,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl RotorConfig {
    /// Load configuration from a TOML file
    ///
    /// If path is None, returns default configuration.
    /// If path doesn't exist, returns NotFound error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.to_path_buf()));
                }
                let content = std::fs::read_to_string(p)?;
                let config: Self =
                    toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
                config.validate()?;
                Ok(config)
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supports ROTOR_* environment variables for common settings.
    /// Invalid values are silently ignored (defaults are kept).
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(port) = std::env::var("ROTOR_PORT") {
            if let Ok(p) = port.parse() {
                self.server.port = p;
            }
        }
        if let Ok(host) = std::env::var("ROTOR_HOST") {
            self.server.host = host;
        }
        if let Ok(level) = std::env::var("ROTOR_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("ROTOR_LOG_FORMAT") {
            if let Ok(f) = format.parse() {
                self.logging.format = f;
            }
        }
        if let Ok(batch) = std::env::var("ROTOR_BATCH_SIZE") {
            if let Ok(b) = batch.parse() {
                self.rotation.batch_size = b;
            }
        }
        if let Ok(fallback) = std::env::var("ROTOR_FALLBACK_AGENT") {
            self.rotation.fallback_agent_id = Some(fallback);
        }
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.rotation.batch_size == 0 {
            return Err(ConfigError::Validation {
                field: "rotation.batch_size".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.office_hours.start_hour > 23 || self.office_hours.end_hour > 23 {
            return Err(ConfigError::Validation {
                field: "office_hours".to_string(),
                message: "hours must be 0-23".to_string(),
            });
        }
        let known: Vec<&str> = self.agents.iter().map(|a| a.id.as_str()).collect();
        for source in &self.sources {
            for agent in &source.agents {
                if !known.contains(&agent.as_str()) {
                    return Err(ConfigError::Validation {
                        field: format!("sources.{}", source.id),
                        message: format!("unknown agent '{}'", agent),
                    });
                }
            }
        }
        Ok(())
    }

    /// Render the default configuration as documented TOML, for `config init`.
    pub fn default_toml() -> String {
        let defaults = Self {
            agents: vec![AgentSeed {
                id: "agent-1".to_string(),
                name: "First Agent".to_string(),
                active: true,
                available: true,
                excluded: false,
            }],
            sources: vec![SourceSeed {
                id: "portal".to_string(),
                agents: vec!["agent-1".to_string()],
            }],
            ..Self::default()
        };
        toml::to_string_pretty(&defaults).expect("default config serializes")
    }
}
