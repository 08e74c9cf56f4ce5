//! Configuration load and validation errors.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("invalid TOML in config: {0}")]
    Parse(String),

    /// Semantic validation failure, e.g. a pool member referencing an
    /// agent that was never seeded.
    #[error("invalid value for '{field}': {message}")]
    Validation { field: String, message: String },
}
