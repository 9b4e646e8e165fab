//! Configuration Module
//!
//! This module defines all configuration structures for the tracker.
//! Configuration is loaded from TOML files and parsed using serde.

use serde::Deserialize;
use std::fs;

/// Main configuration structure
///
/// Contains all configuration sections for the tracker.
/// Loaded from a TOML file (e.g., config/default.toml).
///
/// # Example TOML
/// ```toml
/// [api]
/// host = "127.0.0.1"
/// port = 8080
///
/// [database]
/// url = "data/croptrace.db"
///
/// [creation]
/// max_attempts = 3
/// counter_name = "batchId"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub creation: CreationConfig,
}

/// API server configuration
///
/// # Fields
/// - `host`: IP address to bind to (e.g., "127.0.0.1" or "0.0.0.0")
/// - `port`: TCP port to listen on (e.g., 8080)
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
}

/// Database configuration
///
/// # Fields
/// - `url`: Path to the SQLite database file (created if missing)
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

/// Batch creation configuration
///
/// Controls the identifier allocation pipeline.
///
/// # Fields
/// - `max_attempts`: Upper bound on creation attempts when the formatted
///   identifier collides with an existing batch
/// - `counter_name`: Logical name of the durable counter identifiers are
///   allocated from
#[derive(Debug, Clone, Deserialize)]
pub struct CreationConfig {
    pub max_attempts: u32,
    pub counter_name: String,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    /// * `path` - Path to the TOML configuration file
    ///
    /// # Returns
    /// * `Ok(Config)` if the file was successfully loaded and parsed
    /// * `Err` if the file couldn't be read or the TOML is invalid
    pub fn load(path: &str) -> anyhow::Result<Self> {
        // Read the file contents as a string
        let content = fs::read_to_string(path)?;

        // Parse the TOML into our Config structure
        let config: Config = toml::from_str(&content)?;

        Ok(config)
    }
}
