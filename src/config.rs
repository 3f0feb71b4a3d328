//! Configuration for kvpipe
//!
//! Centralized configuration with sensible defaults.

use std::time::Duration;

use crate::protocol::{DEFAULT_PORT, DEFAULT_TIMEOUT_MS};

/// Connection configuration
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Target Address
    // -------------------------------------------------------------------------
    /// Server hostname or IP address
    pub host: String,

    /// Server TCP port
    pub port: u16,

    // -------------------------------------------------------------------------
    // Timeouts
    // -------------------------------------------------------------------------
    /// Deadline applied to connect and to blocking reads
    pub timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the server hostname or IP address
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Set the server TCP port
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the connect/read timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
