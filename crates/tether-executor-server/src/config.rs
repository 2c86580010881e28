// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Configuration loading from environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;

const DEFAULT_PORT: u16 = 8081;

/// Executor server configuration
#[derive(Debug, Clone)]
pub struct ExecutorServerConfig {
    /// Address to listen on
    pub bind_addr: SocketAddr,
    /// Executor binary served at `GET /executor`
    pub executor_path: PathBuf,
    /// TLS certificate chain (PEM)
    pub cert_path: Option<PathBuf>,
    /// TLS private key (PEM)
    pub key_path: Option<PathBuf>,
}

impl ExecutorServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Required:
    /// - `TETHER_EXECUTOR_PATH`: path of the executor binary
    ///
    /// Optional:
    /// - `TETHER_EXECUTOR_BIND`: listen address (default: 0.0.0.0:8081)
    /// - `TETHER_EXECUTOR_CERT`, `TETHER_EXECUTOR_KEY`: PEM files; TLS is
    ///   enabled when both are set
    pub fn from_env() -> Result<Self, ConfigError> {
        let executor_path = std::env::var("TETHER_EXECUTOR_PATH")
            .map(PathBuf::from)
            .map_err(|_| ConfigError::Missing("TETHER_EXECUTOR_PATH"))?;

        let bind_addr: SocketAddr = std::env::var("TETHER_EXECUTOR_BIND")
            .ok()
            .map(|v| v.parse::<SocketAddr>())
            .transpose()
            .map_err(|_| {
                ConfigError::Invalid("TETHER_EXECUTOR_BIND", "must be a socket address")
            })?
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)));

        let cert_path = std::env::var("TETHER_EXECUTOR_CERT").ok().map(PathBuf::from);
        let key_path = std::env::var("TETHER_EXECUTOR_KEY").ok().map(PathBuf::from);

        let config = Self {
            bind_addr,
            executor_path,
            cert_path,
            key_path,
        };
        config.validate()?;
        Ok(config)
    }

    /// Plain HTTP configuration serving `executor_path` on the default address.
    pub fn new(executor_path: impl Into<PathBuf>) -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            executor_path: executor_path.into(),
            cert_path: None,
            key_path: None,
        }
    }

    pub fn with_bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    pub fn with_tls(mut self, cert_path: impl Into<PathBuf>, key_path: impl Into<PathBuf>) -> Self {
        self.cert_path = Some(cert_path.into());
        self.key_path = Some(key_path.into());
        self
    }

    /// Certificate and key paths when TLS is configured.
    pub fn tls_paths(&self) -> Option<(&PathBuf, &PathBuf)> {
        self.cert_path.as_ref().zip(self.key_path.as_ref())
    }

    pub fn tls_enabled(&self) -> bool {
        self.tls_paths().is_some()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.cert_path.is_some() != self.key_path.is_some() {
            return Err(ConfigError::Invalid(
                "TETHER_EXECUTOR_CERT",
                "TETHER_EXECUTOR_CERT and TETHER_EXECUTOR_KEY must be set together",
            ));
        }
        Ok(())
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),

    /// An environment variable has an invalid value.
    #[error("invalid value for {0}: {1}")]
    Invalid(&'static str, &'static str),
}
