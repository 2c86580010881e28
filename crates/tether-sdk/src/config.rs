// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Framework configuration.

use std::env;
use std::time::Duration;

use tether_protocol::MasterClientConfig;
use tether_protocol::mesos::{FrameworkId, FrameworkInfo, framework_info};

use crate::error::{Result, SdkError};

const DEFAULT_MASTER_URL: &str = "http://127.0.0.1:5050";

/// Everything needed to register a framework with the master.
#[derive(Debug, Clone)]
pub struct FrameworkConfig {
    /// Master base URL (default: "http://127.0.0.1:5050")
    pub master_url: String,
    /// Framework name (default: "tether")
    pub name: String,
    /// User tasks run as (default: "root")
    pub user: String,
    /// Role offers are allocated under (default: "*")
    pub role: String,
    pub principal: Option<String>,
    /// Framework id to re-subscribe with after a failover
    pub framework_id: Option<String>,
    /// How long the master keeps tasks alive after the framework disconnects (default: 0)
    pub failover_timeout_secs: f64,
    /// Enable agent checkpointing (default: false)
    pub checkpoint: bool,
    pub webui_url: Option<String>,
    /// Delay between subscribe attempts in milliseconds (default: 2_000)
    pub reconnect_backoff_ms: u64,
    /// Upper bound for the subscribe delay when it doubles per failure.
    /// 0 keeps the delay fixed (default: 0)
    pub reconnect_backoff_max_ms: u64,
    /// Connection timeout in milliseconds (default: 10_000)
    pub connect_timeout_ms: u64,
    /// Timeout for unary calls in milliseconds, 0 for none (default: 0)
    pub request_timeout_ms: u64,
    /// Capacity of the events channel (default: 256)
    pub event_buffer: usize,
}

impl FrameworkConfig {
    /// Load configuration from environment variables.
    ///
    /// # Optional Environment Variables
    /// - `TETHER_MASTER_URL` - Master base URL (default: "http://127.0.0.1:5050")
    /// - `TETHER_FRAMEWORK_NAME` - Framework name (default: "tether")
    /// - `TETHER_FRAMEWORK_USER` - User (default: "root")
    /// - `TETHER_FRAMEWORK_ROLE` - Role (default: "*")
    /// - `TETHER_FRAMEWORK_PRINCIPAL` - Principal (default: unset)
    /// - `TETHER_FRAMEWORK_ID` - Framework id to re-subscribe with (default: unset)
    /// - `TETHER_FAILOVER_TIMEOUT_SECS` - Failover timeout (default: 0)
    /// - `TETHER_CHECKPOINT` - Agent checkpointing (default: false)
    /// - `TETHER_WEBUI_URL` - Web UI URL (default: unset)
    /// - `TETHER_RECONNECT_BACKOFF_MS` - Subscribe retry delay (default: 2000)
    /// - `TETHER_RECONNECT_BACKOFF_MAX_MS` - Cap for a doubling retry delay (default: 0 = fixed)
    /// - `TETHER_CONNECT_TIMEOUT_MS` - Connection timeout (default: 10000)
    /// - `TETHER_REQUEST_TIMEOUT_MS` - Unary call timeout (default: 0 = none)
    /// - `TETHER_EVENT_BUFFER` - Events channel capacity (default: 256)
    pub fn from_env() -> Result<Self> {
        let master_url =
            env::var("TETHER_MASTER_URL").unwrap_or_else(|_| DEFAULT_MASTER_URL.to_string());
        if !(master_url.starts_with("http://") || master_url.starts_with("https://")) {
            return Err(SdkError::Config(format!(
                "invalid TETHER_MASTER_URL: {} (expected http:// or https://)",
                master_url
            )));
        }

        let failover_timeout_secs = match env::var("TETHER_FAILOVER_TIMEOUT_SECS") {
            Ok(v) => v.parse().map_err(|e| {
                SdkError::Config(format!("invalid TETHER_FAILOVER_TIMEOUT_SECS: {}", e))
            })?,
            Err(_) => 0.0,
        };

        let checkpoint = env::var("TETHER_CHECKPOINT")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        let reconnect_backoff_ms = env::var("TETHER_RECONNECT_BACKOFF_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(2_000);

        let reconnect_backoff_max_ms = env::var("TETHER_RECONNECT_BACKOFF_MAX_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);

        let connect_timeout_ms = env::var("TETHER_CONNECT_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(10_000);

        let request_timeout_ms = env::var("TETHER_REQUEST_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);

        let event_buffer = env::var("TETHER_EVENT_BUFFER")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|n| *n > 0)
            .unwrap_or(256);

        Ok(Self {
            master_url,
            name: env::var("TETHER_FRAMEWORK_NAME").unwrap_or_else(|_| "tether".to_string()),
            user: env::var("TETHER_FRAMEWORK_USER").unwrap_or_else(|_| "root".to_string()),
            role: env::var("TETHER_FRAMEWORK_ROLE").unwrap_or_else(|_| "*".to_string()),
            principal: env::var("TETHER_FRAMEWORK_PRINCIPAL").ok(),
            framework_id: env::var("TETHER_FRAMEWORK_ID").ok().filter(|v| !v.is_empty()),
            failover_timeout_secs,
            checkpoint,
            webui_url: env::var("TETHER_WEBUI_URL").ok(),
            reconnect_backoff_ms,
            reconnect_backoff_max_ms,
            connect_timeout_ms,
            request_timeout_ms,
            event_buffer,
        })
    }

    /// Create a configuration for the given master and framework name.
    pub fn new(master_url: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            master_url: master_url.into(),
            name: name.into(),
            user: "root".to_string(),
            role: "*".to_string(),
            principal: None,
            framework_id: None,
            failover_timeout_secs: 0.0,
            checkpoint: false,
            webui_url: None,
            reconnect_backoff_ms: 2_000,
            reconnect_backoff_max_ms: 0,
            connect_timeout_ms: 10_000,
            request_timeout_ms: 0,
            event_buffer: 256,
        }
    }

    /// Create a configuration for a master on localhost.
    pub fn localhost(name: impl Into<String>) -> Self {
        Self::new(DEFAULT_MASTER_URL, name)
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = role.into();
        self
    }

    pub fn with_principal(mut self, principal: impl Into<String>) -> Self {
        self.principal = Some(principal.into());
        self
    }

    /// Re-subscribe as an existing framework.
    pub fn with_framework_id(mut self, id: impl Into<String>) -> Self {
        self.framework_id = Some(id.into());
        self
    }

    pub fn with_failover_timeout_secs(mut self, secs: f64) -> Self {
        self.failover_timeout_secs = secs;
        self
    }

    pub fn with_checkpoint(mut self, checkpoint: bool) -> Self {
        self.checkpoint = checkpoint;
        self
    }

    /// Set the subscribe retry delay.
    pub fn with_reconnect_backoff_ms(mut self, backoff_ms: u64) -> Self {
        self.reconnect_backoff_ms = backoff_ms;
        self
    }

    /// Double the subscribe retry delay per failure, up to `max_ms`.
    pub fn with_reconnect_backoff_max_ms(mut self, max_ms: u64) -> Self {
        self.reconnect_backoff_max_ms = max_ms;
        self
    }

    pub fn with_request_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.request_timeout_ms = timeout_ms;
        self
    }

    pub fn with_event_buffer(mut self, capacity: usize) -> Self {
        self.event_buffer = capacity.max(1);
        self
    }

    pub fn reconnect_backoff(&self) -> Duration {
        Duration::from_millis(self.reconnect_backoff_ms)
    }

    /// Cap for the doubling subscribe delay, `None` when the delay is fixed.
    pub fn reconnect_backoff_max(&self) -> Option<Duration> {
        (self.reconnect_backoff_max_ms > 0)
            .then(|| Duration::from_millis(self.reconnect_backoff_max_ms))
    }

    /// Master client settings derived from this configuration.
    pub fn client_config(&self) -> MasterClientConfig {
        MasterClientConfig {
            endpoint: self.master_url.clone(),
            connect_timeout_ms: self.connect_timeout_ms,
            request_timeout_ms: self.request_timeout_ms,
            ..MasterClientConfig::default()
        }
    }

    /// Framework description sent on subscribe.
    pub fn framework_info(&self) -> FrameworkInfo {
        FrameworkInfo {
            user: self.user.clone(),
            name: self.name.clone(),
            id: self.framework_id.clone().map(FrameworkId::new),
            failover_timeout: Some(self.failover_timeout_secs),
            checkpoint: Some(self.checkpoint),
            role: Some(self.role.clone()),
            principal: self.principal.clone(),
            webui_url: self.webui_url.clone(),
            capabilities: vec![framework_info::Capability::of(
                framework_info::capability::Type::TaskKillingState,
            )],
            ..Default::default()
        }
    }
}
