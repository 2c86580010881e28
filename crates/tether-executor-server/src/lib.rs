// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Tether executor server
//!
//! Serves the executor binary to agents at `GET /executor` so task
//! definitions can fetch it by URI. TLS is enabled when both a certificate
//! and a key are configured; TLS responses carry an HSTS header.
//!
//! ```ignore
//! use tether_executor_server::{ExecutorServer, ExecutorServerConfig};
//!
//! let config = ExecutorServerConfig::from_env()?;
//! let server = ExecutorServer::bind(config).await?;
//! server.run(async { tokio::signal::ctrl_c().await.ok(); }).await?;
//! ```

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

pub mod config;
pub mod error;
pub mod routes;
pub mod tls;

pub use config::{ConfigError, ExecutorServerConfig};
pub use error::ServerError;
pub use routes::{EXECUTOR_ROUTE, HSTS_VALUE, router};
pub use tls::TlsListener;

/// A bound executor server, ready to run.
pub struct ExecutorServer {
    listener: TcpListener,
    tls: Option<Arc<rustls::ServerConfig>>,
    config: ExecutorServerConfig,
}

impl ExecutorServer {
    /// Bind the listen address and load TLS material if configured.
    pub async fn bind(config: ExecutorServerConfig) -> Result<Self, ServerError> {
        let tls = match config.tls_paths() {
            Some((cert, key)) => Some(Arc::new(tls::load_server_config(cert, key)?)),
            None => None,
        };
        let listener = TcpListener::bind(config.bind_addr).await?;

        info!(
            addr = %listener.local_addr()?,
            executor = %config.executor_path.display(),
            tls = tls.is_some(),
            "Executor server bound"
        );

        Ok(Self {
            listener,
            tls,
            config,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    pub fn config(&self) -> &ExecutorServerConfig {
        &self.config
    }

    /// Serve requests until `shutdown` completes.
    pub async fn run<F>(self, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = router(self.config.executor_path.clone(), self.tls.is_some());

        match self.tls {
            Some(tls) => {
                let listener = TlsListener::new(self.listener, tls);
                axum::serve(listener, app)
                    .with_graceful_shutdown(shutdown)
                    .await?;
            }
            None => {
                axum::serve(self.listener, app)
                    .with_graceful_shutdown(shutdown)
                    .await?;
            }
        }

        info!("Executor server stopped");
        Ok(())
    }
}
