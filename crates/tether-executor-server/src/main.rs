// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Tether executor server - hands the executor binary to agents.

use anyhow::Result;
use tracing::{error, info, warn};

use tether_executor_server::{ExecutorServer, ExecutorServerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (from crate directory or parent directories)
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = ExecutorServerConfig::from_env().map_err(|e| {
        error!("Configuration error: {}", e);
        e
    })?;

    info!(
        addr = %config.bind_addr,
        executor = %config.executor_path.display(),
        tls = config.tls_enabled(),
        "Configuration loaded"
    );
    if !config.executor_path.is_file() {
        warn!(path = %config.executor_path.display(), "Executor binary does not exist yet");
    }

    let server = ExecutorServer::bind(config).await?;
    server
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
            info!("Shutting down...");
        })
        .await?;

    Ok(())
}
