// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Tether framework runner
//!
//! Subscribes to the master and launches the tasks from a JSON file.
//!
//! Usage:
//!
//! ```text
//! tether-framework --tasks <path> [--master <url>] [--name <name>] [--teardown]
//! ```

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use tether_sdk::logging::{self, LogContext};
use tether_sdk::{
    EventController, FrameworkConfig, Scheduler, SchedulerApi, TaskManager, parse_tasks,
};

fn print_usage() {
    eprintln!(
        r#"Usage: tether-framework [OPTIONS]

Register a framework with the master and launch tasks from a JSON file.

OPTIONS:
    --tasks <path>       JSON array of task definitions (required)
    --master <url>       Master base URL (overrides TETHER_MASTER_URL)
    --name <name>        Framework name (overrides TETHER_FRAMEWORK_NAME)
    --teardown           Tear the framework down on exit
    --help               Show this help message

ENVIRONMENT:
    TETHER_*             Framework settings, see the tether-sdk docs
    RUST_LOG             Log filter (default: info)
"#
    );
}

struct Args {
    tasks_path: PathBuf,
    master_url: Option<String>,
    name: Option<String>,
    teardown: bool,
}

fn parse_args() -> Result<Args, String> {
    let args: Vec<String> = std::env::args().collect();

    let mut tasks_path: Option<PathBuf> = None;
    let mut master_url: Option<String> = None;
    let mut name: Option<String> = None;
    let mut teardown = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            "--tasks" => {
                i += 1;
                tasks_path = Some(PathBuf::from(
                    args.get(i).ok_or("--tasks requires a path")?,
                ));
            }
            "--master" => {
                i += 1;
                master_url = Some(args.get(i).ok_or("--master requires a URL")?.clone());
            }
            "--name" => {
                i += 1;
                name = Some(args.get(i).ok_or("--name requires a value")?.clone());
            }
            "--teardown" => {
                teardown = true;
            }
            arg => {
                return Err(format!("Unknown argument: {}", arg));
            }
        }
        i += 1;
    }

    let tasks_path = tasks_path.ok_or("--tasks is required")?;

    Ok(Args {
        tasks_path,
        master_url,
        name,
        teardown,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (from crate directory or parent directories)
    dotenvy::dotenv().ok();

    logging::init(LogContext::from_env())?;

    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {}\n", e);
            print_usage();
            std::process::exit(2);
        }
    };

    let mut config = FrameworkConfig::from_env()?;
    if let Some(master_url) = args.master_url {
        config.master_url = master_url;
    }
    if let Some(name) = args.name {
        config.name = name;
    }

    info!(
        master = %config.master_url,
        framework = %config.name,
        role = %config.role,
        "Configuration loaded"
    );

    let definitions = fs::read_to_string(&args.tasks_path)
        .with_context(|| format!("failed to read {}", args.tasks_path.display()))?;
    let tasks = Arc::new(TaskManager::new());
    for task in parse_tasks(&definitions)? {
        tasks.add(task)?;
    }
    info!(tasks = tasks.total_tasks(), "Tasks queued");

    let scheduler = Arc::new(Scheduler::new(&config)?);
    // Set TETHER_FRAMEWORK_ID to rejoin as an existing framework
    let mut controller = EventController::new(scheduler.clone(), tasks);

    let cancel = controller.cancellation_token();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for ctrl-c");
            return;
        }
        info!("Shutdown requested");
        cancel.cancel();
    });

    controller.run().await;

    if args.teardown {
        if let Err(e) = scheduler.teardown().await {
            error!(error = %e, "Teardown failed");
        }
    }

    info!("Framework stopped");
    Ok(())
}
