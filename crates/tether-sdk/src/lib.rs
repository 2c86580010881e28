// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Tether SDK - build frameworks for a Mesos-style cluster master.
//!
//! A framework subscribes to the master, receives resource offers, matches
//! them against the tasks it wants to run and launches whatever fits. This
//! crate provides the pieces:
//!
//! - **Scheduler**: issues calls (accept, decline, kill, acknowledge, ...)
//!   tagged with the framework's identity
//! - **Event controller**: consumes the subscription, matches offers to
//!   queued tasks and tracks task status updates
//! - **Resource and task managers**: in-memory state behind offer matching
//! - **Retry engine**: retry policies for operations and failed tasks
//! - **Task definitions**: JSON task descriptions parsed into tasks
//! - **Logging**: pipe-separated log records on stdout/stderr
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use tether_sdk::{EventController, FrameworkConfig, Scheduler, TaskManager, parse_task};
//!
//! #[tokio::main]
//! async fn main() -> tether_sdk::Result<()> {
//!     let config = FrameworkConfig::from_env()?;
//!     let scheduler = Arc::new(Scheduler::new(&config)?);
//!
//!     let tasks = Arc::new(TaskManager::new());
//!     tasks.add(parse_task(r#"{"id": "t1", "name": "sleep", "cmd": "sleep 60",
//!                              "resources": {"cpus": 0.1, "mem": 32}}"#)?)?;
//!
//!     let mut controller = EventController::new(scheduler, tasks);
//!     let cancel = controller.cancellation_token();
//!     tokio::spawn(async move {
//!         tokio::signal::ctrl_c().await.ok();
//!         cancel.cancel();
//!     });
//!
//!     controller.run().await;
//!     Ok(())
//! }
//! ```
//!
//! # Offer Matching
//!
//! Each OFFERS event replaces the set of held offers. Queued tasks are then
//! visited in id order; a task takes the first offer with strictly more
//! `cpus` and `mem` than it demands, and that offer is not used again in the
//! round. All launches of a round go out in one ACCEPT. When nothing is
//! queued, the offers are declined and offers are suppressed until a task
//! needs to be relaunched.
//!
//! # Configuration
//!
//! | Variable | Required | Default | Description |
//! |----------|----------|---------|-------------|
//! | `TETHER_MASTER_URL` | No | `http://127.0.0.1:5050` | Master base URL |
//! | `TETHER_FRAMEWORK_NAME` | No | `tether` | Framework name |
//! | `TETHER_FRAMEWORK_USER` | No | `root` | User tasks run as |
//! | `TETHER_FRAMEWORK_ROLE` | No | `*` | Role |
//! | `TETHER_FRAMEWORK_PRINCIPAL` | No | - | Principal |
//! | `TETHER_FRAMEWORK_ID` | No | - | Framework id to re-subscribe with |
//! | `TETHER_FAILOVER_TIMEOUT_SECS` | No | `0` | Failover timeout |
//! | `TETHER_CHECKPOINT` | No | `false` | Agent checkpointing |
//! | `TETHER_WEBUI_URL` | No | - | Web UI URL |
//! | `TETHER_RECONNECT_BACKOFF_MS` | No | `2000` | Subscribe retry delay |
//! | `TETHER_RECONNECT_BACKOFF_MAX_MS` | No | `0` | Cap for a doubling retry delay (0 = fixed) |
//! | `TETHER_CONNECT_TIMEOUT_MS` | No | `10000` | Connection timeout |
//! | `TETHER_REQUEST_TIMEOUT_MS` | No | `0` | Unary call timeout (0 = none) |
//! | `TETHER_EVENT_BUFFER` | No | `256` | Events channel capacity |

mod calls;
mod error;
mod events;
mod types;

pub mod collections;
pub mod config;
pub mod controller;
pub mod logging;
pub mod persistence;
pub mod resources;
pub mod retry;
pub mod scheduler;
pub mod task_spec;
pub mod tasks;

// Main types
pub use config::FrameworkConfig;
pub use controller::{EventController, FRAMEWORK_ID_KEY, Flow, SessionState};
pub use error::{Result, SdkError};
pub use events::SchedulerEvent;
pub use scheduler::{Scheduler, SchedulerApi};
pub use types::{Task, TaskState};

pub use collections::{ConcurrentMap, PriorityQueue};
pub use persistence::{KeyValueStore, MemoryStore, StoreError};
pub use resources::{OfferResource, ResourceError, ResourceManager};
pub use retry::{RetryEngine, RetryPolicy};
pub use task_spec::{TaskSpec, TaskSpecError, parse_task, parse_tasks};
pub use tasks::{TaskError, TaskManager};

// Re-export the wire layer for callers building calls and payloads
pub use tether_protocol::{self as protocol, mesos};
