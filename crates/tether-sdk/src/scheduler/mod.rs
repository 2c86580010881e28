// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Outgoing calls to the master.
//!
//! The controller only talks to the master through [`SchedulerApi`], so a
//! recording double can stand in for [`Scheduler`] in tests.

mod master;

pub use master::Scheduler;

use async_trait::async_trait;
use tether_protocol::mesos::{
    AgentId, ExecutorId, Filters, FrameworkId, OfferId, Request, TaskId, offer,
};
use tokio::sync::mpsc;

use crate::error::Result;
use crate::events::SchedulerEvent;

/// Scheduler API calls, all tagged with the current framework id.
#[async_trait]
pub trait SchedulerApi: Send + Sync {
    /// Open a subscription and return the channel its events arrive on.
    ///
    /// Retries until the master accepts. The channel closes when the
    /// subscription ends for any reason.
    async fn subscribe(&self) -> mpsc::Receiver<SchedulerEvent>;

    /// End the framework; the current subscription is unusable afterwards.
    async fn teardown(&self) -> Result<()>;

    async fn accept(
        &self,
        offer_ids: Vec<OfferId>,
        operations: Vec<offer::Operation>,
        filters: Option<Filters>,
    ) -> Result<()>;

    async fn decline(&self, offer_ids: Vec<OfferId>, filters: Option<Filters>) -> Result<()>;

    /// Ask for offers again after a suppress.
    async fn revive(&self) -> Result<()>;

    /// Stop receiving offers.
    async fn suppress(&self) -> Result<()>;

    async fn kill(&self, task_id: TaskId, agent_id: Option<AgentId>) -> Result<()>;

    async fn shutdown(&self, executor_id: ExecutorId, agent_id: AgentId) -> Result<()>;

    /// Acknowledge a status update carrying `uuid`.
    async fn acknowledge(&self, agent_id: AgentId, task_id: TaskId, uuid: Vec<u8>) -> Result<()>;

    /// Ask for the latest state of the given tasks, or of all tasks when empty.
    async fn reconcile(&self, tasks: Vec<(TaskId, Option<AgentId>)>) -> Result<()>;

    async fn message(&self, agent_id: AgentId, executor_id: ExecutorId, data: Vec<u8>)
    -> Result<()>;

    async fn request(&self, requests: Vec<Request>) -> Result<()>;

    /// Framework id assigned by the master, if subscribed at least once.
    fn framework_id(&self) -> Option<FrameworkId>;

    fn set_framework_id(&self, id: FrameworkId);
}
