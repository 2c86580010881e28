// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! [`SchedulerApi`] over the master's HTTP endpoint.

use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use tether_protocol::mesos::{
    AgentId, Call, ExecutorId, Filters, FrameworkId, FrameworkInfo, OfferId, Request, TaskId,
    offer,
};
use tether_protocol::{EventStreamReader, MasterClient, RecordDecoder, into_event_reader};
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument, warn};

use super::SchedulerApi;
use crate::calls;
use crate::config::FrameworkConfig;
use crate::error::Result;
use crate::events::SchedulerEvent;

/// Issues scheduler calls for one framework.
///
/// Owns the master client and the framework description; the framework id
/// inside the description is filled in once the master assigns one.
pub struct Scheduler {
    client: MasterClient,
    framework_info: RwLock<FrameworkInfo>,
    reconnect_backoff: Duration,
    reconnect_backoff_max: Option<Duration>,
    event_buffer: usize,
}

impl Scheduler {
    /// Create a scheduler from framework configuration.
    pub fn new(config: &FrameworkConfig) -> Result<Self> {
        let client = MasterClient::new(config.client_config())?;
        Ok(Self::with_client(client, config.framework_info())
            .with_reconnect_backoff(config.reconnect_backoff(), config.reconnect_backoff_max())
            .with_event_buffer(config.event_buffer))
    }

    /// Create a scheduler around an existing client.
    pub fn with_client(client: MasterClient, framework_info: FrameworkInfo) -> Self {
        Self {
            client,
            framework_info: RwLock::new(framework_info),
            reconnect_backoff: Duration::from_secs(2),
            reconnect_backoff_max: None,
            event_buffer: 256,
        }
    }

    /// Set the subscribe retry delay. With `max` set the delay doubles per
    /// failed attempt up to `max`.
    pub fn with_reconnect_backoff(mut self, backoff: Duration, max: Option<Duration>) -> Self {
        self.reconnect_backoff = backoff;
        self.reconnect_backoff_max = max;
        self
    }

    pub fn with_event_buffer(mut self, capacity: usize) -> Self {
        self.event_buffer = capacity.max(1);
        self
    }

    pub fn client(&self) -> &MasterClient {
        &self.client
    }

    /// Snapshot of the framework description sent on subscribe.
    pub fn framework_info(&self) -> FrameworkInfo {
        self.framework_info
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn next_backoff(&self, current: Duration) -> Duration {
        match self.reconnect_backoff_max {
            Some(max) => current.saturating_mul(2).min(max),
            None => current,
        }
    }

    async fn send(&self, call: Call) -> Result<()> {
        let kind = call.kind();
        match self.client.request(&call).await {
            Ok(_) => Ok(()),
            Err(e) => {
                error!(call_type = ?kind, error = %e, "Call to master failed");
                Err(e.into())
            }
        }
    }
}

#[async_trait]
impl SchedulerApi for Scheduler {
    #[instrument(skip(self), fields(url = %self.client.url()))]
    async fn subscribe(&self) -> mpsc::Receiver<SchedulerEvent> {
        let mut delay = self.reconnect_backoff;
        loop {
            let call = calls::build_subscribe(&self.framework_info());
            match self.client.subscribe(&call).await {
                Ok(response) => {
                    let (tx, rx) = mpsc::channel(self.event_buffer);
                    tokio::spawn(forward_events(into_event_reader(response), tx));
                    return rx;
                }
                Err(e) => {
                    error!(
                        error = %e,
                        retry_in_ms = delay.as_millis() as u64,
                        "Subscribe failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    delay = self.next_backoff(delay);
                }
            }
        }
    }

    #[instrument(skip(self))]
    async fn teardown(&self) -> Result<()> {
        let result = self
            .send(calls::build_teardown(self.framework_id()))
            .await;
        self.client.clear_stream_id();
        info!("Framework torn down");
        result
    }

    #[instrument(skip(self, operations, filters), fields(offers = offer_ids.len(), operations = operations.len()))]
    async fn accept(
        &self,
        offer_ids: Vec<OfferId>,
        operations: Vec<offer::Operation>,
        filters: Option<Filters>,
    ) -> Result<()> {
        self.send(calls::build_accept(
            self.framework_id(),
            offer_ids,
            operations,
            filters,
        ))
        .await
    }

    #[instrument(skip(self, filters), fields(offers = offer_ids.len()))]
    async fn decline(&self, offer_ids: Vec<OfferId>, filters: Option<Filters>) -> Result<()> {
        self.send(calls::build_decline(self.framework_id(), offer_ids, filters))
            .await
    }

    async fn revive(&self) -> Result<()> {
        debug!("Reviving offers");
        self.send(calls::build_revive(self.framework_id())).await
    }

    async fn suppress(&self) -> Result<()> {
        debug!("Suppressing offers");
        self.send(calls::build_suppress(self.framework_id())).await
    }

    #[instrument(skip(self), fields(task_id = %task_id))]
    async fn kill(&self, task_id: TaskId, agent_id: Option<AgentId>) -> Result<()> {
        self.send(calls::build_kill(self.framework_id(), task_id, agent_id))
            .await
    }

    #[instrument(skip(self), fields(executor_id = %executor_id, agent_id = %agent_id))]
    async fn shutdown(&self, executor_id: ExecutorId, agent_id: AgentId) -> Result<()> {
        self.send(calls::build_shutdown(
            self.framework_id(),
            executor_id,
            agent_id,
        ))
        .await
    }

    #[instrument(skip(self, uuid), fields(task_id = %task_id, agent_id = %agent_id))]
    async fn acknowledge(&self, agent_id: AgentId, task_id: TaskId, uuid: Vec<u8>) -> Result<()> {
        self.send(calls::build_acknowledge(
            self.framework_id(),
            agent_id,
            task_id,
            uuid,
        ))
        .await
    }

    #[instrument(skip(self, tasks), fields(tasks = tasks.len()))]
    async fn reconcile(&self, tasks: Vec<(TaskId, Option<AgentId>)>) -> Result<()> {
        self.send(calls::build_reconcile(self.framework_id(), tasks))
            .await
    }

    #[instrument(skip(self, data), fields(agent_id = %agent_id, size = data.len()))]
    async fn message(
        &self,
        agent_id: AgentId,
        executor_id: ExecutorId,
        data: Vec<u8>,
    ) -> Result<()> {
        self.send(calls::build_message(
            self.framework_id(),
            agent_id,
            executor_id,
            data,
        ))
        .await
    }

    async fn request(&self, requests: Vec<Request>) -> Result<()> {
        self.send(calls::build_request(self.framework_id(), requests))
            .await
    }

    fn framework_id(&self) -> Option<FrameworkId> {
        self.framework_info
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .id
            .clone()
    }

    fn set_framework_id(&self, id: FrameworkId) {
        info!(framework_id = %id, "Framework id assigned");
        self.framework_info
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .id = Some(id);
    }
}

/// Decode the subscription body and forward events until it ends.
async fn forward_events(
    mut decoder: RecordDecoder<EventStreamReader>,
    tx: mpsc::Sender<SchedulerEvent>,
) {
    loop {
        match decoder.next_event().await {
            Ok(Some(event)) => {
                if tx.send(SchedulerEvent::from(event)).await.is_err() {
                    debug!("Event receiver dropped, closing subscription");
                    break;
                }
            }
            Ok(None) => {
                warn!(records = decoder.records(), "Subscription stream closed by master");
                break;
            }
            Err(e) => {
                error!(records = decoder.records(), error = %e, "Subscription stream failed");
                break;
            }
        }
    }
}
