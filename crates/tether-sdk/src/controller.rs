// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Event dispatch loop.
//!
//! The controller owns the subscription: it subscribes, routes every event to
//! a handler in arrival order and re-subscribes when the stream ends or the
//! master reports an error. Offers are matched against queued tasks here.
//!
//! ```text
//! Init ── subscribe() ──▶ AwaitingId
//! AwaitingId ── SUBSCRIBED ──▶ Running
//! Running ── ERROR / stream end ──▶ Init
//! ```

use std::sync::Arc;

use tether_protocol::mesos::{InverseOffer, Offer, OfferId, TaskStatus, event, offer};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::events::SchedulerEvent;
use crate::persistence::{self, KeyValueStore};
use crate::resources::ResourceManager;
use crate::retry::RetryEngine;
use crate::scheduler::SchedulerApi;
use crate::tasks::TaskManager;
use crate::types::TaskState;

/// Store key the assigned framework id is written under.
pub const FRAMEWORK_ID_KEY: &str = "/tether/framework_id";

/// Where the controller is in the subscription life-cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No subscription
    Init,
    /// Subscribed, waiting for the master to confirm the framework id
    AwaitingId,
    Running,
}

/// What the loop should do after an event was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// Drop the current subscription and subscribe again
    Reconnect,
}

/// Routes subscription events to handlers.
pub struct EventController {
    scheduler: Arc<dyn SchedulerApi>,
    tasks: Arc<TaskManager>,
    resources: ResourceManager,
    retry: Arc<RetryEngine>,
    store: Option<Arc<dyn KeyValueStore>>,
    state: SessionState,
    cancel: CancellationToken,
}

impl EventController {
    pub fn new(scheduler: Arc<dyn SchedulerApi>, tasks: Arc<TaskManager>) -> Self {
        Self {
            scheduler,
            tasks,
            resources: ResourceManager::new(),
            retry: Arc::new(RetryEngine::new()),
            store: None,
            state: SessionState::Init,
            cancel: CancellationToken::new(),
        }
    }

    /// Share a retry engine with other components.
    pub fn with_retry_engine(mut self, retry: Arc<RetryEngine>) -> Self {
        self.retry = retry;
        self
    }

    /// Record the framework id in `store` whenever the master assigns one.
    pub fn with_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Token that stops [`run`](Self::run) when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn tasks(&self) -> &Arc<TaskManager> {
        &self.tasks
    }

    pub fn resources(&self) -> &ResourceManager {
        &self.resources
    }

    pub fn retry_engine(&self) -> &Arc<RetryEngine> {
        &self.retry
    }

    /// Subscribe and consume events until cancelled.
    ///
    /// A closed stream or an ERROR event starts a new subscription. Nothing is
    /// sent to the master once the token is cancelled.
    pub async fn run(&mut self) {
        info!("Event controller started");

        while !self.cancel.is_cancelled() {
            self.state = SessionState::Init;

            let mut events = tokio::select! {
                biased;

                _ = self.cancel.cancelled() => break,
                events = self.scheduler.subscribe() => events,
            };
            self.state = SessionState::AwaitingId;

            loop {
                let next = tokio::select! {
                    biased;

                    _ = self.cancel.cancelled() => break,
                    next = events.recv() => next,
                };

                match next {
                    Some(event) => {
                        if self.handle_event(event).await == Flow::Reconnect {
                            break;
                        }
                    }
                    None => {
                        warn!("Subscription ended, reconnecting");
                        break;
                    }
                }
            }
        }

        self.state = SessionState::Init;
        info!("Event controller stopped");
    }

    /// Handle one event.
    pub async fn handle_event(&mut self, event: SchedulerEvent) -> Flow {
        if self.state != SessionState::Running
            && !matches!(
                event,
                SchedulerEvent::Subscribed { .. } | SchedulerEvent::Heartbeat
            )
        {
            warn!(event = event.name(), "Ignoring event received before SUBSCRIBED");
            return Flow::Continue;
        }

        match event {
            SchedulerEvent::Subscribed {
                framework_id,
                heartbeat_interval,
                master_info,
            } => {
                info!(
                    framework_id = %framework_id,
                    heartbeat_interval_secs = heartbeat_interval.map(|d| d.as_secs_f64()),
                    master = master_info.as_ref().and_then(|m| m.hostname.as_deref()),
                    "Subscribed"
                );
                if let Some(store) = &self.store {
                    if let Err(e) =
                        persistence::put(store.as_ref(), FRAMEWORK_ID_KEY, framework_id.value.as_bytes())
                            .await
                    {
                        warn!(error = %e, "Failed to store framework id");
                    }
                }
                self.scheduler.set_framework_id(framework_id);
                self.state = SessionState::Running;
            }
            SchedulerEvent::Offers(offers) => self.handle_offers(offers).await,
            SchedulerEvent::InverseOffers(inverse_offers) => {
                observe_inverse_offers(&inverse_offers)
            }
            SchedulerEvent::Rescind(offer_id) => self.handle_rescind(&offer_id),
            SchedulerEvent::RescindInverseOffer(offer_id) => {
                info!(offer_id = %offer_id, "Inverse offer rescinded");
            }
            SchedulerEvent::Update(status) => self.handle_update(status).await,
            SchedulerEvent::Message(message) => {
                tokio::spawn(observe_message(message));
            }
            SchedulerEvent::Failure(failure) => {
                tokio::spawn(observe_failure(failure));
            }
            SchedulerEvent::Error(message) => {
                error!(message = %message, "Master reported an error, resubscribing");
                self.state = SessionState::Init;
                return Flow::Reconnect;
            }
            SchedulerEvent::Heartbeat => debug!("Heartbeat"),
            SchedulerEvent::Unknown(kind) => warn!(kind, "Unknown event"),
        }

        Flow::Continue
    }

    /// Held offers that `batch` does not carry again.
    fn stale_offers(&self, batch: &[Offer]) -> Vec<OfferId> {
        self.resources
            .offers()
            .iter()
            .filter_map(|held| held.offer_id())
            .filter(|id| !batch.iter().any(|o| o.id.as_ref() == Some(*id)))
            .cloned()
            .collect()
    }

    async fn handle_offers(&mut self, offers: Vec<Offer>) {
        info!(offers = offers.len(), "Received offers");

        let stale = self.stale_offers(&offers);

        if !self.tasks.has_queued_tasks() {
            let offer_ids: Vec<OfferId> = stale
                .into_iter()
                .chain(offers.iter().filter_map(|o| o.id.clone()))
                .collect();
            debug!(offers = offer_ids.len(), "No queued tasks, declining offers");
            self.resources.clear();
            if let Err(e) = self.scheduler.decline(offer_ids, None).await {
                warn!(error = %e, "Failed to decline offers");
            }
            if let Err(e) = self.scheduler.suppress().await {
                warn!(error = %e, "Failed to suppress offers");
            }
            return;
        }

        if !stale.is_empty() {
            debug!(offers = stale.len(), "Declining offers replaced by the new batch");
            if let Err(e) = self.scheduler.decline(stale, None).await {
                warn!(error = %e, "Failed to decline offers");
            }
        }
        self.resources.add_offers(offers);

        let mut offer_ids = Vec::new();
        let mut operations = Vec::new();
        let mut launched = Vec::new();

        for task in self.tasks.queued_tasks() {
            let assigned = match self.resources.assign(&task) {
                Ok(assigned) => assigned,
                Err(e) => {
                    error!(task_id = %task.id, error = %e, "Task stays queued");
                    continue;
                }
            };

            let (Some(offer_id), Some(agent_id)) =
                (assigned.offer.id.clone(), assigned.offer.agent_id.clone())
            else {
                error!(task_id = %task.id, "Offer carries no id or agent id");
                continue;
            };

            debug!(task_id = %task.id, offer_id = %offer_id, agent_id = %agent_id, "Task assigned");
            offer_ids.push(offer_id);
            operations.push(offer::Operation::launch(vec![task.to_task_info(agent_id)]));
            launched.push(task.id);
        }

        if operations.is_empty() {
            debug!("No queued task fits the current offers");
            return;
        }

        match self.scheduler.accept(offer_ids, operations, None).await {
            Ok(()) => {
                for id in &launched {
                    if let Err(e) = self.tasks.set_task_launched(id) {
                        warn!(task_id = %id, error = %e, "Launched task disappeared");
                    }
                }
                info!(tasks = launched.len(), "Tasks launched");
            }
            Err(e) => {
                error!(tasks = launched.len(), error = %e, "Accept failed, tasks stay queued");
            }
        }
    }

    async fn handle_update(&mut self, status: TaskStatus) {
        let Some(task_id) = status.task_id.clone() else {
            warn!("Status update without task id");
            return;
        };
        let state = TaskState::from(status.state);
        info!(
            task_id = %task_id,
            state = %state,
            message = status.message.as_deref().unwrap_or(""),
            "Task status update"
        );

        if self.tasks.has_task(&task_id.value) {
            if let Err(e) = self.tasks.set_status(&task_id.value, status.clone()) {
                warn!(task_id = %task_id, error = %e, "Failed to record status");
            }
            if state == TaskState::Failed {
                self.handle_failed_task(&task_id.value).await;
            }
        } else {
            error!(task_id = %task_id, "Status update for unknown task");
        }

        let Some(uuid) = status.uuid else {
            return;
        };
        let Some(agent_id) = status.agent_id else {
            warn!(task_id = %task_id, "Cannot acknowledge update without agent id");
            return;
        };
        if let Err(e) = self.scheduler.acknowledge(agent_id, task_id, uuid).await {
            warn!(error = %e, "Failed to acknowledge status update");
        }
    }

    /// Requeue a failed task while its retry policy allows, otherwise mark it failed.
    async fn handle_failed_task(&mut self, id: &str) {
        if self.retry.check_policy(id).is_none() {
            if let Some(policy) = self.tasks.get(id).and_then(|t| t.retry) {
                self.retry.add_policy(id, policy);
            }
        }

        if self.retry.record_failure(id) {
            let attempt = self
                .retry
                .check_policy(id)
                .map(|p| p.total_retries)
                .unwrap_or_default();
            info!(task_id = %id, attempt, "Requeueing failed task");
            if let Err(e) = self.tasks.requeue(id) {
                warn!(task_id = %id, error = %e, "Failed to requeue task");
                return;
            }
            if let Err(e) = self.scheduler.revive().await {
                warn!(error = %e, "Failed to revive offers");
            }
        } else {
            self.retry.clear_policy(id);
            if let Err(e) = self.tasks.set_task_state(id, TaskState::Failed) {
                warn!(task_id = %id, error = %e, "Failed to mark task failed");
            }
        }
    }

    fn handle_rescind(&mut self, offer_id: &OfferId) {
        if self.resources.remove_offer(offer_id) {
            info!(offer_id = %offer_id, "Offer rescinded");
        } else {
            debug!(offer_id = %offer_id, "Rescinded offer was not held");
        }
    }
}

fn observe_inverse_offers(inverse_offers: &[InverseOffer]) {
    for inverse_offer in inverse_offers {
        info!(
            offer_id = ?inverse_offer.id.as_ref().map(|id| id.value.as_str()),
            agent_id = ?inverse_offer.agent_id.as_ref().map(|id| id.value.as_str()),
            "Inverse offer received"
        );
    }
}

async fn observe_message(message: event::Message) {
    info!(
        agent_id = ?message.agent_id.as_ref().map(|id| id.value.as_str()),
        executor_id = ?message.executor_id.as_ref().map(|id| id.value.as_str()),
        size = message.data.len(),
        "Executor message"
    );
}

async fn observe_failure(failure: event::Failure) {
    error!(
        agent_id = ?failure.agent_id.as_ref().map(|id| id.value.as_str()),
        executor_id = ?failure.executor_id.as_ref().map(|id| id.value.as_str()),
        status = ?failure.status,
        "Agent or executor failure"
    );
}
