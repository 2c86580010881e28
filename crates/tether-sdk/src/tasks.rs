// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Task bookkeeping.

use thiserror::Error;
use tether_protocol::mesos::TaskStatus;

use crate::collections::ConcurrentMap;
use crate::types::{Task, TaskState};

/// Errors from task bookkeeping
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TaskError {
    #[error("task already exists: {0}")]
    AlreadyExists(String),

    #[error("task not found: {0}")]
    NotFound(String),
}

/// All tasks the framework knows about, keyed by task id.
///
/// Safe to share between the controller and other tasks; reads that return
/// several tasks work on a snapshot.
#[derive(Debug, Default)]
pub struct TaskManager {
    tasks: ConcurrentMap<String, Task>,
}

impl TaskManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a task. Ids are unique.
    pub fn add(&self, task: Task) -> Result<(), TaskError> {
        let id = task.id.clone();
        if self.tasks.insert_if_absent(id.clone(), task) {
            Ok(())
        } else {
            Err(TaskError::AlreadyExists(id))
        }
    }

    pub fn delete(&self, id: &str) -> Result<Task, TaskError> {
        self.tasks
            .remove(&id.to_string())
            .ok_or_else(|| TaskError::NotFound(id.to_string()))
    }

    pub fn get(&self, id: &str) -> Option<Task> {
        self.tasks.get(&id.to_string())
    }

    pub fn has_task(&self, id: &str) -> bool {
        self.tasks.contains_key(&id.to_string())
    }

    pub fn set_task_launched(&self, id: &str) -> Result<(), TaskError> {
        self.set_task_state(id, TaskState::Launched)
    }

    pub fn set_task_state(&self, id: &str, state: TaskState) -> Result<(), TaskError> {
        self.modify(id, |task| task.state = state)
    }

    /// Record the latest status update for a task.
    pub fn set_status(&self, id: &str, status: TaskStatus) -> Result<(), TaskError> {
        self.modify(id, |task| {
            if let Some(agent_id) = &status.agent_id {
                task.agent_id = Some(agent_id.clone());
            }
            task.status = Some(status);
        })
    }

    /// Put a task back in the queue so the next offers can relaunch it.
    pub fn requeue(&self, id: &str) -> Result<(), TaskError> {
        self.modify(id, |task| {
            task.state = TaskState::Queued;
            task.agent_id = None;
        })
    }

    /// Tasks currently in `state`, ordered by id.
    pub fn get_state(&self, state: TaskState) -> Vec<Task> {
        let mut tasks = self.tasks.filter_values(|t| t.state == state);
        tasks.sort_by(|a, b| a.id.cmp(&b.id));
        tasks
    }

    /// Snapshot of queued tasks, ordered by id.
    pub fn queued_tasks(&self) -> impl Iterator<Item = Task> + use<> {
        self.get_state(TaskState::Queued).into_iter()
    }

    pub fn has_queued_tasks(&self) -> bool {
        self.tasks.any(|t| t.state == TaskState::Queued)
    }

    pub fn total_tasks(&self) -> usize {
        self.tasks.len()
    }

    /// Snapshot of every task, in no particular order.
    pub fn tasks(&self) -> impl Iterator<Item = Task> + use<> {
        self.tasks.iter().map(|(_, task)| task)
    }

    fn modify(&self, id: &str, f: impl FnOnce(&mut Task)) -> Result<(), TaskError> {
        self.tasks
            .update(&id.to_string(), f)
            .ok_or_else(|| TaskError::NotFound(id.to_string()))
    }
}
