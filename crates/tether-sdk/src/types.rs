// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! High-level types for the SDK.

use tether_protocol::mesos::{
    self as proto, AgentId, CommandInfo, ContainerInfo, HealthCheck, Labels, Resource, TaskId,
    TaskInfo, TaskStatus,
};

use crate::retry::RetryPolicy;

/// Lifecycle state of a task known to the framework.
///
/// `Queued` and `Launched` are local states; the rest mirror the states the
/// master reports in status updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskState {
    /// Waiting for a matching offer
    Queued,
    /// Included in an accepted launch
    Launched,
    Staging,
    Starting,
    Running,
    Killing,
    Finished,
    Failed,
    Killed,
    Error,
    Lost,
    Dropped,
    Unreachable,
    Gone,
    GoneByOperator,
    Unknown,
}

impl TaskState {
    /// True for states after which the task will not run again.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskState::Finished
                | TaskState::Failed
                | TaskState::Killed
                | TaskState::Error
                | TaskState::Lost
                | TaskState::Dropped
                | TaskState::Gone
                | TaskState::GoneByOperator
        )
    }
}

impl From<proto::TaskState> for TaskState {
    fn from(state: proto::TaskState) -> Self {
        match state {
            proto::TaskState::TaskStaging => TaskState::Staging,
            proto::TaskState::TaskStarting => TaskState::Starting,
            proto::TaskState::TaskRunning => TaskState::Running,
            proto::TaskState::TaskKilling => TaskState::Killing,
            proto::TaskState::TaskFinished => TaskState::Finished,
            proto::TaskState::TaskFailed => TaskState::Failed,
            proto::TaskState::TaskKilled => TaskState::Killed,
            proto::TaskState::TaskError => TaskState::Error,
            proto::TaskState::TaskLost => TaskState::Lost,
            proto::TaskState::TaskDropped => TaskState::Dropped,
            proto::TaskState::TaskUnreachable => TaskState::Unreachable,
            proto::TaskState::TaskGone => TaskState::Gone,
            proto::TaskState::TaskGoneByOperator => TaskState::GoneByOperator,
            proto::TaskState::TaskUnknown => TaskState::Unknown,
        }
    }
}

impl From<i32> for TaskState {
    fn from(value: i32) -> Self {
        proto::TaskState::try_from(value)
            .map(TaskState::from)
            .unwrap_or(TaskState::Unknown)
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TaskState::Queued => "QUEUED",
            TaskState::Launched => "LAUNCHED",
            TaskState::Staging => "TASK_STAGING",
            TaskState::Starting => "TASK_STARTING",
            TaskState::Running => "TASK_RUNNING",
            TaskState::Killing => "TASK_KILLING",
            TaskState::Finished => "TASK_FINISHED",
            TaskState::Failed => "TASK_FAILED",
            TaskState::Killed => "TASK_KILLED",
            TaskState::Error => "TASK_ERROR",
            TaskState::Lost => "TASK_LOST",
            TaskState::Dropped => "TASK_DROPPED",
            TaskState::Unreachable => "TASK_UNREACHABLE",
            TaskState::Gone => "TASK_GONE",
            TaskState::GoneByOperator => "TASK_GONE_BY_OPERATOR",
            TaskState::Unknown => "TASK_UNKNOWN",
        };
        f.write_str(name)
    }
}

/// A task the framework wants to run.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    /// Unique task id (also the task manager key)
    pub id: String,
    pub name: String,
    pub command: Option<CommandInfo>,
    pub container: Option<ContainerInfo>,
    pub labels: Option<Labels>,
    pub health_check: Option<HealthCheck>,
    /// Resource demands (`cpus`, `mem`, `disk`, ...)
    pub resources: Vec<Resource>,
    pub state: TaskState,
    /// Last status update received from the master
    pub status: Option<TaskStatus>,
    /// Agent the task was last launched on
    pub agent_id: Option<AgentId>,
    pub retry: Option<RetryPolicy>,
}

impl Task {
    /// Create a queued task with no demands.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            command: None,
            container: None,
            labels: None,
            health_check: None,
            resources: Vec::new(),
            state: TaskState::Queued,
            status: None,
            agent_id: None,
            retry: None,
        }
    }

    pub fn with_command(mut self, command: CommandInfo) -> Self {
        self.command = Some(command);
        self
    }

    pub fn with_container(mut self, container: ContainerInfo) -> Self {
        self.container = Some(container);
        self
    }

    pub fn with_resource(mut self, resource: Resource) -> Self {
        self.resources.push(resource);
        self
    }

    pub fn with_retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = Some(policy);
        self
    }

    /// Sum of the scalar demands named `name`.
    pub fn demand(&self, name: &str) -> f64 {
        self.resources
            .iter()
            .filter(|r| r.name == name)
            .map(Resource::scalar_value)
            .sum()
    }

    /// Build the launch description for this task on the given agent.
    pub fn to_task_info(&self, agent_id: AgentId) -> TaskInfo {
        TaskInfo {
            name: self.name.clone(),
            task_id: Some(TaskId::new(self.id.clone())),
            agent_id: Some(agent_id),
            resources: self.resources.clone(),
            command: self.command.clone(),
            health_check: self.health_check.clone(),
            container: self.container.clone(),
            labels: self.labels.clone(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_state_conversion() {
        assert_eq!(
            TaskState::from(proto::TaskState::TaskRunning),
            TaskState::Running
        );
        assert_eq!(TaskState::from(3), TaskState::Failed);
        assert_eq!(TaskState::from(-1), TaskState::Unknown);
    }

    #[test]
    fn test_terminal_states() {
        assert!(TaskState::Finished.is_terminal());
        assert!(TaskState::Failed.is_terminal());
        assert!(!TaskState::Running.is_terminal());
        assert!(!TaskState::Queued.is_terminal());
        assert!(!TaskState::Unreachable.is_terminal());
    }

    #[test]
    fn test_task_state_display() {
        assert_eq!(TaskState::Launched.to_string(), "LAUNCHED");
        assert_eq!(TaskState::GoneByOperator.to_string(), "TASK_GONE_BY_OPERATOR");
    }

    #[test]
    fn test_task_demand_sums_scalars() {
        let task = Task::new("t1", "web")
            .with_resource(Resource::new_scalar("cpus", 0.5))
            .with_resource(Resource::new_scalar("cpus", 0.25))
            .with_resource(Resource::new_scalar("mem", 128.0));

        assert_eq!(task.demand("cpus"), 0.75);
        assert_eq!(task.demand("mem"), 128.0);
        assert_eq!(task.demand("gpus"), 0.0);
    }

    #[test]
    fn test_to_task_info() {
        let task = Task::new("t1", "web").with_resource(Resource::new_scalar("cpus", 1.0));
        let info = task.to_task_info(AgentId::new("A1"));

        assert_eq!(info.name, "web");
        assert_eq!(info.task_id.unwrap().value, "t1");
        assert_eq!(info.agent_id.unwrap().value, "A1");
        assert_eq!(info.resources.len(), 1);
    }
}
