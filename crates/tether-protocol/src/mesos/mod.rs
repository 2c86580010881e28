// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Common master/agent messages shared by the scheduler API.
//!
//! Field tags follow the master's `mesos.proto` (v1) so the encoded bytes are
//! wire compatible. Only the subset the SDK reads or writes is declared;
//! unknown fields are skipped by the decoder.
//!
//! The scheduler envelope types ([`Call`], [`Event`]) live in [`scheduler`]
//! and are re-exported here.

use prost::alloc::string::String;
use prost::alloc::vec::Vec;

pub mod scheduler;

pub use scheduler::{Call, Event, call, event};

#[derive(Clone, PartialEq, Eq, Hash, ::prost::Message)]
pub struct FrameworkId {
    #[prost(string, tag = "1")]
    pub value: String,
}

#[derive(Clone, PartialEq, Eq, Hash, ::prost::Message)]
pub struct OfferId {
    #[prost(string, tag = "1")]
    pub value: String,
}

#[derive(Clone, PartialEq, Eq, Hash, ::prost::Message)]
pub struct AgentId {
    #[prost(string, tag = "1")]
    pub value: String,
}

#[derive(Clone, PartialEq, Eq, Hash, ::prost::Message)]
pub struct TaskId {
    #[prost(string, tag = "1")]
    pub value: String,
}

#[derive(Clone, PartialEq, Eq, Hash, ::prost::Message)]
pub struct ExecutorId {
    #[prost(string, tag = "1")]
    pub value: String,
}

macro_rules! impl_id {
    ($($ty:ident),* $(,)?) => {
        $(
            impl $ty {
                /// Wrap an opaque identifier string.
                pub fn new(value: impl Into<String>) -> Self {
                    Self { value: value.into() }
                }
            }

            impl std::fmt::Display for $ty {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    f.write_str(&self.value)
                }
            }
        )*
    };
}

impl_id!(FrameworkId, OfferId, AgentId, TaskId, ExecutorId);

/// Describes a framework to the master on subscribe.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FrameworkInfo {
    #[prost(string, tag = "1")]
    pub user: String,
    #[prost(string, tag = "2")]
    pub name: String,
    #[prost(message, optional, tag = "3")]
    pub id: Option<FrameworkId>,
    #[prost(double, optional, tag = "4")]
    pub failover_timeout: Option<f64>,
    #[prost(bool, optional, tag = "5")]
    pub checkpoint: Option<bool>,
    #[prost(string, optional, tag = "6")]
    pub role: Option<String>,
    #[prost(string, optional, tag = "7")]
    pub hostname: Option<String>,
    #[prost(string, optional, tag = "8")]
    pub principal: Option<String>,
    #[prost(string, optional, tag = "9")]
    pub webui_url: Option<String>,
    #[prost(message, repeated, tag = "10")]
    pub capabilities: Vec<framework_info::Capability>,
    #[prost(message, optional, tag = "11")]
    pub labels: Option<Labels>,
}

pub mod framework_info {
    use super::*;

    #[derive(Clone, Copy, PartialEq, ::prost::Message)]
    pub struct Capability {
        #[prost(enumeration = "capability::Type", tag = "1")]
        pub r#type: i32,
    }

    pub mod capability {
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
        #[repr(i32)]
        pub enum Type {
            Unknown = 0,
            RevocableResources = 1,
            TaskKillingState = 2,
            GpuResources = 3,
            SharedResources = 4,
            PartitionAware = 5,
            MultiRole = 6,
        }
    }

    impl Capability {
        pub fn of(kind: capability::Type) -> Self {
            Self { r#type: kind as i32 }
        }
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MasterInfo {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(uint32, tag = "2")]
    pub ip: u32,
    #[prost(uint32, tag = "3")]
    pub port: u32,
    #[prost(string, optional, tag = "4")]
    pub pid: Option<String>,
    #[prost(string, optional, tag = "5")]
    pub hostname: Option<String>,
    #[prost(string, optional, tag = "6")]
    pub version: Option<String>,
}

pub mod value {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum Type {
        Scalar = 0,
        Ranges = 1,
        Set = 2,
        Text = 3,
    }

    #[derive(Clone, Copy, PartialEq, ::prost::Message)]
    pub struct Scalar {
        #[prost(double, tag = "1")]
        pub value: f64,
    }

    #[derive(Clone, Copy, PartialEq, Eq, ::prost::Message)]
    pub struct Range {
        #[prost(uint64, tag = "1")]
        pub begin: u64,
        #[prost(uint64, tag = "2")]
        pub end: u64,
    }

    #[derive(Clone, PartialEq, Eq, ::prost::Message)]
    pub struct Ranges {
        #[prost(message, repeated, tag = "1")]
        pub range: Vec<Range>,
    }

    #[derive(Clone, PartialEq, Eq, ::prost::Message)]
    pub struct Set {
        #[prost(string, repeated, tag = "1")]
        pub item: Vec<String>,
    }
}

/// A named quantity offered by an agent or demanded by a task.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Resource {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(enumeration = "value::Type", tag = "2")]
    pub r#type: i32,
    #[prost(message, optional, tag = "3")]
    pub scalar: Option<value::Scalar>,
    #[prost(message, optional, tag = "4")]
    pub ranges: Option<value::Ranges>,
    #[prost(message, optional, tag = "5")]
    pub set: Option<value::Set>,
    #[prost(string, optional, tag = "6")]
    pub role: Option<String>,
    #[prost(message, optional, tag = "7")]
    pub disk: Option<resource::DiskInfo>,
}

impl Resource {
    /// Scalar resource such as `cpus`, `mem` or `disk`.
    pub fn new_scalar(name: impl Into<String>, amount: f64) -> Self {
        Self {
            name: name.into(),
            r#type: value::Type::Scalar as i32,
            scalar: Some(value::Scalar { value: amount }),
            ..Default::default()
        }
    }

    /// Ranges resource such as `ports`.
    pub fn new_ranges(name: impl Into<String>, ranges: Vec<(u64, u64)>) -> Self {
        Self {
            name: name.into(),
            r#type: value::Type::Ranges as i32,
            ranges: Some(value::Ranges {
                range: ranges
                    .into_iter()
                    .map(|(begin, end)| value::Range { begin, end })
                    .collect(),
            }),
            ..Default::default()
        }
    }

    /// Scalar amount, or 0.0 for non-scalar resources.
    pub fn scalar_value(&self) -> f64 {
        self.scalar.map(|s| s.value).unwrap_or(0.0)
    }
}

pub mod resource {
    use super::*;

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct DiskInfo {
        #[prost(message, optional, tag = "1")]
        pub persistence: Option<disk_info::Persistence>,
        #[prost(message, optional, tag = "2")]
        pub volume: Option<Volume>,
    }

    pub mod disk_info {
        use super::super::*;

        #[derive(Clone, PartialEq, ::prost::Message)]
        pub struct Persistence {
            #[prost(string, tag = "1")]
            pub id: String,
            #[prost(string, optional, tag = "2")]
            pub principal: Option<String>,
        }
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Volume {
    #[prost(string, tag = "1")]
    pub container_path: String,
    #[prost(string, optional, tag = "2")]
    pub host_path: Option<String>,
    #[prost(enumeration = "volume::Mode", tag = "3")]
    pub mode: i32,
}

pub mod volume {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum Mode {
        Rw = 1,
        Ro = 2,
    }
}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct Filters {
    #[prost(double, optional, tag = "1")]
    pub refuse_seconds: Option<f64>,
}

impl Filters {
    pub fn refuse_for(seconds: f64) -> Self {
        Self {
            refuse_seconds: Some(seconds),
        }
    }
}

#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct Label {
    #[prost(string, tag = "1")]
    pub key: String,
    #[prost(string, optional, tag = "2")]
    pub value: Option<String>,
}

#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct Labels {
    #[prost(message, repeated, tag = "1")]
    pub labels: Vec<Label>,
}

#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct Parameter {
    #[prost(string, tag = "1")]
    pub key: String,
    #[prost(string, tag = "2")]
    pub value: String,
}

#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct Environment {
    #[prost(message, repeated, tag = "1")]
    pub variables: Vec<environment::Variable>,
}

pub mod environment {
    use super::*;

    #[derive(Clone, PartialEq, Eq, ::prost::Message)]
    pub struct Variable {
        #[prost(string, tag = "1")]
        pub name: String,
        #[prost(string, tag = "2")]
        pub value: String,
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CommandInfo {
    #[prost(message, repeated, tag = "1")]
    pub uris: Vec<command_info::Uri>,
    #[prost(message, optional, tag = "2")]
    pub environment: Option<Environment>,
    #[prost(string, optional, tag = "3")]
    pub value: Option<String>,
    #[prost(string, optional, tag = "5")]
    pub user: Option<String>,
    #[prost(bool, optional, tag = "6")]
    pub shell: Option<bool>,
    #[prost(string, repeated, tag = "7")]
    pub arguments: Vec<String>,
}

pub mod command_info {
    use super::*;

    #[derive(Clone, PartialEq, Eq, ::prost::Message)]
    pub struct Uri {
        #[prost(string, tag = "1")]
        pub value: String,
        #[prost(bool, optional, tag = "2")]
        pub executable: Option<bool>,
        #[prost(bool, optional, tag = "3")]
        pub extract: Option<bool>,
        #[prost(bool, optional, tag = "4")]
        pub cache: Option<bool>,
        #[prost(string, optional, tag = "5")]
        pub output_file: Option<String>,
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ContainerInfo {
    #[prost(enumeration = "container_info::Type", tag = "1")]
    pub r#type: i32,
    #[prost(message, repeated, tag = "2")]
    pub volumes: Vec<Volume>,
    #[prost(message, optional, tag = "3")]
    pub docker: Option<container_info::DockerInfo>,
    #[prost(string, optional, tag = "4")]
    pub hostname: Option<String>,
}

pub mod container_info {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum Type {
        Docker = 1,
        Mesos = 2,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct DockerInfo {
        #[prost(string, tag = "1")]
        pub image: String,
        #[prost(enumeration = "docker_info::Network", tag = "2")]
        pub network: i32,
        #[prost(message, repeated, tag = "3")]
        pub port_mappings: Vec<docker_info::PortMapping>,
        #[prost(bool, optional, tag = "4")]
        pub privileged: Option<bool>,
        #[prost(message, repeated, tag = "5")]
        pub parameters: Vec<Parameter>,
        #[prost(bool, optional, tag = "6")]
        pub force_pull_image: Option<bool>,
    }

    pub mod docker_info {
        use super::super::*;

        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
        #[repr(i32)]
        pub enum Network {
            Host = 1,
            Bridge = 2,
            None = 3,
            User = 4,
        }

        #[derive(Clone, PartialEq, Eq, ::prost::Message)]
        pub struct PortMapping {
            #[prost(uint32, tag = "1")]
            pub host_port: u32,
            #[prost(uint32, tag = "2")]
            pub container_port: u32,
            #[prost(string, optional, tag = "3")]
            pub protocol: Option<String>,
        }
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct HealthCheck {
    #[prost(message, optional, tag = "1")]
    pub http: Option<health_check::HttpCheckInfo>,
    #[prost(double, optional, tag = "2")]
    pub delay_seconds: Option<f64>,
    #[prost(double, optional, tag = "3")]
    pub interval_seconds: Option<f64>,
    #[prost(double, optional, tag = "4")]
    pub timeout_seconds: Option<f64>,
    #[prost(uint32, optional, tag = "5")]
    pub consecutive_failures: Option<u32>,
    #[prost(double, optional, tag = "6")]
    pub grace_period_seconds: Option<f64>,
    #[prost(message, optional, tag = "7")]
    pub command: Option<CommandInfo>,
    #[prost(enumeration = "health_check::Type", tag = "8")]
    pub r#type: i32,
    #[prost(message, optional, tag = "9")]
    pub tcp: Option<health_check::TcpCheckInfo>,
}

pub mod health_check {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum Type {
        Unknown = 0,
        Command = 1,
        Http = 2,
        Tcp = 3,
    }

    #[derive(Clone, PartialEq, Eq, ::prost::Message)]
    pub struct HttpCheckInfo {
        #[prost(uint32, tag = "1")]
        pub port: u32,
        #[prost(string, optional, tag = "2")]
        pub path: Option<String>,
        #[prost(string, optional, tag = "3")]
        pub scheme: Option<String>,
        #[prost(uint32, repeated, tag = "4")]
        pub statuses: Vec<u32>,
    }

    #[derive(Clone, Copy, PartialEq, Eq, ::prost::Message)]
    pub struct TcpCheckInfo {
        #[prost(uint32, tag = "1")]
        pub port: u32,
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ExecutorInfo {
    #[prost(message, optional, tag = "1")]
    pub executor_id: Option<ExecutorId>,
    #[prost(bytes = "vec", optional, tag = "4")]
    pub data: Option<Vec<u8>>,
    #[prost(message, repeated, tag = "5")]
    pub resources: Vec<Resource>,
    #[prost(message, optional, tag = "7")]
    pub command: Option<CommandInfo>,
    #[prost(message, optional, tag = "8")]
    pub framework_id: Option<FrameworkId>,
    #[prost(string, optional, tag = "9")]
    pub name: Option<String>,
    #[prost(message, optional, tag = "11")]
    pub container: Option<ContainerInfo>,
}

/// Everything an agent needs to launch a task.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TaskInfo {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(message, optional, tag = "2")]
    pub task_id: Option<TaskId>,
    #[prost(message, optional, tag = "3")]
    pub agent_id: Option<AgentId>,
    #[prost(message, repeated, tag = "4")]
    pub resources: Vec<Resource>,
    #[prost(message, optional, tag = "5")]
    pub executor: Option<ExecutorInfo>,
    #[prost(bytes = "vec", optional, tag = "6")]
    pub data: Option<Vec<u8>>,
    #[prost(message, optional, tag = "7")]
    pub command: Option<CommandInfo>,
    #[prost(message, optional, tag = "8")]
    pub health_check: Option<HealthCheck>,
    #[prost(message, optional, tag = "9")]
    pub container: Option<ContainerInfo>,
    #[prost(message, optional, tag = "10")]
    pub labels: Option<Labels>,
}

/// Resources advertised by the master on behalf of one agent.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Offer {
    #[prost(message, optional, tag = "1")]
    pub id: Option<OfferId>,
    #[prost(message, optional, tag = "2")]
    pub framework_id: Option<FrameworkId>,
    #[prost(message, optional, tag = "3")]
    pub agent_id: Option<AgentId>,
    #[prost(string, tag = "4")]
    pub hostname: String,
    #[prost(message, repeated, tag = "5")]
    pub resources: Vec<Resource>,
    #[prost(message, repeated, tag = "6")]
    pub executor_ids: Vec<ExecutorId>,
}

pub mod offer {
    use super::*;

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Operation {
        #[prost(enumeration = "operation::Type", tag = "1")]
        pub r#type: i32,
        #[prost(message, optional, tag = "2")]
        pub launch: Option<operation::Launch>,
    }

    pub mod operation {
        use super::super::*;

        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
        #[repr(i32)]
        pub enum Type {
            Unknown = 0,
            Launch = 1,
            Reserve = 2,
            Unreserve = 3,
            Create = 4,
            Destroy = 5,
            LaunchGroup = 6,
        }

        #[derive(Clone, PartialEq, ::prost::Message)]
        pub struct Launch {
            #[prost(message, repeated, tag = "1")]
            pub task_infos: Vec<TaskInfo>,
        }
    }

    impl Operation {
        /// A `LAUNCH` operation for the given tasks.
        pub fn launch(task_infos: Vec<TaskInfo>) -> Self {
            Self {
                r#type: operation::Type::Launch as i32,
                launch: Some(operation::Launch { task_infos }),
            }
        }
    }
}

/// A request from the master to give resources back (maintenance).
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct InverseOffer {
    #[prost(message, optional, tag = "1")]
    pub id: Option<OfferId>,
    #[prost(message, optional, tag = "3")]
    pub framework_id: Option<FrameworkId>,
    #[prost(message, optional, tag = "4")]
    pub agent_id: Option<AgentId>,
    #[prost(message, repeated, tag = "6")]
    pub resources: Vec<Resource>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum TaskState {
    TaskStarting = 0,
    TaskRunning = 1,
    TaskFinished = 2,
    TaskFailed = 3,
    TaskKilled = 4,
    TaskLost = 5,
    TaskStaging = 6,
    TaskError = 7,
    TaskKilling = 8,
    TaskDropped = 9,
    TaskUnreachable = 10,
    TaskGone = 11,
    TaskGoneByOperator = 12,
    TaskUnknown = 13,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TaskStatus {
    #[prost(message, optional, tag = "1")]
    pub task_id: Option<TaskId>,
    #[prost(enumeration = "TaskState", tag = "2")]
    pub state: i32,
    #[prost(bytes = "vec", optional, tag = "3")]
    pub data: Option<Vec<u8>>,
    #[prost(string, optional, tag = "4")]
    pub message: Option<String>,
    #[prost(message, optional, tag = "5")]
    pub agent_id: Option<AgentId>,
    #[prost(double, optional, tag = "6")]
    pub timestamp: Option<f64>,
    #[prost(message, optional, tag = "7")]
    pub executor_id: Option<ExecutorId>,
    #[prost(bool, optional, tag = "8")]
    pub healthy: Option<bool>,
    #[prost(enumeration = "task_status::Source", optional, tag = "9")]
    pub source: Option<i32>,
    #[prost(int32, optional, tag = "10")]
    pub reason: Option<i32>,
    #[prost(bytes = "vec", optional, tag = "11")]
    pub uuid: Option<Vec<u8>>,
    #[prost(message, optional, tag = "12")]
    pub labels: Option<Labels>,
}

pub mod task_status {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum Source {
        SourceMaster = 0,
        SourceAgent = 1,
        SourceExecutor = 2,
    }
}

/// Resource hint sent with a `REQUEST` call.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Request {
    #[prost(message, optional, tag = "1")]
    pub agent_id: Option<AgentId>,
    #[prost(message, repeated, tag = "2")]
    pub resources: Vec<Resource>,
}

#[derive(Clone, Copy, PartialEq, Eq, ::prost::Message)]
pub struct DurationInfo {
    #[prost(int64, tag = "1")]
    pub nanoseconds: i64,
}

#[derive(Clone, Copy, PartialEq, Eq, ::prost::Message)]
pub struct KillPolicy {
    #[prost(message, optional, tag = "1")]
    pub grace_period: Option<DurationInfo>,
}
