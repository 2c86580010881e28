// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! JSON task definitions.
//!
//! ```json
//! {
//!   "id": "web-1",
//!   "name": "web",
//!   "cmd": "python3 -m http.server 8080",
//!   "resources": { "cpus": 0.5, "mem": 128, "ports": "31000-31001" },
//!   "container": {
//!     "type": "docker",
//!     "image": "python:3.12-slim",
//!     "network": "bridge",
//!     "portMappings": [{ "hostPort": 31000, "containerPort": 8080 }]
//!   },
//!   "healthcheck": { "type": "http", "port": 8080, "path": "/" },
//!   "labels": { "team": "infra" },
//!   "retry": { "maxRetries": 3, "retryTimeMs": 1000 }
//! }
//! ```

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tether_protocol::mesos::{
    CommandInfo, ContainerInfo, Environment, HealthCheck, Label, Labels, Parameter, Resource,
    Volume, command_info, container_info, environment, health_check, volume,
};
use thiserror::Error;

use crate::resources::{CPUS, DISK, MEM};
use crate::retry::RetryPolicy;
use crate::types::Task;

/// Name of the port ranges resource.
pub const PORTS: &str = "ports";

/// Problems with a user-supplied task definition
#[derive(Debug, Error)]
pub enum TaskSpecError {
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("invalid port range: {0}")]
    BadPortRange(String),

    #[error("healthcheck has no type")]
    MissingHealthcheckType,

    #[error("http healthcheck has no path")]
    MissingHttpPath,

    #[error("invalid volume path: {0}")]
    VolumePath(String),

    #[error("missing field: {0}")]
    MissingField(&'static str),
}

/// A task definition as written by users.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSpec {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cmd: Option<String>,
    /// Arguments; when set the command runs without a shell
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub uris: Vec<UriSpec>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
    #[serde(default)]
    pub resources: ResourcesSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<ContainerSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub healthcheck: Option<HealthcheckSpec>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetrySpec>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UriSpec {
    pub uri: String,
    #[serde(default)]
    pub extract: bool,
    #[serde(default)]
    pub executable: bool,
    #[serde(default)]
    pub cache: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourcesSpec {
    #[serde(default)]
    pub cpus: f64,
    /// Megabytes
    #[serde(default)]
    pub mem: f64,
    /// Megabytes
    #[serde(default)]
    pub disk: f64,
    /// Comma separated ports or ranges, e.g. `"8080,31000-31010"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ports: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerKind {
    #[default]
    Docker,
    Mesos,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkMode {
    Host,
    #[default]
    Bridge,
    None,
    User,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerSpec {
    #[serde(default, rename = "type")]
    pub kind: ContainerKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub network: NetworkMode,
    #[serde(default)]
    pub privileged: bool,
    #[serde(default)]
    pub force_pull: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub port_mappings: Vec<PortMappingSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<VolumeSpec>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortMappingSpec {
    pub host_port: u32,
    pub container_port: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_path: Option<String>,
    #[serde(default)]
    pub read_only: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthcheckKind {
    Command,
    Http,
    Tcp,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthcheckSpec {
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<HealthcheckKind>,
    #[serde(default)]
    pub port: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay_seconds: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_seconds: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grace_period_seconds: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consecutive_failures: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrySpec {
    pub max_retries: u32,
    #[serde(default = "default_retry_time_ms")]
    pub retry_time_ms: u64,
    #[serde(default)]
    pub backoff: bool,
}

fn default_retry_time_ms() -> u64 {
    1_000
}

/// Parse a single task definition.
pub fn parse_task(json: &str) -> Result<Task, TaskSpecError> {
    serde_json::from_str::<TaskSpec>(json)?.into_task()
}

/// Parse a JSON array of task definitions.
pub fn parse_tasks(json: &str) -> Result<Vec<Task>, TaskSpecError> {
    serde_json::from_str::<Vec<TaskSpec>>(json)?
        .into_iter()
        .map(TaskSpec::into_task)
        .collect()
}

/// Parse `"8080,31000-31010"` into inclusive ranges.
pub fn parse_port_ranges(spec: &str) -> Result<Vec<(u64, u64)>, TaskSpecError> {
    let bad = || TaskSpecError::BadPortRange(spec.to_string());

    spec.split(',')
        .map(str::trim)
        .map(|part| {
            let (begin, end) = match part.split_once('-') {
                Some((begin, end)) => (begin.trim(), end.trim()),
                None => (part, part),
            };
            let begin: u64 = begin.parse().map_err(|_| bad())?;
            let end: u64 = end.parse().map_err(|_| bad())?;
            if begin == 0 || begin > end || end > u64::from(u16::MAX) {
                return Err(bad());
            }
            Ok((begin, end))
        })
        .collect()
}

impl TaskSpec {
    /// Validate the definition and build a queued task from it.
    pub fn into_task(self) -> Result<Task, TaskSpecError> {
        if self.id.trim().is_empty() {
            return Err(TaskSpecError::MissingField("id"));
        }
        if self.name.trim().is_empty() {
            return Err(TaskSpecError::MissingField("name"));
        }
        if self.cmd.is_none() && self.container.is_none() {
            return Err(TaskSpecError::MissingField("cmd"));
        }

        let resources = self.resources.to_resources()?;
        let health_check = self
            .healthcheck
            .as_ref()
            .map(HealthcheckSpec::to_health_check)
            .transpose()?;
        let container = self
            .container
            .as_ref()
            .map(ContainerSpec::to_container_info)
            .transpose()?;
        let command = self.command_info();
        let labels = (!self.labels.is_empty()).then(|| Labels {
            labels: self
                .labels
                .iter()
                .map(|(key, value)| Label {
                    key: key.clone(),
                    value: Some(value.clone()),
                })
                .collect(),
        });
        let retry = self.retry.as_ref().map(|r| {
            RetryPolicy::new(
                format!("task-{}", self.id),
                r.max_retries,
                Duration::from_millis(r.retry_time_ms),
            )
            .with_backoff(r.backoff)
        });

        let mut task = Task::new(self.id, self.name);
        task.command = Some(command);
        task.container = container;
        task.health_check = health_check;
        task.labels = labels;
        task.resources = resources;
        task.retry = retry;
        Ok(task)
    }

    fn command_info(&self) -> CommandInfo {
        CommandInfo {
            value: self.cmd.clone(),
            // Docker images without a cmd run their entrypoint unwrapped
            shell: Some(self.cmd.is_some() && self.args.is_empty()),
            arguments: self.args.clone(),
            user: self.user.clone(),
            uris: self
                .uris
                .iter()
                .map(|u| command_info::Uri {
                    value: u.uri.clone(),
                    extract: Some(u.extract),
                    executable: Some(u.executable),
                    cache: Some(u.cache),
                    output_file: None,
                })
                .collect(),
            environment: (!self.env.is_empty()).then(|| Environment {
                variables: self
                    .env
                    .iter()
                    .map(|(name, value)| environment::Variable {
                        name: name.clone(),
                        value: value.clone(),
                    })
                    .collect(),
            }),
        }
    }
}

impl ResourcesSpec {
    fn to_resources(&self) -> Result<Vec<Resource>, TaskSpecError> {
        let mut resources = Vec::new();
        for (name, amount) in [(CPUS, self.cpus), (MEM, self.mem), (DISK, self.disk)] {
            if amount > 0.0 {
                resources.push(Resource::new_scalar(name, amount));
            }
        }
        if let Some(ports) = self.ports.as_deref().filter(|p| !p.trim().is_empty()) {
            resources.push(Resource::new_ranges(PORTS, parse_port_ranges(ports)?));
        }
        Ok(resources)
    }
}

impl ContainerSpec {
    fn to_container_info(&self) -> Result<ContainerInfo, TaskSpecError> {
        let volumes = self
            .volumes
            .iter()
            .map(VolumeSpec::to_volume)
            .collect::<Result<Vec<_>, _>>()?;

        let docker = match self.kind {
            ContainerKind::Docker => {
                let image = self
                    .image
                    .clone()
                    .filter(|i| !i.is_empty())
                    .ok_or(TaskSpecError::MissingField("container.image"))?;
                let network = match self.network {
                    NetworkMode::Host => container_info::docker_info::Network::Host,
                    NetworkMode::Bridge => container_info::docker_info::Network::Bridge,
                    NetworkMode::None => container_info::docker_info::Network::None,
                    NetworkMode::User => container_info::docker_info::Network::User,
                };
                Some(container_info::DockerInfo {
                    image,
                    network: network as i32,
                    port_mappings: self
                        .port_mappings
                        .iter()
                        .map(|m| container_info::docker_info::PortMapping {
                            host_port: m.host_port,
                            container_port: m.container_port,
                            protocol: m.protocol.clone(),
                        })
                        .collect(),
                    privileged: Some(self.privileged),
                    parameters: self
                        .parameters
                        .iter()
                        .map(|(key, value)| Parameter {
                            key: key.clone(),
                            value: value.clone(),
                        })
                        .collect(),
                    force_pull_image: Some(self.force_pull),
                })
            }
            ContainerKind::Mesos => None,
        };

        let kind = match self.kind {
            ContainerKind::Docker => container_info::Type::Docker,
            ContainerKind::Mesos => container_info::Type::Mesos,
        };
        Ok(ContainerInfo {
            r#type: kind as i32,
            volumes,
            docker,
            hostname: None,
        })
    }
}

impl VolumeSpec {
    fn to_volume(&self) -> Result<Volume, TaskSpecError> {
        let (container_path, host_path) = match (&self.container_path, &self.host_path) {
            (Some(container_path), Some(host_path)) => (container_path, host_path),
            (Some(path), None) | (None, Some(path)) => {
                return Err(TaskSpecError::VolumePath(format!(
                    "{} (containerPath and hostPath must be set together)",
                    path
                )));
            }
            (None, None) => {
                return Err(TaskSpecError::VolumePath(
                    "volume has neither containerPath nor hostPath".to_string(),
                ));
            }
        };
        for path in [container_path, host_path] {
            if !path.starts_with('/') {
                return Err(TaskSpecError::VolumePath(path.clone()));
            }
        }

        let mode = if self.read_only {
            volume::Mode::Ro
        } else {
            volume::Mode::Rw
        };
        Ok(Volume {
            container_path: container_path.clone(),
            host_path: Some(host_path.clone()),
            mode: mode as i32,
        })
    }
}

impl HealthcheckSpec {
    fn to_health_check(&self) -> Result<HealthCheck, TaskSpecError> {
        let kind = self.kind.ok_or(TaskSpecError::MissingHealthcheckType)?;

        let mut check = HealthCheck {
            delay_seconds: self.delay_seconds,
            interval_seconds: self.interval_seconds,
            timeout_seconds: self.timeout_seconds,
            grace_period_seconds: self.grace_period_seconds,
            consecutive_failures: self.consecutive_failures,
            ..Default::default()
        };

        match kind {
            HealthcheckKind::Http => {
                let path = self
                    .path
                    .clone()
                    .filter(|p| !p.is_empty())
                    .ok_or(TaskSpecError::MissingHttpPath)?;
                check.r#type = health_check::Type::Http as i32;
                check.http = Some(health_check::HttpCheckInfo {
                    port: self.port,
                    path: Some(path),
                    ..Default::default()
                });
            }
            HealthcheckKind::Tcp => {
                check.r#type = health_check::Type::Tcp as i32;
                check.tcp = Some(health_check::TcpCheckInfo { port: self.port });
            }
            HealthcheckKind::Command => {
                let value = self
                    .command
                    .clone()
                    .ok_or(TaskSpecError::MissingField("healthcheck.command"))?;
                check.r#type = health_check::Type::Command as i32;
                check.command = Some(CommandInfo {
                    value: Some(value),
                    shell: Some(true),
                    ..Default::default()
                });
            }
        }

        Ok(check)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_port_ranges() {
        assert_eq!(parse_port_ranges("8080").unwrap(), vec![(8080, 8080)]);
        assert_eq!(
            parse_port_ranges("8080, 31000-31010").unwrap(),
            vec![(8080, 8080), (31000, 31010)]
        );
    }

    #[test]
    fn test_bad_port_ranges() {
        for spec in ["", "abc", "100-50", "0-10", "1-70000", "10-"] {
            assert!(
                matches!(parse_port_ranges(spec), Err(TaskSpecError::BadPortRange(_))),
                "expected {:?} to be rejected",
                spec
            );
        }
    }

    #[test]
    fn test_minimal_command_task() {
        let task = parse_task(r#"{"id": "t1", "name": "sleep", "cmd": "sleep 10"}"#).unwrap();

        assert_eq!(task.id, "t1");
        let command = task.command.unwrap();
        assert_eq!(command.value.as_deref(), Some("sleep 10"));
        assert_eq!(command.shell, Some(true));
        assert!(task.resources.is_empty());
        assert!(task.container.is_none());
        assert!(task.retry.is_none());
    }

    #[test]
    fn test_args_disable_shell() {
        let task = parse_task(
            r#"{"id": "t1", "name": "echo", "cmd": "/bin/echo", "args": ["echo", "hi"]}"#,
        )
        .unwrap();
        let command = task.command.unwrap();
        assert_eq!(command.shell, Some(false));
        assert_eq!(command.arguments, vec!["echo", "hi"]);
    }

    #[test]
    fn test_docker_image_without_cmd() {
        let task = parse_task(
            r#"{"id": "t1", "name": "nginx", "container": {"type": "docker", "image": "nginx"}}"#,
        )
        .unwrap();
        let command = task.command.unwrap();
        assert_eq!(command.value, None);
        assert_eq!(command.shell, Some(false));
        assert!(command.arguments.is_empty());
        let container = task.container.unwrap();
        assert_eq!(container.r#type, container_info::Type::Docker as i32);
        assert_eq!(container.docker.unwrap().image, "nginx");
    }

    #[test]
    fn test_docker_requires_image() {
        let err =
            parse_task(r#"{"id": "t1", "name": "x", "container": {"type": "docker"}}"#).unwrap_err();
        assert!(matches!(err, TaskSpecError::MissingField("container.image")));
    }

    #[test]
    fn test_missing_required_fields() {
        assert!(matches!(
            parse_task(r#"{"id": "", "name": "x", "cmd": "true"}"#),
            Err(TaskSpecError::MissingField("id"))
        ));
        assert!(matches!(
            parse_task(r#"{"id": "t1", "name": "x"}"#),
            Err(TaskSpecError::MissingField("cmd"))
        ));
        assert!(matches!(
            parse_task(r#"{"name": "x"}"#),
            Err(TaskSpecError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_healthcheck_validation() {
        let err = parse_task(
            r#"{"id": "t1", "name": "x", "cmd": "true", "healthcheck": {"port": 80}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, TaskSpecError::MissingHealthcheckType));

        let err = parse_task(
            r#"{"id": "t1", "name": "x", "cmd": "true", "healthcheck": {"type": "http", "port": 80}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, TaskSpecError::MissingHttpPath));
    }

    #[test]
    fn test_tcp_healthcheck() {
        let task = parse_task(
            r#"{"id": "t1", "name": "x", "cmd": "true",
                "healthcheck": {"type": "tcp", "port": 6379, "intervalSeconds": 5}}"#,
        )
        .unwrap();
        let check = task.health_check.unwrap();
        assert_eq!(check.r#type, health_check::Type::Tcp as i32);
        assert_eq!(check.tcp.unwrap().port, 6379);
        assert_eq!(check.interval_seconds, Some(5.0));
    }

    #[test]
    fn test_volume_paths_must_be_absolute() {
        let err = parse_task(
            r#"{"id": "t1", "name": "x", "container": {"type": "mesos",
                "volumes": [{"containerPath": "data", "hostPath": "/mnt/data"}]}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, TaskSpecError::VolumePath(p) if p == "data"));
    }

    #[test]
    fn test_volume_needs_both_paths() {
        let err = parse_task(
            r#"{"id": "t1", "name": "x", "container": {"type": "mesos",
                "volumes": [{"containerPath": "/data"}]}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, TaskSpecError::VolumePath(p) if p.starts_with("/data")));

        let err = parse_task(
            r#"{"id": "t1", "name": "x", "container": {"type": "mesos",
                "volumes": [{"hostPath": "/mnt/data"}]}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, TaskSpecError::VolumePath(p) if p.starts_with("/mnt/data")));

        let err = parse_task(
            r#"{"id": "t1", "name": "x", "container": {"type": "mesos",
                "volumes": [{"readOnly": true}]}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, TaskSpecError::VolumePath(_)));
    }

    #[test]
    fn test_full_definition() {
        let json = r#"{
            "id": "web-1",
            "name": "web",
            "cmd": "python3 -m http.server 8080",
            "env": {"PORT": "8080"},
            "uris": [{"uri": "https://example.com/app.tgz", "extract": true}],
            "resources": {"cpus": 0.5, "mem": 128, "ports": "31000-31001"},
            "container": {
                "type": "docker",
                "image": "python:3.12-slim",
                "network": "bridge",
                "portMappings": [{"hostPort": 31000, "containerPort": 8080, "protocol": "tcp"}],
                "volumes": [{"containerPath": "/data", "hostPath": "/mnt/data", "readOnly": true}]
            },
            "healthcheck": {"type": "http", "port": 8080, "path": "/"},
            "labels": {"team": "infra"},
            "retry": {"maxRetries": 3, "backoff": true}
        }"#;

        let task = parse_task(json).unwrap();

        assert_eq!(task.demand(CPUS), 0.5);
        assert_eq!(task.demand(MEM), 128.0);
        assert_eq!(task.resources.len(), 3);
        assert_eq!(task.resources[2].name, PORTS);

        let command = task.command.as_ref().unwrap();
        assert_eq!(command.environment.as_ref().unwrap().variables.len(), 1);
        assert_eq!(command.uris[0].extract, Some(true));

        let container = task.container.as_ref().unwrap();
        let docker = container.docker.as_ref().unwrap();
        assert_eq!(
            docker.network,
            container_info::docker_info::Network::Bridge as i32
        );
        assert_eq!(docker.port_mappings[0].container_port, 8080);
        assert_eq!(container.volumes[0].mode, volume::Mode::Ro as i32);

        assert_eq!(task.labels.as_ref().unwrap().labels[0].key, "team");

        let retry = task.retry.as_ref().unwrap();
        assert_eq!(retry.max_retries, 3);
        assert_eq!(retry.retry_time, Duration::from_secs(1));
        assert!(retry.backoff);
    }

    #[test]
    fn test_parse_tasks_array() {
        let tasks = parse_tasks(
            r#"[{"id": "a", "name": "a", "cmd": "true"}, {"id": "b", "name": "b", "cmd": "true"}]"#,
        )
        .unwrap();
        assert_eq!(tasks.len(), 2);

        let err = parse_tasks(r#"[{"id": "a", "name": "a", "cmd": "true"}, {"id": "b", "name": "b"}]"#)
            .unwrap_err();
        assert!(matches!(err, TaskSpecError::MissingField("cmd")));
    }
}
