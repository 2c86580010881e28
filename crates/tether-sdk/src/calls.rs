// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Call building utilities.

use tether_protocol::mesos::{
    AgentId, Call, ExecutorId, Filters, FrameworkId, FrameworkInfo, OfferId, Request, TaskId,
    call, offer,
};

/// Build a SUBSCRIBE call; the framework id is taken from the info itself.
pub(crate) fn build_subscribe(info: &FrameworkInfo) -> Call {
    Call {
        subscribe: Some(call::Subscribe {
            framework_info: Some(info.clone()),
        }),
        ..Call::new(call::Type::Subscribe, info.id.clone())
    }
}

pub(crate) fn build_teardown(framework_id: Option<FrameworkId>) -> Call {
    Call::new(call::Type::Teardown, framework_id)
}

pub(crate) fn build_accept(
    framework_id: Option<FrameworkId>,
    offer_ids: Vec<OfferId>,
    operations: Vec<offer::Operation>,
    filters: Option<Filters>,
) -> Call {
    Call {
        accept: Some(call::Accept {
            offer_ids,
            operations,
            filters,
        }),
        ..Call::new(call::Type::Accept, framework_id)
    }
}

pub(crate) fn build_decline(
    framework_id: Option<FrameworkId>,
    offer_ids: Vec<OfferId>,
    filters: Option<Filters>,
) -> Call {
    Call {
        decline: Some(call::Decline { offer_ids, filters }),
        ..Call::new(call::Type::Decline, framework_id)
    }
}

pub(crate) fn build_revive(framework_id: Option<FrameworkId>) -> Call {
    Call {
        revive: Some(call::Revive::default()),
        ..Call::new(call::Type::Revive, framework_id)
    }
}

pub(crate) fn build_suppress(framework_id: Option<FrameworkId>) -> Call {
    Call {
        suppress: Some(call::Suppress::default()),
        ..Call::new(call::Type::Suppress, framework_id)
    }
}

pub(crate) fn build_kill(
    framework_id: Option<FrameworkId>,
    task_id: TaskId,
    agent_id: Option<AgentId>,
) -> Call {
    Call {
        kill: Some(call::Kill {
            task_id: Some(task_id),
            agent_id,
            kill_policy: None,
        }),
        ..Call::new(call::Type::Kill, framework_id)
    }
}

pub(crate) fn build_shutdown(
    framework_id: Option<FrameworkId>,
    executor_id: ExecutorId,
    agent_id: AgentId,
) -> Call {
    Call {
        shutdown: Some(call::Shutdown {
            executor_id: Some(executor_id),
            agent_id: Some(agent_id),
        }),
        ..Call::new(call::Type::Shutdown, framework_id)
    }
}

pub(crate) fn build_acknowledge(
    framework_id: Option<FrameworkId>,
    agent_id: AgentId,
    task_id: TaskId,
    uuid: Vec<u8>,
) -> Call {
    Call {
        acknowledge: Some(call::Acknowledge {
            agent_id: Some(agent_id),
            task_id: Some(task_id),
            uuid,
        }),
        ..Call::new(call::Type::Acknowledge, framework_id)
    }
}

/// Build a RECONCILE call. An empty task list asks for every known task.
pub(crate) fn build_reconcile(
    framework_id: Option<FrameworkId>,
    tasks: Vec<(TaskId, Option<AgentId>)>,
) -> Call {
    Call {
        reconcile: Some(call::Reconcile {
            tasks: tasks
                .into_iter()
                .map(|(task_id, agent_id)| call::reconcile::Task {
                    task_id: Some(task_id),
                    agent_id,
                })
                .collect(),
        }),
        ..Call::new(call::Type::Reconcile, framework_id)
    }
}

pub(crate) fn build_message(
    framework_id: Option<FrameworkId>,
    agent_id: AgentId,
    executor_id: ExecutorId,
    data: Vec<u8>,
) -> Call {
    Call {
        message: Some(call::Message {
            agent_id: Some(agent_id),
            executor_id: Some(executor_id),
            data,
        }),
        ..Call::new(call::Type::Message, framework_id)
    }
}

pub(crate) fn build_request(framework_id: Option<FrameworkId>, requests: Vec<Request>) -> Call {
    Call {
        request: Some(call::Request { requests }),
        ..Call::new(call::Type::Request, framework_id)
    }
}
