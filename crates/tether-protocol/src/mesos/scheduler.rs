// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Scheduler API envelopes: outgoing [`Call`] and incoming [`Event`].

use prost::alloc::string::String;
use prost::alloc::vec::Vec;

use super::{
    AgentId, ExecutorId, Filters, FrameworkId, FrameworkInfo, InverseOffer, KillPolicy,
    MasterInfo, Offer, OfferId, Request, TaskId, TaskStatus, offer,
};

/// A request from the framework to the master.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Call {
    #[prost(message, optional, tag = "1")]
    pub framework_id: Option<FrameworkId>,
    #[prost(enumeration = "call::Type", tag = "2")]
    pub r#type: i32,
    #[prost(message, optional, tag = "3")]
    pub subscribe: Option<call::Subscribe>,
    #[prost(message, optional, tag = "4")]
    pub accept: Option<call::Accept>,
    #[prost(message, optional, tag = "5")]
    pub decline: Option<call::Decline>,
    #[prost(message, optional, tag = "6")]
    pub kill: Option<call::Kill>,
    #[prost(message, optional, tag = "7")]
    pub shutdown: Option<call::Shutdown>,
    #[prost(message, optional, tag = "8")]
    pub acknowledge: Option<call::Acknowledge>,
    #[prost(message, optional, tag = "9")]
    pub reconcile: Option<call::Reconcile>,
    #[prost(message, optional, tag = "10")]
    pub message: Option<call::Message>,
    #[prost(message, optional, tag = "11")]
    pub request: Option<call::Request>,
    #[prost(message, optional, tag = "15")]
    pub revive: Option<call::Revive>,
    #[prost(message, optional, tag = "16")]
    pub suppress: Option<call::Suppress>,
}

impl Call {
    /// An empty call of the given kind carrying the framework id.
    pub fn new(kind: call::Type, framework_id: Option<FrameworkId>) -> Self {
        Self {
            framework_id,
            r#type: kind as i32,
            ..Default::default()
        }
    }

    /// Decoded call kind; unknown wire values map to `Unknown`.
    pub fn kind(&self) -> call::Type {
        call::Type::try_from(self.r#type).unwrap_or(call::Type::Unknown)
    }
}

pub mod call {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum Type {
        Unknown = 0,
        Subscribe = 1,
        Teardown = 2,
        Accept = 3,
        Decline = 4,
        Revive = 5,
        Kill = 6,
        Shutdown = 7,
        Acknowledge = 8,
        Reconcile = 9,
        Message = 10,
        Request = 11,
        Suppress = 12,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Subscribe {
        #[prost(message, optional, tag = "1")]
        pub framework_info: Option<FrameworkInfo>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Accept {
        #[prost(message, repeated, tag = "1")]
        pub offer_ids: Vec<OfferId>,
        #[prost(message, repeated, tag = "2")]
        pub operations: Vec<offer::Operation>,
        #[prost(message, optional, tag = "3")]
        pub filters: Option<Filters>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Decline {
        #[prost(message, repeated, tag = "1")]
        pub offer_ids: Vec<OfferId>,
        #[prost(message, optional, tag = "2")]
        pub filters: Option<Filters>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Revive {
        #[prost(string, repeated, tag = "1")]
        pub roles: Vec<String>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Suppress {
        #[prost(string, repeated, tag = "1")]
        pub roles: Vec<String>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Kill {
        #[prost(message, optional, tag = "1")]
        pub task_id: Option<TaskId>,
        #[prost(message, optional, tag = "2")]
        pub agent_id: Option<AgentId>,
        #[prost(message, optional, tag = "3")]
        pub kill_policy: Option<KillPolicy>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Shutdown {
        #[prost(message, optional, tag = "1")]
        pub executor_id: Option<ExecutorId>,
        #[prost(message, optional, tag = "2")]
        pub agent_id: Option<AgentId>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Acknowledge {
        #[prost(message, optional, tag = "1")]
        pub agent_id: Option<AgentId>,
        #[prost(message, optional, tag = "2")]
        pub task_id: Option<TaskId>,
        #[prost(bytes = "vec", tag = "3")]
        pub uuid: Vec<u8>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Reconcile {
        #[prost(message, repeated, tag = "1")]
        pub tasks: Vec<reconcile::Task>,
    }

    pub mod reconcile {
        use super::super::*;

        #[derive(Clone, PartialEq, ::prost::Message)]
        pub struct Task {
            #[prost(message, optional, tag = "1")]
            pub task_id: Option<TaskId>,
            #[prost(message, optional, tag = "2")]
            pub agent_id: Option<AgentId>,
        }
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Message {
        #[prost(message, optional, tag = "1")]
        pub agent_id: Option<AgentId>,
        #[prost(message, optional, tag = "2")]
        pub executor_id: Option<ExecutorId>,
        #[prost(bytes = "vec", tag = "3")]
        pub data: Vec<u8>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Request {
        #[prost(message, repeated, tag = "1")]
        pub requests: Vec<super::Request>,
    }
}

/// A message from the master on the subscription stream.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Event {
    #[prost(enumeration = "event::Type", tag = "1")]
    pub r#type: i32,
    #[prost(message, optional, tag = "2")]
    pub subscribed: Option<event::Subscribed>,
    #[prost(message, optional, tag = "3")]
    pub offers: Option<event::Offers>,
    #[prost(message, optional, tag = "4")]
    pub rescind: Option<event::Rescind>,
    #[prost(message, optional, tag = "5")]
    pub update: Option<event::Update>,
    #[prost(message, optional, tag = "6")]
    pub message: Option<event::Message>,
    #[prost(message, optional, tag = "7")]
    pub failure: Option<event::Failure>,
    #[prost(message, optional, tag = "8")]
    pub error: Option<event::Error>,
    #[prost(message, optional, tag = "9")]
    pub inverse_offers: Option<event::InverseOffers>,
    #[prost(message, optional, tag = "10")]
    pub rescind_inverse_offer: Option<event::RescindInverseOffer>,
}

impl Event {
    /// Decoded event kind; unknown wire values map to `Unknown`.
    pub fn kind(&self) -> event::Type {
        event::Type::try_from(self.r#type).unwrap_or(event::Type::Unknown)
    }
}

pub mod event {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum Type {
        Unknown = 0,
        Subscribed = 1,
        Offers = 2,
        Rescind = 3,
        Update = 4,
        Message = 5,
        Failure = 6,
        Error = 7,
        Heartbeat = 8,
        InverseOffers = 9,
        RescindInverseOffer = 10,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Subscribed {
        #[prost(message, optional, tag = "1")]
        pub framework_id: Option<FrameworkId>,
        #[prost(double, optional, tag = "2")]
        pub heartbeat_interval_seconds: Option<f64>,
        #[prost(message, optional, tag = "3")]
        pub master_info: Option<MasterInfo>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Offers {
        #[prost(message, repeated, tag = "1")]
        pub offers: Vec<Offer>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct InverseOffers {
        #[prost(message, repeated, tag = "1")]
        pub inverse_offers: Vec<InverseOffer>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Rescind {
        #[prost(message, optional, tag = "1")]
        pub offer_id: Option<OfferId>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct RescindInverseOffer {
        #[prost(message, optional, tag = "1")]
        pub inverse_offer_id: Option<OfferId>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Update {
        #[prost(message, optional, tag = "1")]
        pub status: Option<TaskStatus>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Message {
        #[prost(message, optional, tag = "1")]
        pub agent_id: Option<AgentId>,
        #[prost(message, optional, tag = "2")]
        pub executor_id: Option<ExecutorId>,
        #[prost(bytes = "vec", tag = "3")]
        pub data: Vec<u8>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Failure {
        #[prost(message, optional, tag = "1")]
        pub agent_id: Option<AgentId>,
        #[prost(message, optional, tag = "2")]
        pub executor_id: Option<ExecutorId>,
        #[prost(int32, optional, tag = "3")]
        pub status: Option<i32>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Error {
        #[prost(string, tag = "1")]
        pub message: String,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message as _;

    #[test]
    fn test_call_kind() {
        let call = Call::new(call::Type::Revive, Some(FrameworkId::new("fw-1")));
        assert_eq!(call.kind(), call::Type::Revive);
        assert_eq!(call.framework_id.unwrap().value, "fw-1");
    }

    #[test]
    fn test_call_revive_suppress_tags() {
        // revive and suppress sit at tags 15 and 16, past the gap in the schema
        let call = Call {
            revive: Some(call::Revive::default()),
            ..Call::new(call::Type::Revive, None)
        };
        let bytes = call.encode_to_vec();
        assert_eq!(bytes, vec![0x10, 0x05, 0x7a, 0x00]);
    }

    #[test]
    fn test_unknown_event_kind() {
        let event = Event {
            r#type: 42,
            ..Default::default()
        };
        assert_eq!(event.kind(), event::Type::Unknown);
    }

    #[test]
    fn test_event_decode() {
        let event = Event {
            r#type: event::Type::Error as i32,
            error: Some(event::Error {
                message: "framework removed".to_string(),
            }),
            ..Default::default()
        };
        let decoded = Event::decode(event.encode_to_vec().as_slice()).unwrap();
        assert_eq!(decoded.kind(), event::Type::Error);
        assert_eq!(decoded.error.unwrap().message, "framework removed");
    }
}
