// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Typed view of subscription events.

use std::time::Duration;

use tether_protocol::mesos::{
    Event, FrameworkId, InverseOffer, MasterInfo, Offer, OfferId, TaskStatus, event,
};

/// One event from the master, with its payload unpacked.
#[derive(Debug, Clone, PartialEq)]
pub enum SchedulerEvent {
    Subscribed {
        framework_id: FrameworkId,
        heartbeat_interval: Option<Duration>,
        master_info: Option<MasterInfo>,
    },
    Offers(Vec<Offer>),
    InverseOffers(Vec<InverseOffer>),
    Rescind(OfferId),
    RescindInverseOffer(OfferId),
    Update(TaskStatus),
    Message(event::Message),
    Failure(event::Failure),
    Error(String),
    Heartbeat,
    /// Unrecognized type, or a type whose payload was missing
    Unknown(i32),
}

impl SchedulerEvent {
    /// Wire name of the event kind, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            SchedulerEvent::Subscribed { .. } => "SUBSCRIBED",
            SchedulerEvent::Offers(_) => "OFFERS",
            SchedulerEvent::InverseOffers(_) => "INVERSE_OFFERS",
            SchedulerEvent::Rescind(_) => "RESCIND",
            SchedulerEvent::RescindInverseOffer(_) => "RESCIND_INVERSE_OFFER",
            SchedulerEvent::Update(_) => "UPDATE",
            SchedulerEvent::Message(_) => "MESSAGE",
            SchedulerEvent::Failure(_) => "FAILURE",
            SchedulerEvent::Error(_) => "ERROR",
            SchedulerEvent::Heartbeat => "HEARTBEAT",
            SchedulerEvent::Unknown(_) => "UNKNOWN",
        }
    }
}

impl From<Event> for SchedulerEvent {
    fn from(e: Event) -> Self {
        let unknown = SchedulerEvent::Unknown(e.r#type);
        match e.kind() {
            event::Type::Subscribed => e
                .subscribed
                .and_then(|s| {
                    let framework_id = s.framework_id?;
                    Some(SchedulerEvent::Subscribed {
                        framework_id,
                        heartbeat_interval: s
                            .heartbeat_interval_seconds
                            .filter(|secs| secs.is_finite() && *secs > 0.0)
                            .map(Duration::from_secs_f64),
                        master_info: s.master_info,
                    })
                })
                .unwrap_or(unknown),
            event::Type::Offers => e
                .offers
                .map(|o| SchedulerEvent::Offers(o.offers))
                .unwrap_or(unknown),
            event::Type::InverseOffers => e
                .inverse_offers
                .map(|o| SchedulerEvent::InverseOffers(o.inverse_offers))
                .unwrap_or(unknown),
            event::Type::Rescind => e
                .rescind
                .and_then(|r| r.offer_id)
                .map(SchedulerEvent::Rescind)
                .unwrap_or(unknown),
            event::Type::RescindInverseOffer => e
                .rescind_inverse_offer
                .and_then(|r| r.inverse_offer_id)
                .map(SchedulerEvent::RescindInverseOffer)
                .unwrap_or(unknown),
            event::Type::Update => e
                .update
                .and_then(|u| u.status)
                .map(SchedulerEvent::Update)
                .unwrap_or(unknown),
            event::Type::Message => e.message.map(SchedulerEvent::Message).unwrap_or(unknown),
            event::Type::Failure => e.failure.map(SchedulerEvent::Failure).unwrap_or(unknown),
            event::Type::Error => e
                .error
                .map(|err| SchedulerEvent::Error(err.message))
                .unwrap_or(unknown),
            event::Type::Heartbeat => SchedulerEvent::Heartbeat,
            event::Type::Unknown => unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event_of(kind: event::Type) -> Event {
        Event {
            r#type: kind as i32,
            ..Default::default()
        }
    }

    #[test]
    fn test_subscribed_conversion() {
        let mut e = event_of(event::Type::Subscribed);
        e.subscribed = Some(event::Subscribed {
            framework_id: Some(FrameworkId::new("F42")),
            heartbeat_interval_seconds: Some(15.0),
            master_info: None,
        });

        match SchedulerEvent::from(e) {
            SchedulerEvent::Subscribed {
                framework_id,
                heartbeat_interval,
                ..
            } => {
                assert_eq!(framework_id.value, "F42");
                assert_eq!(heartbeat_interval, Some(Duration::from_secs(15)));
            }
            other => panic!("Expected Subscribed, got: {:?}", other),
        }
    }

    #[test]
    fn test_missing_payload_is_unknown() {
        let converted = SchedulerEvent::from(event_of(event::Type::Offers));
        assert_eq!(converted, SchedulerEvent::Unknown(event::Type::Offers as i32));

        let mut e = event_of(event::Type::Subscribed);
        e.subscribed = Some(event::Subscribed::default());
        assert_eq!(SchedulerEvent::from(e).name(), "UNKNOWN");
    }

    #[test]
    fn test_heartbeat_needs_no_payload() {
        assert_eq!(
            SchedulerEvent::from(event_of(event::Type::Heartbeat)),
            SchedulerEvent::Heartbeat
        );
    }

    #[test]
    fn test_unrecognized_type() {
        let e = Event {
            r#type: 77,
            ..Default::default()
        };
        assert_eq!(SchedulerEvent::from(e), SchedulerEvent::Unknown(77));
    }

    #[test]
    fn test_error_conversion() {
        let mut e = event_of(event::Type::Error);
        e.error = Some(event::Error {
            message: "Framework has been removed".to_string(),
        });
        assert_eq!(
            SchedulerEvent::from(e),
            SchedulerEvent::Error("Framework has been removed".to_string())
        );
    }

    #[test]
    fn test_rescind_conversion() {
        let mut e = event_of(event::Type::Rescind);
        e.rescind = Some(event::Rescind {
            offer_id: Some(OfferId::new("o1")),
        });
        assert_eq!(
            SchedulerEvent::from(e),
            SchedulerEvent::Rescind(OfferId::new("o1"))
        );
    }
}
