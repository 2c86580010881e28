// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Tether Protocol - scheduler API wire layer
//!
//! This crate provides everything needed to talk to a Mesos-style master over
//! its HTTP scheduler API:
//! - Protobuf message definitions for calls and events (`mesos`)
//! - RecordIO decoding of the subscription stream (`recordio`)
//! - An HTTP client that tracks the subscription's stream id (`client`)
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    tether-protocol                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Calls: POST /api/v1/scheduler (+ Mesos-Stream-Id)          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Events: RecordIO framed stream on the SUBSCRIBE response   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Serialization: Protobuf (prost)                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Transport: HTTP/1.1 keep-alive (reqwest)                   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use tether_protocol::mesos::{call, Call, FrameworkInfo};
//! use tether_protocol::{MasterClient, into_event_reader};
//!
//! let client = MasterClient::localhost()?;
//!
//! let mut subscribe = Call::new(call::Type::Subscribe, None);
//! subscribe.subscribe = Some(call::Subscribe {
//!     framework_info: Some(FrameworkInfo {
//!         user: "root".to_string(),
//!         name: "my-framework".to_string(),
//!         ..Default::default()
//!     }),
//! });
//!
//! let response = client.subscribe(&subscribe).await?;
//! let mut events = into_event_reader(response);
//! while let Some(event) = events.next_event().await? {
//!     println!("{:?}", event.kind());
//! }
//! ```

pub mod client;
pub mod mesos;
pub mod recordio;

// Re-export main types
pub use client::{
    ClientError, EventStreamReader, MasterClient, MasterClientConfig, STREAM_ID_HEADER,
    into_event_reader,
};
pub use recordio::{
    MAX_RECORD_SIZE, RecordDecoder, RecordError, encode_event, encode_record, read_record,
};
