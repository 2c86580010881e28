// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Master client tests for tether-protocol, against a mocked master.

use tether_protocol::mesos::{Call, Event, FrameworkId, call, event};
use tether_protocol::{
    ClientError, MasterClient, MasterClientConfig, STREAM_ID_HEADER, encode_event,
    into_event_reader,
};
use wiremock::matchers::{header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_PATH: &str = "/api/v1/scheduler";

fn client_for(server: &MockServer) -> MasterClient {
    MasterClient::new(MasterClientConfig::new(server.uri())).unwrap()
}

fn subscribe_call() -> Call {
    let mut call = Call::new(call::Type::Subscribe, None);
    call.subscribe = Some(call::Subscribe::default());
    call
}

fn subscribed_body(framework_id: &str) -> Vec<u8> {
    let event = Event {
        r#type: event::Type::Subscribed as i32,
        subscribed: Some(event::Subscribed {
            framework_id: Some(FrameworkId::new(framework_id)),
            heartbeat_interval_seconds: Some(15.0),
            master_info: None,
        }),
        ..Default::default()
    };
    encode_event(&event).to_vec()
}

#[tokio::test]
async fn test_subscribe_stores_stream_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(API_PATH))
        .and(header("content-type", "application/x-protobuf"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header(STREAM_ID_HEADER, "stream-abc")
                .set_body_bytes(subscribed_body("fw-1")),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    let response = client.subscribe(&subscribe_call()).await.unwrap();

    assert_eq!(client.stream_id().as_deref(), Some("stream-abc"));

    let mut events = into_event_reader(response);
    let first = events.next_event().await.unwrap().unwrap();
    assert_eq!(first.kind(), event::Type::Subscribed);
    assert_eq!(
        first.subscribed.unwrap().framework_id.unwrap().value,
        "fw-1"
    );
    assert!(events.next_event().await.unwrap().is_none());
}

#[tokio::test]
async fn test_subscribe_without_stream_id_header() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(API_PATH))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = client.subscribe(&subscribe_call()).await;

    assert!(matches!(result, Err(ClientError::MissingStreamId)));
    assert!(client.stream_id().is_none());
}

#[tokio::test]
async fn test_subscribe_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(API_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_string("no leader"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    match client.subscribe(&subscribe_call()).await {
        Err(ClientError::Status { status, body }) => {
            assert_eq!(status.as_u16(), 503);
            assert_eq!(body, "no leader");
        }
        other => panic!("Expected Status error, got: {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn test_request_echoes_stream_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(API_PATH))
        .and(header(STREAM_ID_HEADER, "stream-xyz"))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.set_stream_id("stream-xyz".to_string());

    let call = Call::new(call::Type::Revive, Some(FrameworkId::new("fw-1")));
    let response = client.request(&call).await.unwrap();
    assert_eq!(response.status().as_u16(), 202);
}

#[tokio::test]
async fn test_request_before_subscribe_is_refused() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header_exists(STREAM_ID_HEADER))
        .respond_with(ResponseTemplate::new(202))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let call = Call::new(call::Type::Suppress, Some(FrameworkId::new("fw-1")));

    assert!(matches!(
        client.request(&call).await,
        Err(ClientError::NoStreamId)
    ));
}

#[tokio::test]
async fn test_request_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(API_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_string("Failed to validate call"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.set_stream_id("stream-1".to_string());

    let call = Call::new(call::Type::Decline, Some(FrameworkId::new("fw-1")));
    match client.request(&call).await {
        Err(ClientError::Status { status, body }) => {
            assert_eq!(status.as_u16(), 400);
            assert!(body.contains("validate"));
        }
        other => panic!("Expected Status error, got: {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn test_new_subscription_replaces_stream_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(API_PATH))
        .respond_with(ResponseTemplate::new(200).insert_header(STREAM_ID_HEADER, "stream-2"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.set_stream_id("stream-1".to_string());
    client.subscribe(&subscribe_call()).await.unwrap();

    assert_eq!(client.stream_id().as_deref(), Some("stream-2"));
}
