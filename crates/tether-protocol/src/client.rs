// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! HTTP client for the master's scheduler endpoint.

use std::io;
use std::pin::Pin;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use bytes::Bytes;
use futures::{Stream, TryStreamExt};
use prost::Message;
use reqwest::header::{ACCEPT, CONNECTION, CONTENT_TYPE};
use reqwest::{Response, Url};
use thiserror::Error;
use tokio_util::io::StreamReader;
use tracing::{debug, info, instrument, warn};

use crate::mesos::Call;
use crate::recordio::RecordDecoder;

/// Header carrying the subscription's stream identifier.
pub const STREAM_ID_HEADER: &str = "Mesos-Stream-Id";

/// Content type of every call and of the event stream.
pub const PROTOBUF_CONTENT_TYPE: &str = "application/x-protobuf";

/// Errors that can occur when talking to the master
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("master returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("subscribe response carried no {STREAM_ID_HEADER} header")]
    MissingStreamId,

    #[error("no active subscription (stream id not set)")]
    NoStreamId,

    #[error("invalid master endpoint: {0}")]
    InvalidEndpoint(String),
}

/// Configuration for the master client
#[derive(Debug, Clone)]
pub struct MasterClientConfig {
    /// Base URL of the master, e.g. `http://127.0.0.1:5050`
    pub endpoint: String,
    /// Scheduler API path appended to the endpoint
    pub api_path: String,
    /// Connection timeout in milliseconds
    pub connect_timeout_ms: u64,
    /// Timeout for unary calls in milliseconds (0 = none). Never applied to subscribe.
    pub request_timeout_ms: u64,
}

impl Default for MasterClientConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:5050".to_string(),
            api_path: "/api/v1/scheduler".to_string(),
            connect_timeout_ms: 10_000,
            request_timeout_ms: 0,
        }
    }
}

impl MasterClientConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }
}

/// Byte reader over a subscription response body.
pub type EventStreamReader =
    StreamReader<Pin<Box<dyn Stream<Item = io::Result<Bytes>> + Send>>, Bytes>;

/// HTTP client for the scheduler API.
///
/// Holds the stream id handed out by the last successful subscribe and
/// attaches it to every other call.
pub struct MasterClient {
    http: reqwest::Client,
    url: Url,
    stream_id: RwLock<Option<String>>,
    config: MasterClientConfig,
}

impl MasterClient {
    /// Create a new client with the given configuration
    pub fn new(config: MasterClientConfig) -> Result<Self, ClientError> {
        let base = Url::parse(&config.endpoint)
            .map_err(|e| ClientError::InvalidEndpoint(format!("{}: {}", config.endpoint, e)))?;
        let url = base
            .join(&config.api_path)
            .map_err(|e| ClientError::InvalidEndpoint(format!("{}: {}", config.api_path, e)))?;

        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .build()?;

        Ok(Self {
            http,
            url,
            stream_id: RwLock::new(None),
            config,
        })
    }

    /// Create a client for a master on localhost
    pub fn localhost() -> Result<Self, ClientError> {
        Self::new(MasterClientConfig::default())
    }

    /// Full URL calls are posted to.
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn config(&self) -> &MasterClientConfig {
        &self.config
    }

    /// Stream id of the current subscription, if any.
    pub fn stream_id(&self) -> Option<String> {
        self.stream_id
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_stream_id(&self, id: String) {
        *self.stream_id.write().unwrap_or_else(PoisonError::into_inner) = Some(id);
    }

    pub fn clear_stream_id(&self) {
        *self.stream_id.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Open the subscription.
    ///
    /// On success the stream id from the response header is stored and the
    /// response is returned with its body unread.
    #[instrument(skip(self, call), fields(url = %self.url))]
    pub async fn subscribe(&self, call: &Call) -> Result<Response, ClientError> {
        let response = self
            .http
            .post(self.url.clone())
            .header(CONTENT_TYPE, PROTOBUF_CONTENT_TYPE)
            .header(ACCEPT, PROTOBUF_CONTENT_TYPE)
            .header(CONNECTION, "keep-alive")
            .body(call.encode_to_vec())
            .send()
            .await?;

        let response = check_status(response).await?;

        let stream_id = response
            .headers()
            .get(STREAM_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .ok_or(ClientError::MissingStreamId)?;

        info!(stream_id = %stream_id, "Subscribed to master");
        self.set_stream_id(stream_id);
        Ok(response)
    }

    /// Issue a unary call on the current subscription.
    #[instrument(skip(self, call), fields(call_type = ?call.kind()))]
    pub async fn request(&self, call: &Call) -> Result<Response, ClientError> {
        let stream_id = self.stream_id().ok_or(ClientError::NoStreamId)?;

        let mut builder = self
            .http
            .post(self.url.clone())
            .header(CONTENT_TYPE, PROTOBUF_CONTENT_TYPE)
            .header(STREAM_ID_HEADER, stream_id)
            .body(call.encode_to_vec());
        if self.config.request_timeout_ms > 0 {
            builder = builder.timeout(Duration::from_millis(self.config.request_timeout_ms));
        }

        let response = check_status(builder.send().await?).await?;
        debug!(status = %response.status(), "Call accepted");
        Ok(response)
    }
}

async fn check_status(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    warn!(status = %status, body = %body, "Master rejected call");
    Err(ClientError::Status { status, body })
}

/// Adapt a subscription response body into an event decoder.
pub fn into_event_reader(response: Response) -> RecordDecoder<EventStreamReader> {
    let body: Pin<Box<dyn Stream<Item = io::Result<Bytes>> + Send>> =
        Box::pin(response.bytes_stream().map_err(io::Error::other));
    RecordDecoder::new(StreamReader::new(body))
}
