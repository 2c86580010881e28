// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! RecordIO framing for the subscription stream.
//!
//! The master writes each event as one record:
//! - ASCII decimal length, terminated by `\n`
//! - exactly that many bytes of a protobuf `Event`
//!
//! There is no record separator beyond the length line, so `3\nABC5\nHELLO`
//! is two records.

use bytes::{BufMut, Bytes, BytesMut};
use futures::Stream;
use prost::Message;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

use crate::mesos::Event;

/// Maximum record size (64 MB)
pub const MAX_RECORD_SIZE: usize = 64 * 1024 * 1024;

/// Longest accepted length line, digits only
const MAX_LENGTH_DIGITS: usize = 20;

/// Errors that can occur while decoding the record stream
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("invalid record length: {0:?}")]
    InvalidLength(String),

    #[error("stream ended inside a record length")]
    TruncatedLength,

    #[error("stream ended inside a record: expected {expected} bytes, received {received}")]
    TruncatedRecord { expected: usize, received: usize },

    #[error("record too large: {0} bytes (max: {MAX_RECORD_SIZE})")]
    RecordTooLarge(usize),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protobuf decode error: {0}")]
    Decode(#[from] prost::DecodeError),
}

/// Frame a payload as one record.
pub fn encode_record(payload: &[u8]) -> Bytes {
    let header = payload.len().to_string();
    let mut buf = BytesMut::with_capacity(header.len() + 1 + payload.len());
    buf.put_slice(header.as_bytes());
    buf.put_u8(b'\n');
    buf.put_slice(payload);
    buf.freeze()
}

/// Encode an event and frame it as one record.
pub fn encode_event(event: &Event) -> Bytes {
    encode_record(&event.encode_to_vec())
}

/// Read one record from the stream.
///
/// Returns `Ok(None)` on a clean end of stream, i.e. before any byte of the
/// next length line.
pub async fn read_record<R: AsyncBufRead + Unpin>(
    reader: &mut R,
) -> Result<Option<Bytes>, RecordError> {
    let mut line = Vec::with_capacity(MAX_LENGTH_DIGITS + 1);
    let read = (&mut *reader)
        .take((MAX_LENGTH_DIGITS + 1) as u64)
        .read_until(b'\n', &mut line)
        .await?;

    if read == 0 {
        return Ok(None);
    }

    if line.last() != Some(&b'\n') {
        if line.len() > MAX_LENGTH_DIGITS {
            return Err(RecordError::InvalidLength(
                String::from_utf8_lossy(&line).into_owned(),
            ));
        }
        return Err(RecordError::TruncatedLength);
    }
    line.pop();

    let length = parse_length(&line)?;
    if length > MAX_RECORD_SIZE {
        return Err(RecordError::RecordTooLarge(length));
    }

    let mut payload = Vec::with_capacity(length);
    let received = (&mut *reader)
        .take(length as u64)
        .read_to_end(&mut payload)
        .await?;
    if received < length {
        return Err(RecordError::TruncatedRecord {
            expected: length,
            received,
        });
    }

    Ok(Some(Bytes::from(payload)))
}

fn parse_length(digits: &[u8]) -> Result<usize, RecordError> {
    let invalid = || RecordError::InvalidLength(String::from_utf8_lossy(digits).into_owned());

    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return Err(invalid());
    }
    std::str::from_utf8(digits)
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .ok_or_else(invalid)
}

/// Lazily decodes events from a buffered byte stream.
pub struct RecordDecoder<R> {
    reader: R,
    records: u64,
}

impl<R> RecordDecoder<R> {
    pub fn new(reader: R) -> Self {
        Self { reader, records: 0 }
    }

    /// Number of records decoded so far.
    pub fn records(&self) -> u64 {
        self.records
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: AsyncBufRead + Unpin> RecordDecoder<R> {
    /// Read and decode the next event, `Ok(None)` at end of stream.
    pub async fn next_event(&mut self) -> Result<Option<Event>, RecordError> {
        let Some(record) = read_record(&mut self.reader).await? else {
            return Ok(None);
        };
        let event = Event::decode(record)?;
        self.records += 1;
        Ok(Some(event))
    }

    /// Turn the decoder into a stream that ends after the first error.
    pub fn into_stream(self) -> impl Stream<Item = Result<Event, RecordError>> {
        futures::stream::unfold(Some(self), |state| async move {
            let mut decoder = state?;
            match decoder.next_event().await {
                Ok(Some(event)) => Some((Ok(event), Some(decoder))),
                Ok(None) => None,
                Err(e) => Some((Err(e), None)),
            }
        })
    }
}
