// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! SDK-specific error types.

use tether_protocol::ClientError;
use thiserror::Error;

use crate::persistence::StoreError;
use crate::resources::ResourceError;
use crate::task_spec::TaskSpecError;
use crate::tasks::TaskError;

/// Errors that can occur in the SDK.
#[derive(Debug, Error)]
pub enum SdkError {
    /// Configuration error (missing or invalid environment variable)
    #[error("configuration error: {0}")]
    Config(String),

    /// Call to the master failed
    #[error("master call failed: {0}")]
    Client(#[from] ClientError),

    #[error(transparent)]
    Resource(#[from] ResourceError),

    #[error(transparent)]
    Task(#[from] TaskError),

    /// Invalid task definition
    #[error("invalid task definition: {0}")]
    TaskSpec(#[from] TaskSpecError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Type alias for SDK results.
pub type Result<T> = std::result::Result<T, SdkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversions() {
        let err: SdkError = ClientError::NoStreamId.into();
        assert!(matches!(err, SdkError::Client(ClientError::NoStreamId)));

        let err: SdkError = ResourceError::NoSuitableOffer.into();
        assert_eq!(err.to_string(), "no suitable offer");

        let err: SdkError = TaskError::NotFound("t1".to_string()).into();
        assert_eq!(err.to_string(), "task not found: t1");
    }

    #[test]
    fn test_config_error_display() {
        let err = SdkError::Config("TETHER_MASTER_URL is invalid".to_string());
        assert!(err.to_string().starts_with("configuration error"));
    }
}
