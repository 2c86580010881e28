// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! HTTP routes.

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use thiserror::Error;
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Route serving the executor binary.
pub const EXECUTOR_ROUTE: &str = "/executor";

/// `Strict-Transport-Security` value sent on every TLS response.
pub const HSTS_VALUE: &str = "max-age=63072000; includeSubDomains";

#[derive(Debug, Clone)]
struct AppState {
    executor_path: Arc<PathBuf>,
}

/// Errors returned by route handlers
#[derive(Debug, Error)]
enum ApiError {
    #[error("executor binary not found")]
    NotFound,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to build response: {0}")]
    Http(#[from] axum::http::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Io(_) | ApiError::Http(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}

/// Build the router.
///
/// With `tls` set every response, including errors, carries the HSTS header.
pub fn router(executor_path: PathBuf, tls: bool) -> Router {
    let state = AppState {
        executor_path: Arc::new(executor_path),
    };

    let router = Router::new()
        .route(EXECUTOR_ROUTE, get(serve_executor))
        .fallback(not_found)
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if tls {
        router.layer(SetResponseHeaderLayer::overriding(
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static(HSTS_VALUE),
        ))
    } else {
        router
    }
}

async fn serve_executor(State(state): State<AppState>) -> Result<Response, ApiError> {
    let path = state.executor_path.as_path();
    let file = match File::open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "Executor binary missing");
            return Err(ApiError::NotFound);
        }
        Err(e) => {
            error!(path = %path.display(), error = %e, "Failed to open executor binary");
            return Err(e.into());
        }
    };
    let size = file.metadata().await?.len();

    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "executor".to_string());

    info!(path = %path.display(), size, "Serving executor binary");

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(header::CONTENT_LENGTH, size)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        )
        .body(Body::from_stream(ReaderStream::new(file)))?;
    Ok(response)
}

async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}
