// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Executor server tests: router behavior and served connections.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use tempfile::TempDir;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tower::ServiceExt;

use tether_executor_server::{
    EXECUTOR_ROUTE, ExecutorServer, ExecutorServerConfig, HSTS_VALUE, router,
};

const EXECUTOR_BYTES: &[u8] = b"#!/bin/sh\necho tether-executor\n";

fn executor_file(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("tether-executor");
    std::fs::write(&path, EXECUTOR_BYTES).unwrap();
    path
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

/// Write a self-signed certificate for `localhost`; returns the certificate DER.
fn write_self_signed(dir: &Path) -> rustls::pki_types::CertificateDer<'static> {
    let cert = rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
    std::fs::write(dir.join("cert.pem"), cert.cert.pem()).unwrap();
    std::fs::write(dir.join("key.pem"), cert.key_pair.serialize_pem()).unwrap();
    cert.cert.der().clone()
}

fn tls_connector(
    cert_der: rustls::pki_types::CertificateDer<'static>,
) -> tokio_rustls::TlsConnector {
    let mut roots = rustls::RootCertStore::empty();
    roots.add(cert_der).unwrap();
    let client_config = rustls::ClientConfig::builder_with_provider(Arc::new(
        rustls::crypto::ring::default_provider(),
    ))
    .with_safe_default_protocol_versions()
    .unwrap()
    .with_root_certificates(roots)
    .with_no_client_auth();
    tokio_rustls::TlsConnector::from(Arc::new(client_config))
}

/// GET `uri` over TLS, trusting `cert_der`.
async fn tls_get(
    addr: SocketAddr,
    cert_der: rustls::pki_types::CertificateDer<'static>,
    uri: &str,
) -> String {
    let tcp = TcpStream::connect(addr).await.unwrap();
    let server_name = rustls::pki_types::ServerName::try_from("localhost").unwrap();
    let tls = tls_connector(cert_der)
        .connect(server_name, tcp)
        .await
        .unwrap();
    raw_get(tls, uri).await
}

/// Bind on an ephemeral port and run until the returned sender fires.
async fn start(config: ExecutorServerConfig) -> (SocketAddr, oneshot::Sender<()>) {
    let server = ExecutorServer::bind(config.with_bind_addr("127.0.0.1:0".parse().unwrap()))
        .await
        .unwrap();
    let addr = server.local_addr().unwrap();
    let (tx, rx) = oneshot::channel::<()>();
    tokio::spawn(server.run(async move {
        rx.await.ok();
    }));
    (addr, tx)
}

/// Send a raw HTTP/1.1 GET and return the whole response as text.
async fn raw_get<S>(mut stream: S, uri: &str) -> String
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let request = format!(
        "GET {} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
        uri
    );
    if stream.write_all(request.as_bytes()).await.is_err() {
        return String::new();
    }

    let mut response = Vec::new();
    // A peer closing without close_notify still leaves the full response read
    let _ = stream.read_to_end(&mut response).await;
    String::from_utf8_lossy(&response).into_owned()
}

// ========== Router Tests ==========

#[tokio::test]
async fn test_serves_executor_binary() {
    let dir = TempDir::new().unwrap();
    let app = router(executor_file(&dir), false);

    let response = app.oneshot(get(EXECUTOR_ROUTE)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/octet-stream"
    );
    assert_eq!(
        response.headers()[header::CONTENT_LENGTH],
        EXECUTOR_BYTES.len().to_string().as_str()
    );
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"tether-executor\""
    );
    assert!(
        response
            .headers()
            .get(header::STRICT_TRANSPORT_SECURITY)
            .is_none()
    );

    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], EXECUTOR_BYTES);
}

#[tokio::test]
async fn test_tls_router_sets_hsts_on_every_response() {
    let dir = TempDir::new().unwrap();
    let app = router(executor_file(&dir), true);

    let ok = app.clone().oneshot(get(EXECUTOR_ROUTE)).await.unwrap();
    assert_eq!(ok.status(), StatusCode::OK);
    assert_eq!(ok.headers()[header::STRICT_TRANSPORT_SECURITY], HSTS_VALUE);

    let missing = app.oneshot(get("/nothing-here")).await.unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        missing.headers()[header::STRICT_TRANSPORT_SECURITY],
        HSTS_VALUE
    );
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let dir = TempDir::new().unwrap();
    let app = router(executor_file(&dir), false);

    let response = app.oneshot(get("/executor/extra")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ========== Server Tests ==========

#[tokio::test]
async fn test_plain_http_server() {
    let dir = TempDir::new().unwrap();
    let (addr, stop) = start(ExecutorServerConfig::new(executor_file(&dir))).await;

    let stream = TcpStream::connect(addr).await.unwrap();
    let response = raw_get(stream, EXECUTOR_ROUTE).await;

    assert!(response.starts_with("HTTP/1.1 200"), "{}", response);
    assert!(response.ends_with(std::str::from_utf8(EXECUTOR_BYTES).unwrap()));
    assert!(
        !response
            .to_ascii_lowercase()
            .contains("strict-transport-security")
    );

    stop.send(()).ok();
}

#[tokio::test]
async fn test_tls_server() {
    let dir = TempDir::new().unwrap();
    let cert_der = write_self_signed(dir.path());
    let config = ExecutorServerConfig::new(executor_file(&dir))
        .with_tls(dir.path().join("cert.pem"), dir.path().join("key.pem"));
    let (addr, stop) = start(config).await;

    let response = tls_get(addr, cert_der, EXECUTOR_ROUTE).await;
    assert!(response.starts_with("HTTP/1.1 200"), "{}", response);
    assert!(response.ends_with(std::str::from_utf8(EXECUTOR_BYTES).unwrap()));
    assert!(
        response
            .to_ascii_lowercase()
            .contains(&format!(
                "strict-transport-security: {}",
                HSTS_VALUE.to_ascii_lowercase()
            ))
    );

    stop.send(()).ok();
}

#[tokio::test]
async fn test_tls_server_survives_failed_handshake() {
    let dir = TempDir::new().unwrap();
    let cert_der = write_self_signed(dir.path());
    let config = ExecutorServerConfig::new(executor_file(&dir))
        .with_tls(dir.path().join("cert.pem"), dir.path().join("key.pem"));
    let (addr, stop) = start(config).await;

    // Plain HTTP against the TLS port fails the handshake
    let stream = TcpStream::connect(addr).await.unwrap();
    let response = raw_get(stream, EXECUTOR_ROUTE).await;
    assert!(!response.starts_with("HTTP/1.1 200"));

    // The listener keeps serving afterwards
    let response = tls_get(addr, cert_der, EXECUTOR_ROUTE).await;
    assert!(response.starts_with("HTTP/1.1 200"), "{}", response);

    stop.send(()).ok();
}

#[tokio::test]
async fn test_bind_fails_on_bad_tls_material() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("cert.pem"), "not a certificate").unwrap();
    std::fs::write(dir.path().join("key.pem"), "not a key").unwrap();
    let config = ExecutorServerConfig::new(executor_file(&dir))
        .with_bind_addr("127.0.0.1:0".parse().unwrap())
        .with_tls(dir.path().join("cert.pem"), dir.path().join("key.pem"));

    assert!(ExecutorServer::bind(config).await.is_err());
}
