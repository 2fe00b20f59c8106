// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HTTP(S) listener with graceful shutdown.

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use axum_server::{tls_rustls::RustlsConfig, Handle};
use tokio::task::JoinHandle;

use crate::config::TlsPaths;

/// How long in-flight requests may take to finish once shutdown starts.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

/// Serve `app` on `addr` until `handle` is shut down.
///
/// With `tls` set the certificate chain and key are loaded from PEM files and
/// the listener speaks HTTPS.
pub async fn serve(app: Router, addr: SocketAddr, tls: Option<&TlsPaths>, handle: Handle<SocketAddr>) -> std::io::Result<()> {
    match tls {
        Some(tls) => {
            let tls_config = RustlsConfig::from_pem_file(&tls.cert, &tls.key).await?;
            axum_server::bind_rustls(addr, tls_config)
                .handle(handle)
                .serve(app.into_make_service())
                .await
        }
        None => {
            axum_server::bind(addr)
                .handle(handle)
                .serve(app.into_make_service())
                .await
        }
    }
}

/// Stop accepting once `signal` resolves; open connections get `grace` to finish.
pub fn shutdown_on<F>(handle: Handle<SocketAddr>, signal: F, grace: Duration) -> JoinHandle<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        signal.await;
        tracing::info!(grace_secs = grace.as_secs(), "Shutdown requested, draining connections");
        handle.graceful_shutdown(Some(grace));
    })
}
