// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use athena_server::{
    api::router,
    config::{json_logs, ServerConfig, SessionBackend, DEFAULT_LOG_FILTER},
    oauth::DiscordClient,
    server::{serve, shutdown_on, SHUTDOWN_GRACE},
    session::{durable::SESSION_DB_FILE, DurableSessionStore, InMemorySessionStore, SessionStore, SessionSweeper},
    state::AppState,
};
use axum_server::Handle;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() {
    init_tracing();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "Athena server failed");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let registry = tracing_subscriber::registry().with(filter);

    if json_logs() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn open_session_store(backend: &SessionBackend) -> Result<Arc<dyn SessionStore>, BoxError> {
    Ok(match backend {
        SessionBackend::Memory => Arc::new(InMemorySessionStore::new()),
        SessionBackend::Redb { data_dir } => {
            let path = data_dir.join(SESSION_DB_FILE);
            tracing::info!(path = %path.display(), "Opening session database");
            Arc::new(DurableSessionStore::open(&path)?)
        }
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Could not listen for Ctrl-C, running until killed");
        std::future::pending::<()>().await;
    }
}

async fn run() -> Result<(), BoxError> {
    // Install the ring crypto provider for rustls (must be done before any TLS operations).
    // An error means a provider is already installed.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let config = ServerConfig::from_env()?;
    let sessions = open_session_store(&config.session_backend)?;
    let discord = DiscordClient::new(config.discord.clone())?;

    let shutdown = CancellationToken::new();
    let sweeper = tokio::spawn(
        SessionSweeper::new(sessions.clone())
            .with_interval(config.sweep_interval)
            .run(shutdown.clone()),
    );

    let app = router(AppState::new(sessions.clone(), discord));
    let addr = config.bind_addr;

    // Stop accepting on Ctrl-C and let in-flight callbacks finish.
    let handle = Handle::new();
    let signal = shutdown_on(handle.clone(), shutdown_signal(), SHUTDOWN_GRACE);

    let scheme = if config.tls.is_some() { "https" } else { "http" };
    tracing::info!(%addr, scheme, backend = sessions.backend(), "Athena server listening (docs at /docs)");
    let served = serve(app, addr, config.tls.as_ref(), handle).await;
    signal.abort();

    shutdown.cancel();
    if let Err(e) = sweeper.await {
        tracing::warn!(error = %e, "Session sweeper task ended abnormally");
    }
    sessions.flush()?;
    tracing::info!("Session store flushed, exiting");

    served.map_err(Into::into)
}
