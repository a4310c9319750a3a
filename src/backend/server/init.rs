/**
 * Server Initialization
 *
 * This module handles the initialization and setup of the Axum HTTP server,
 * including state creation, starting the relay pump, and shutdown.
 *
 * # Initialization Process
 *
 * 1. Build the backing services named by the configuration
 * 2. Create the application state (relay, services, signup policy)
 * 3. Start the relay pump on the reading source
 * 4. Create and configure the router
 *
 * # Shutdown
 *
 * On ctrl-c (or SIGTERM on unix) the pump is stopped first, so no reading is
 * published into a closing relay. Then every sink is dropped, which ends the
 * open SSE, WebSocket and long-poll connections, and axum's graceful shutdown
 * waits for in-flight requests to finish.
 */

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;

use crate::backend::auth::policy::SignupPolicy;
use crate::backend::error::BackendError;
use crate::backend::realtime::pump::RelayPump;
use crate::backend::routes::router::create_router;
use crate::backend::server::config::load_services;
use crate::backend::server::state::AppState;
use crate::shared::AppConfig;

/// Build the application state for `config`
pub fn build_state(config: &AppConfig) -> Result<AppState, BackendError> {
    let services = load_services(config)?;
    Ok(AppState::new(services.source, services.identity, services.profiles)
        .with_signup(SignupPolicy::new(config.signup.clone()))
        .with_keepalive(Duration::from_secs(config.keepalive_secs)))
}

/// Create the router and start the relay pump for `state`
///
/// The pump runs until `RelayPump::shutdown` is called.
pub fn create_app(state: AppState) -> (Router<()>, RelayPump) {
    tracing::info!("[STARTUP] Starting relay pump on {} source", state.source.name());
    let pump = RelayPump::spawn(state.source.clone(), state.relay.clone());
    let app = create_router(state);
    tracing::info!("[STARTUP] Router configured");
    (app, pump)
}

/// Serve `config` until a shutdown signal arrives
pub async fn run(config: AppConfig) -> Result<(), BackendError> {
    let state = build_state(&config)?;
    let relay = state.relay.clone();
    let (app, pump) = create_app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| BackendError::state(format!("bind {}: {}", addr, e)))?;
    tracing::info!("[STARTUP] Listening on {}", addr);

    let shutdown = async move {
        shutdown_signal().await;
        tracing::info!("[SHUTDOWN] Signal received, stopping relay");
        pump.shutdown().await;
        relay.close_all();
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| BackendError::state(format!("server: {}", e)))?;

    tracing::info!("[SHUTDOWN] Server stopped");
    Ok(())
}

/// Resolves on ctrl-c, or SIGTERM on unix
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("[SHUTDOWN] Could not listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("[SHUTDOWN] Could not listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
