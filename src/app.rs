/*
 * Responsibility
 * - Load Config -> build dependencies -> assemble the Router
 * - Serve with graceful shutdown (SIGINT / SIGTERM)
 * - After the listener stops, give background cleanup a bounded grace period
 * - The captcha gate is built here but only guards routers that mount it
 *   through `middleware::captcha::apply`; the v1 routes below do not
 */
use std::{net::SocketAddr, panic, process, sync::Arc, time::Duration};

use anyhow::Result;
use axum::Router;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{CaptchaSettings, Config};
use crate::middleware::{self, captcha::CaptchaGate};
use crate::services::auth::build_claims_extractor;
use crate::services::captcha::{CaptchaError, CaptchaProviders};
use crate::services::cleanup::Cleanup;
use crate::{api, state::AppState};

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,identity_gate=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        // stderr can be hidden depending on how the process is launched.
        tracing::error!(?info, "panic");

        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;

    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        env = ?config.app_env,
        addr = %config.addr,
        captcha_enabled = config.captcha.enabled,
        captcha_provider = %config.captcha.provider,
        hook_events = config.hooks.len(),
        "starting identity gate"
    );
    if config.captcha.enabled {
        tracing::info!("captcha gate applies only to routes mounted with middleware::captcha::apply");
    }

    let state = build_state(&config)?;
    let app = build_router(state.clone(), &config);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    drain_cleanup(&state.cleanup, config.shutdown_grace).await;

    tracing::info!("shutdown complete");
    Ok(())
}

/// Build process-level services and inject them into the shared state.
pub fn build_state(config: &Config) -> Result<AppState, CaptchaError> {
    let claims = build_claims_extractor(config);
    let providers = CaptchaProviders::from_config(config)?;

    let captcha = CaptchaGate::new(
        CaptchaSettings::new(config.captcha.clone()),
        claims,
        providers,
        config.captcha_bypass_role.clone(),
    );

    Ok(AppState::new(
        Arc::new(captcha),
        Arc::new(config.hooks.clone()),
        Cleanup::new(),
    ))
}

pub fn build_router(state: AppState, config: &Config) -> Router {
    let router = Router::new()
        .nest("/api/v1", api::v1::routes())
        .with_state(state);

    middleware::http::apply(router, config)
}

async fn drain_cleanup(cleanup: &Cleanup, grace: Duration) {
    let deadline = CancellationToken::new();
    let timer = {
        let deadline = deadline.clone();
        tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            deadline.cancel();
        })
    };

    tracing::info!(
        outstanding = cleanup.outstanding(),
        grace_seconds = grace.as_secs(),
        "waiting for background cleanup"
    );
    cleanup.await_drain(&deadline).await;
    timer.abort();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        },
    }
}
