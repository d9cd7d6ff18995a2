#![cfg_attr(test, allow(clippy::disallowed_methods))]
// Forbid unwrap() in production code; configuration errors are reported and
// the process exits instead.
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
use std::net::SocketAddr;

use portal::{AppState, auth::IdentitySource, config::ServerConfig, router};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "portal=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment variables. A missing signing key
    // stops the process before it can serve anything.
    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    if config.identity_source == IdentitySource::DevelopmentFallback {
        tracing::warn!(
            "Using the built-in development identity ({}); set PORTAL_IDENTITY_EMAIL and PORTAL_IDENTITY_PASSWORD outside development",
            config.identity.email
        );
    }
    if !config.cookie_secure {
        tracing::warn!("Session cookie is not marked Secure; enable PORTAL_COOKIE_SECURE behind HTTPS");
    }

    tracing::info!(
        "Loaded configuration: listen={}:{}, guard_policy={}, identity={}, dashboard_embed={}",
        config.listen_addr,
        config.listen_port,
        config.guard_policy.name(),
        config.identity.email,
        config.dashboard_embed_url.is_some()
    );

    let app = router(AppState::from_config(&config));

    let addr = SocketAddr::new(config.listen_addr, config.listen_port);
    tracing::info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Failed to bind: {e}");
            std::process::exit(1);
        });

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Server error: {e}");
            std::process::exit(1);
        });
}

/// Resolve on Ctrl-C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {e}");
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
                tracing::error!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("shutting down");
}
