//! HTTP server assembly: middleware stack, CORS policy and shutdown.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use tg_domain::config::{CorsConfig, ServerConfig};

use crate::api;
use crate::state::AppState;

/// The API router with body limit, request tracing, CORS, concurrency limit and optional
/// per-IP rate limiting applied, state attached.
pub fn build_app(state: AppState, server: &ServerConfig) -> anyhow::Result<Router> {
    let cors_layer = build_cors_layer(&server.cors);
    tracing::info!(
        max_concurrent = server.max_concurrent_requests,
        "concurrency limit set"
    );

    let router = api::router()
        .layer(DefaultBodyLimit::max(server.max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .layer(tower::limit::ConcurrencyLimitLayer::new(
            server.max_concurrent_requests,
        ));

    // ── Rate-limit layer (per-IP token bucket via governor) ─────────
    let router = match &server.rate_limit {
        Some(rl) => {
            use tower_governor::governor::GovernorConfigBuilder;
            use tower_governor::GovernorLayer;

            let gov_config = GovernorConfigBuilder::default()
                .per_second(rl.requests_per_second)
                .burst_size(rl.burst_size)
                .finish()
                .ok_or_else(|| {
                    anyhow::anyhow!("rate_limit: requests_per_second and burst_size must be > 0")
                })?;

            tracing::info!(
                requests_per_second = rl.requests_per_second,
                burst_size = rl.burst_size,
                "per-IP rate limiting enabled"
            );
            router.layer(GovernorLayer {
                config: Arc::new(gov_config),
            })
        }
        None => {
            tracing::info!("per-IP rate limiting disabled (no [server.rate_limit] in config)");
            router
        }
    };

    Ok(router.with_state(state))
}

/// CORS from the configured origins. A lone `"*"` allows everything;
/// entries ending in `:*` match any numeric port on that host.
pub fn build_cors_layer(cors: &CorsConfig) -> CorsLayer {
    let methods = [Method::GET, Method::POST, Method::DELETE, Method::OPTIONS];
    let headers = [header::CONTENT_TYPE, header::AUTHORIZATION];

    if cors.allowed_origins.len() == 1 && cors.allowed_origins[0] == "*" {
        tracing::warn!("CORS configured with wildcard \"*\": all origins allowed");
        return CorsLayer::new()
            .allow_origin(tower_http::cors::Any)
            .allow_methods(methods)
            .allow_headers(headers);
    }

    let patterns: Vec<String> = cors
        .allowed_origins
        .iter()
        .filter(|o| {
            let ok = o.ends_with(":*") || o.parse::<HeaderValue>().is_ok();
            if !ok {
                tracing::warn!(origin = %o, "invalid CORS origin, skipping");
            }
            ok
        })
        .cloned()
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin, _| {
            origin
                .to_str()
                .map(|o| origin_allowed(&patterns, o))
                .unwrap_or(false)
        }))
        .allow_methods(methods)
        .allow_headers(headers)
        .allow_credentials(true)
}

/// Whether `origin` matches one of the configured patterns.
pub fn origin_allowed(patterns: &[String], origin: &str) -> bool {
    patterns.iter().any(|p| match p.strip_suffix('*') {
        Some(prefix) if p.ends_with(":*") => origin
            .strip_prefix(prefix)
            .is_some_and(|port| !port.is_empty() && port.chars().all(|c| c.is_ascii_digit())),
        _ => p == origin,
    })
}

/// Wait for SIGINT or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => tracing::info!("received SIGINT, shutting down"),
                    _ = sigterm.recv() => tracing::info!("received SIGTERM, shutting down"),
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to register SIGTERM handler");
                ctrl_c.await;
                tracing::info!("received SIGINT, shutting down");
            }
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await;
        tracing::info!("received SIGINT, shutting down");
    }
}
