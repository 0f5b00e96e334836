//! Helper utilities to launch the TVL API server.

use std::{net::SocketAddr, sync::Arc};

use api::ApiState;
use axum::{
    Router,
    http::{HeaderValue, Method},
};
use eyre::{Context, Result};
use runtime::{health, rate_limiter::RateLimiter};
mod rate_limit;
use rate_limit::RateLimitLayer;
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, info};

/// Prefix of all API routes.
pub const API_PREFIX: &str = "/api/v1";

fn origin_allowed(allowed: &[String], origin: &str) -> bool {
    allowed.iter().any(|o| o == origin) ||
        origin.starts_with("http://localhost:") ||
        origin.starts_with("http://127.0.0.1:")
}

/// Build the API router with CORS, tracing and rate limiting layers.
pub fn router(state: ApiState, limiter: RateLimiter, allowed_origins: Vec<String>) -> Router {
    let allowed = Arc::new(allowed_origins);
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::predicate({
            let allowed = Arc::clone(&allowed);
            move |origin: &HeaderValue, _| {
                origin.to_str().is_ok_and(|origin| origin_allowed(&allowed, origin))
            }
        }))
        .allow_methods([Method::GET])
        .allow_headers(Any)
        .expose_headers(Any);
    let trace = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let api_service = tower::ServiceBuilder::new()
        .layer(RateLimitLayer::new(limiter))
        .service(api::router(state));

    Router::new()
        .merge(health::router())
        .nest_service(API_PREFIX, api_service)
        .layer(cors)
        .layer(trace)
}

/// Serve the API on `addr` until `cancel` fires, then drain open connections.
pub async fn run(
    addr: SocketAddr,
    state: ApiState,
    allowed_origins: Vec<String>,
    cancel: CancellationToken,
) -> Result<()> {
    let limiter = RateLimiter::new(state.max_requests(), state.rate_period());
    let app = router(state, limiter.clone(), allowed_origins);

    let pruner = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            let mut ticker = tokio::time::interval(limiter.period());
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => limiter.prune(),
                }
            }
        }
    });

    info!(%addr, "Starting API server");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .wrap_err_with(|| format!("failed to bind API server to {addr}"))?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await?;

    pruner.abort();
    info!("API server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use api::{DEFAULT_MAX_REQUESTS, DEFAULT_RATE_PERIOD};
    use axum::{
        body::{self, Body},
        http::{Request, StatusCode},
    };
    use serde_json::Value;
    use store::MemoryStore;
    use tower::ServiceExt;

    fn build_app(allowed: Vec<String>) -> Router {
        let state =
            ApiState::new(Arc::new(MemoryStore::new()), DEFAULT_MAX_REQUESTS, DEFAULT_RATE_PERIOD);
        let limiter = RateLimiter::new(DEFAULT_MAX_REQUESTS, DEFAULT_RATE_PERIOD);
        router(state, limiter, allowed)
    }

    fn default_origins() -> Vec<String> {
        vec![config::DEFAULT_ALLOWED_ORIGINS.to_owned()]
    }

    /// Status, body and echoed CORS origin of a TVL request sent from `origin`.
    async fn tvl_from(app: Router, origin: &str) -> (StatusCode, Value, Option<HeaderValue>) {
        let request = Request::builder()
            .uri(format!("{API_PREFIX}/tvl/pinklock?chain_id=56"))
            .header("Origin", origin)
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let echoed = response.headers().get("access-control-allow-origin").cloned();
        let bytes = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap(), echoed)
    }

    #[tokio::test]
    async fn tvl_is_served_under_the_api_prefix() {
        let (status, body, _) = tvl_from(build_app(default_origins()), "https://a.test").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({ "tvl": 0.0, "stableCoinTvl": 0.0 }));
    }

    #[tokio::test]
    async fn cors_echoes_only_known_origins() {
        let mut origins = default_origins();
        origins.push("https://partner.example".to_owned());
        let cases = [
            ("https://www.pinksale.finance", true),
            ("https://partner.example", true),
            ("http://localhost:5173", true),
            ("http://127.0.0.1:8080", true),
            ("https://pinksale.finance.evil.test", false),
            ("http://localhost.evil.test", false),
        ];

        for (origin, allowed) in cases {
            let (status, _, echoed) = tvl_from(build_app(origins.clone()), origin).await;
            assert_eq!(status, StatusCode::OK, "{origin}");
            let echoed = echoed.map(|v| v.to_str().unwrap().to_owned());
            assert_eq!(echoed.as_deref() == Some(origin), allowed, "{origin}");
            if !allowed {
                assert!(echoed.is_none(), "{origin}");
            }
        }
    }

    #[tokio::test]
    async fn health_is_outside_the_api_prefix() {
        let response = build_app(default_origins())
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn api_requests_are_rate_limited() {
        let state = ApiState::new(Arc::new(MemoryStore::new()), 1, DEFAULT_RATE_PERIOD);
        let app = router(state, RateLimiter::new(1, DEFAULT_RATE_PERIOD), default_origins());

        let uri = format!("{API_PREFIX}/tvl/pinklock?chain_id=56");
        let request = || Request::builder().uri(&uri).body(Body::empty()).unwrap();
        let first = app.clone().oneshot(request()).await.unwrap();
        let second = app.oneshot(request()).await.unwrap();

        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    }
}
