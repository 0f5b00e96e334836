#![allow(unreachable_pub, clippy::redundant_pub_crate)]
use std::{
    future::Future,
    net::SocketAddr,
    pin::Pin,
    task::{Context, Poll},
};

use api_types::ErrorResponse;
use axum::{
    extract::ConnectInfo,
    http::{HeaderValue, Request, StatusCode, header},
    response::{IntoResponse, Response},
};
use tower::{Layer, Service};

use runtime::rate_limiter::RateLimiter;

/// Header consulted for the client address when running behind a proxy.
const FORWARDED_FOR: &str = "x-forwarded-for";

/// Identify the client of `req`: the first forwarded address, else the peer address.
fn client_key<B>(req: &Request<B>) -> String {
    let forwarded = req
        .headers()
        .get(FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    if let Some(forwarded) = forwarded {
        return forwarded.to_owned();
    }
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map_or_else(|| "unknown".to_owned(), |info| info.0.ip().to_string())
}

#[derive(Clone, Debug)]
pub(super) struct RateLimitLayer {
    limiter: RateLimiter,
}

impl RateLimitLayer {
    pub fn new(limiter: RateLimiter) -> Self {
        Self { limiter }
    }
}

impl<S> Layer<S> for RateLimitLayer {
    type Service = RateLimit<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RateLimit { inner, limiter: self.limiter.clone() }
    }
}

#[derive(Clone, Debug)]
pub(super) struct RateLimit<S> {
    inner: S,
    limiter: RateLimiter,
}

impl<S, ReqBody> Service<Request<ReqBody>> for RateLimit<S>
where
    S: Service<Request<ReqBody>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let key = client_key(&req);
        if self.limiter.try_acquire(&key) {
            return Box::pin(self.inner.call(req));
        }

        tracing::debug!(client = %key, "Rate limit exceeded");
        let period = self.limiter.period().as_secs();
        let error_body = ErrorResponse::new(
            "rate-limit",
            "Too Many Requests",
            StatusCode::TOO_MANY_REQUESTS,
            format!("Rate limit exceeded. Retry after {period} seconds"),
        );
        let mut resp = error_body.into_response();
        resp.headers_mut().insert(header::RETRY_AFTER, HeaderValue::from(period));
        Box::pin(std::future::ready(Ok(resp)))
    }
}
