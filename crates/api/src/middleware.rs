use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderName, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tower_http::request_id::MakeRequestId;
use tracing::Span;

use bizops_auth::JwtValidator;

use crate::app::errors::json_error;
use crate::context::RequestId;
use crate::rate_limit::Clock;

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

#[derive(Clone)]
pub struct AuthState {
    pub jwt: Arc<dyn JwtValidator>,
    pub clock: Arc<dyn Clock>,
}

/// Missing, malformed or unverifiable bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unauthenticated;

impl IntoResponse for Unauthenticated {
    fn into_response(self) -> Response {
        json_error(StatusCode::UNAUTHORIZED, "Authentication required")
    }
}

/// Verify the bearer token and attach the resulting `Caller` to the request.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, Unauthenticated> {
    let token = extract_bearer(req.headers())?;

    let claims = state.jwt.validate(token, state.clock.now()).map_err(|e| {
        tracing::debug!(error = %e, "bearer token rejected");
        Unauthenticated
    })?;

    req.extensions_mut().insert(claims.caller());

    Ok(next.run(req).await)
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, Unauthenticated> {
    let header = headers
        .get(header::AUTHORIZATION)
        .ok_or(Unauthenticated)?
        .to_str()
        .map_err(|_| Unauthenticated)?;

    let token = header.strip_prefix("Bearer ").ok_or(Unauthenticated)?.trim();
    if token.is_empty() {
        return Err(Unauthenticated);
    }

    Ok(token)
}

/// Mints a UUIDv7 for requests that arrive without an `X-Request-Id`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<tower_http::request_id::RequestId> {
        let value = HeaderValue::from_str(&RequestId::new().to_string()).ok()?;
        Some(tower_http::request_id::RequestId::new(value))
    }
}

/// Span for one HTTP request, keyed by the id set by `MakeRequestUuidV7`.
pub fn request_span(req: &Request<Body>) -> Span {
    let request_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    tracing::info_span!(
        "request",
        request_id,
        method = %req.method(),
        path = %req.uri().path(),
    )
}
