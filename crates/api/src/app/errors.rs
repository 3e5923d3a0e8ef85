use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde_json::json;

use bizops_auth::ForbiddenError;

use crate::rate_limit::{Admission, RateLimitError};
use crate::report_service::ReportError;

const RATE_LIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
const RATE_LIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
const RATE_LIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// `ReportError` rendered for a particular deployment environment.
///
/// Outside development the internal `details` never leave the process.
#[derive(Debug)]
pub struct ApiError {
    error: ReportError,
    development: bool,
}

impl ApiError {
    pub fn new(error: ReportError, development: bool) -> Self {
        Self { error, development }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.error {
            ReportError::Validation(e) => json_error(StatusCode::BAD_REQUEST, e.to_string()),
            ReportError::Forbidden(e) => forbidden(e),
            ReportError::RateLimited(e) => too_many_requests(e),
            ReportError::Internal { message, detail } => {
                tracing::error!(error = %detail, "{message}");

                let mut body = json!({ "success": false, "error": message });
                if self.development {
                    body["details"] = json!(detail);
                }
                (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(body)).into_response()
            }
        }
    }
}

impl IntoResponse for ReportError {
    fn into_response(self) -> Response {
        ApiError::new(self, false).into_response()
    }
}

fn forbidden(err: ForbiddenError) -> Response {
    let body = match err {
        ForbiddenError::RoleMismatch { required, actual } => json!({
            "success": false,
            "message": format!("Access denied. {} role required.", required.title()),
            "requiredRole": required,
            "yourRole": actual,
        }),
        ForbiddenError::AccountInactive => json!({
            "success": false,
            "message": "Account not active",
        }),
    };
    (StatusCode::FORBIDDEN, axum::Json(body)).into_response()
}

fn too_many_requests(err: RateLimitError) -> Response {
    let mut res = json_error(StatusCode::TOO_MANY_REQUESTS, err.to_string());
    let headers = res.headers_mut();
    write_quota_headers(headers, err.limit, 0, err.reset_at);

    // Whole seconds, rounded up so a client honouring it never retries early.
    let millis = err.retry_after.num_milliseconds().max(0);
    let secs = (millis + 999) / 1000;
    headers.insert(header::RETRY_AFTER, HeaderValue::from(secs));
    res
}

/// Attach the caller's remaining quota to a successful response.
pub fn with_quota_headers(mut res: Response, admission: &Admission) -> Response {
    write_quota_headers(
        res.headers_mut(),
        admission.limit,
        admission.remaining,
        admission.reset_at,
    );
    res
}

fn write_quota_headers(headers: &mut HeaderMap, limit: u32, remaining: u32, reset_at: DateTime<Utc>) {
    headers.insert(RATE_LIMIT_LIMIT, HeaderValue::from(limit));
    headers.insert(RATE_LIMIT_REMAINING, HeaderValue::from(remaining));
    headers.insert(RATE_LIMIT_RESET, HeaderValue::from(reset_at.timestamp()));
}

pub fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "success": false,
            "error": message.into(),
        })),
    )
        .into_response()
}
