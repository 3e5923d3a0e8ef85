use axum::http::StatusCode;

/// Liveness probe; needs no credentials and touches no store.
pub async fn health() -> StatusCode {
    StatusCode::OK
}
