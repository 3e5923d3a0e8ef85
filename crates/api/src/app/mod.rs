//! HTTP application wiring (axum router + service wiring).
//!
//! - `services.rs`: backends, the report service and the window sweeper
//! - `routes/`: handlers, one file per area
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue},
    routing::get,
    Extension, Router,
};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use bizops_auth::Hs256JwtValidator;

use crate::config::ApiConfig;
use crate::middleware;

pub mod errors;
pub mod routes;
pub mod services;

pub use services::Backends;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
///
/// Must be called inside a tokio runtime: it starts the rate-limit window
/// sweeper.
pub async fn build_app(config: &ApiConfig, backends: Backends) -> Router {
    let auth_state = middleware::AuthState {
        jwt: Arc::new(Hs256JwtValidator::new(config.jwt_secret.as_bytes())),
        clock: Arc::clone(&backends.clock),
    };

    let services = Arc::new(services::build_services(config, backends.clone()));
    services::spawn_window_sweeper(&services.limiter, backends.clock);

    // Security headers wrap authentication so 401s carry them too.
    let investor = routes::router()
        .layer(Extension(services))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::auth_middleware,
        ))
        .layer(
            ServiceBuilder::new()
                .layer(SetResponseHeaderLayer::overriding(
                    header::X_CONTENT_TYPE_OPTIONS,
                    HeaderValue::from_static("nosniff"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    header::STRICT_TRANSPORT_SECURITY,
                    HeaderValue::from_static("max-age=63072000; includeSubDomains; preload"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    header::X_FRAME_OPTIONS,
                    HeaderValue::from_static("DENY"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    header::CONTENT_SECURITY_POLICY,
                    HeaderValue::from_static("default-src 'self'"),
                )),
        );

    Router::new()
        .route("/health", get(routes::system::health))
        .nest("/investor", investor)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(
                    middleware::REQUEST_ID_HEADER,
                    middleware::MakeRequestUuidV7,
                ))
                .layer(TraceLayer::new_for_http().make_span_with(middleware::request_span))
                .layer(PropagateRequestIdLayer::new(middleware::REQUEST_ID_HEADER)),
        )
}
