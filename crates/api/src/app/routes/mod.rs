use axum::{routing::get, Router};

pub mod investor;
pub mod system;

/// Router for the authenticated investor reports (mounted under `/investor`).
pub fn router() -> Router {
    Router::new()
        .route("/dashboard", get(investor::dashboard))
        .route("/performance", get(investor::performance))
        .route("/products", get(investor::products))
        .route("/health", get(investor::health))
}
