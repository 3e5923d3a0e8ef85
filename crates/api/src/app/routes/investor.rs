use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Extension, Query},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use bizops_auth::Caller;

use crate::app::errors::{with_quota_headers, ApiError};
use crate::app::services::AppServices;
use crate::query::ReportQuery;
use crate::report_service::{Report, ReportError, ReportRequest};

pub async fn dashboard(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<Caller>,
    query: Result<Query<ReportQuery>, QueryRejection>,
) -> Response {
    let result = services.reports.dashboard(&ReportRequest::new(caller, decoded(query)));
    respond(result, services.development)
}

pub async fn performance(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<Caller>,
    query: Result<Query<ReportQuery>, QueryRejection>,
) -> Response {
    let result = services.reports.performance(&ReportRequest::new(caller, decoded(query)));
    respond(result, services.development)
}

pub async fn products(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<Caller>,
    query: Result<Query<ReportQuery>, QueryRejection>,
) -> Response {
    let result = services.reports.products(&ReportRequest::new(caller, decoded(query)));
    respond(result, services.development)
}

pub async fn health(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<Caller>,
    query: Result<Query<ReportQuery>, QueryRejection>,
) -> Response {
    let result = services.reports.health(&ReportRequest::new(caller, decoded(query)));
    respond(result, services.development)
}

/// An undecodable query string still goes through the limiter and surfaces as
/// an ordinary validation error.
fn decoded(query: Result<Query<ReportQuery>, QueryRejection>) -> ReportQuery {
    match query {
        Ok(Query(query)) => query,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "query string rejected");
            ReportQuery::malformed(rejection.body_text())
        }
    }
}

fn respond<T: Serialize>(result: Result<Report<T>, ReportError>, development: bool) -> Response {
    match result {
        Ok(report) => with_quota_headers(Json(report.envelope).into_response(), &report.admission),
        Err(err) => ApiError::new(err, development).into_response(),
    }
}
