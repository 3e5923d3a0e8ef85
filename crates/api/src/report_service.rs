//! Investor report orchestration.
//!
//! Every report runs the same gate before touching the record store:
//!
//! 1. rate limit (quota is per caller, shared by all four reports)
//! 2. query validation
//! 3. role gate (investor role, then active account)
//!
//! Each stage either continues or ends the request with its own error; a
//! failed stage means nothing after it runs.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use bizops_auth::{AccessError, AccessGate, AccountDirectory, Caller, ForbiddenError, Role};
use bizops_core::StoreError;
use bizops_reporting::{
    AggregateSummary, AggregationEngine, HealthMetrics, HealthScorer, MonthlyPerformance, ProductPerformance,
    RecordStore,
};

use crate::query::{QueryValidator, ReportParams, ReportQuery, ValidationError};
use crate::rate_limit::{Admission, Clock, RateLimitError, RateLimiter};

/// The four investor reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Dashboard,
    Performance,
    Products,
    Health,
}

impl Endpoint {
    /// Generic message shown to clients when the report cannot be computed.
    pub fn failure_message(&self) -> &'static str {
        match self {
            Endpoint::Dashboard => "Failed to fetch investor dashboard",
            Endpoint::Performance => "Failed to fetch performance data",
            Endpoint::Products => "Failed to fetch product data",
            Endpoint::Health => "Failed to calculate financial health",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::Dashboard => "dashboard",
            Endpoint::Performance => "performance",
            Endpoint::Products => "products",
            Endpoint::Health => "health",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRequest {
    pub caller: Caller,
    pub query: ReportQuery,
}

impl ReportRequest {
    pub fn new(caller: Caller, query: ReportQuery) -> Self {
        Self { caller, query }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReportError {
    #[error(transparent)]
    RateLimited(#[from] RateLimitError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Forbidden(#[from] ForbiddenError),

    /// Something behind the API failed. `message` is safe to show; `detail`
    /// is not, outside development.
    #[error("{message}: {detail}")]
    Internal { message: &'static str, detail: String },
}

impl ReportError {
    fn store(endpoint: Endpoint, err: StoreError) -> Self {
        ReportError::Internal {
            message: endpoint.failure_message(),
            detail: err.to_string(),
        }
    }
}

impl From<AccessError> for ReportError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::Forbidden(f) => ReportError::Forbidden(f),
            AccessError::Lookup(e) => ReportError::Internal {
                message: "Internal server error during verification",
                detail: e.to_string(),
            },
        }
    }
}

/// Success body: `{ success: true, data, [count], [lastUpdated] }`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

impl<T> Envelope<T> {
    fn data(data: T) -> Self {
        Self {
            success: true,
            data,
            count: None,
            last_updated: None,
        }
    }
}

impl<T> Envelope<Vec<T>> {
    fn counted(data: Vec<T>) -> Self {
        Self {
            count: Some(data.len()),
            ..Self::data(data)
        }
    }
}

/// Health metrics stamped with the time they were computed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    #[serde(flatten)]
    pub metrics: HealthMetrics,
    pub updated_at: DateTime<Utc>,
}

/// A computed report plus the caller's remaining quota.
#[derive(Debug, Clone, PartialEq)]
pub struct Report<T> {
    pub admission: Admission,
    pub envelope: Envelope<T>,
}

/// Outcome of the gate stages for a request that may proceed.
struct Cleared {
    admission: Admission,
    params: ReportParams,
    now: DateTime<Utc>,
}

pub struct ReportService {
    limiter: Arc<RateLimiter>,
    gate: AccessGate<Arc<dyn AccountDirectory>>,
    engine: AggregationEngine<Arc<dyn RecordStore>>,
    scorer: HealthScorer,
    clock: Arc<dyn Clock>,
    required_role: Role,
}

impl ReportService {
    pub fn new(
        limiter: Arc<RateLimiter>,
        accounts: Arc<dyn AccountDirectory>,
        records: Arc<dyn RecordStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            limiter,
            gate: AccessGate::new(accounts),
            engine: AggregationEngine::new(records),
            scorer: HealthScorer::new(),
            clock,
            required_role: Role::Investor,
        }
    }

    pub fn dashboard(&self, req: &ReportRequest) -> Result<Report<AggregateSummary>, ReportError> {
        let endpoint = Endpoint::Dashboard;
        let cleared = self.clear(endpoint, req)?;

        let summary = self.engine.summary().map_err(|e| ReportError::store(endpoint, e))?;

        Ok(Report {
            admission: cleared.admission,
            envelope: Envelope {
                last_updated: Some(cleared.now),
                ..Envelope::data(summary)
            },
        })
    }

    pub fn performance(&self, req: &ReportRequest) -> Result<Report<Vec<MonthlyPerformance>>, ReportError> {
        let endpoint = Endpoint::Performance;
        let cleared = self.clear(endpoint, req)?;

        let rows = self
            .engine
            .monthly_performance(cleared.params.months)
            .map_err(|e| ReportError::store(endpoint, e))?;

        Ok(Report {
            admission: cleared.admission,
            envelope: Envelope::counted(rows),
        })
    }

    pub fn products(&self, req: &ReportRequest) -> Result<Report<Vec<ProductPerformance>>, ReportError> {
        let endpoint = Endpoint::Products;
        let cleared = self.clear(endpoint, req)?;

        let rows = self
            .engine
            .top_products(cleared.params.limit)
            .map_err(|e| ReportError::store(endpoint, e))?;

        Ok(Report {
            admission: cleared.admission,
            envelope: Envelope::counted(rows),
        })
    }

    pub fn health(&self, req: &ReportRequest) -> Result<Report<HealthReport>, ReportError> {
        let endpoint = Endpoint::Health;
        let cleared = self.clear(endpoint, req)?;

        let (summary, stock) = self
            .engine
            .health_inputs()
            .map_err(|e| ReportError::store(endpoint, e))?;
        let metrics = self.scorer.score(&summary, &stock);

        Ok(Report {
            admission: cleared.admission,
            envelope: Envelope::data(HealthReport {
                metrics,
                updated_at: cleared.now,
            }),
        })
    }

    /// Run the gate stages in order, stopping at the first refusal.
    fn clear(&self, endpoint: Endpoint, req: &ReportRequest) -> Result<Cleared, ReportError> {
        let now = self.clock.now();

        let admission = self.limiter.admit(&req.caller.client_key(), now)?;
        let params = QueryValidator::validate(&req.query)?;
        self.gate.authorize(&req.caller, self.required_role)?;

        tracing::debug!(
            endpoint = endpoint.as_str(),
            account_id = %req.caller.account_id,
            remaining = admission.remaining,
            "report request cleared"
        );

        Ok(Cleared { admission, params, now })
    }
}
