//! Query-string validation for the report routes.

use core::ops::RangeInclusive;

use serde::Deserialize;
use thiserror::Error;

/// Raw query parameters, exactly as received.
///
/// Kept as strings so malformed values reach the validator (and produce a
/// 400 with the documented message) instead of failing extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ReportQuery {
    pub months: Option<String>,
    pub limit: Option<String>,
    /// Set when the query string itself could not be decoded (for example a
    /// repeated key). Reported by the validator like any other bad value.
    #[serde(skip)]
    pub malformed: Option<String>,
}

impl ReportQuery {
    pub fn months(months: impl Into<String>) -> Self {
        Self {
            months: Some(months.into()),
            ..Self::default()
        }
    }

    pub fn limit(limit: impl Into<String>) -> Self {
        Self {
            limit: Some(limit.into()),
            ..Self::default()
        }
    }

    pub fn malformed(detail: impl Into<String>) -> Self {
        Self {
            malformed: Some(detail.into()),
            ..Self::default()
        }
    }
}

/// Validated report parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportParams {
    pub months: usize,
    pub limit: usize,
}

impl Default for ReportParams {
    fn default() -> Self {
        Self {
            months: QueryValidator::DEFAULT_MONTHS,
            limit: QueryValidator::DEFAULT_LIMIT,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid query string")]
    Malformed { detail: String },

    #[error("Months must be between 1 and 36")]
    Months { raw: String },

    #[error("Limit must be between 1 and 50")]
    Limit { raw: String },
}

pub struct QueryValidator;

impl QueryValidator {
    pub const MONTHS: RangeInclusive<i64> = 1..=36;
    pub const LIMIT: RangeInclusive<i64> = 1..=50;
    pub const DEFAULT_MONTHS: usize = 12;
    pub const DEFAULT_LIMIT: usize = 10;

    /// Check `months` then `limit`; absent or blank values take the defaults.
    pub fn validate(query: &ReportQuery) -> Result<ReportParams, ValidationError> {
        if let Some(detail) = &query.malformed {
            return Err(ValidationError::Malformed { detail: detail.clone() });
        }

        let months = bounded(query.months.as_deref(), &Self::MONTHS)
            .map_err(|raw| ValidationError::Months { raw })?
            .unwrap_or(Self::DEFAULT_MONTHS);

        let limit = bounded(query.limit.as_deref(), &Self::LIMIT)
            .map_err(|raw| ValidationError::Limit { raw })?
            .unwrap_or(Self::DEFAULT_LIMIT);

        Ok(ReportParams { months, limit })
    }
}

/// `Ok(None)` for a missing/blank value, `Err(raw)` for anything that is not
/// an integer inside `range`.
fn bounded(raw: Option<&str>, range: &RangeInclusive<i64>) -> Result<Option<usize>, String> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    match raw.parse::<i64>() {
        Ok(n) if range.contains(&n) => Ok(Some(n as usize)),
        _ => Err(raw.to_string()),
    }
}
