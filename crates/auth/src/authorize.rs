use serde::Serialize;
use thiserror::Error;

use bizops_core::StoreError;

use crate::{AccountDirectory, Caller, Role};

/// Why a caller was refused.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ForbiddenError {
    /// The caller holds a different role than the route requires.
    #[error("role '{actual}' cannot access a route requiring '{required}'")]
    RoleMismatch { required: Role, actual: Role },

    /// The role matches but the account is not active (or no longer exists).
    #[error("account is not active")]
    AccountInactive,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccessError {
    #[error("forbidden: {0}")]
    Forbidden(#[from] ForbiddenError),

    /// The user store could not answer the status lookup.
    #[error("account lookup failed: {0}")]
    Lookup(#[from] StoreError),
}

/// Role gate: exact role match, then an active account.
///
/// The role check runs first and needs no I/O; the status lookup only happens
/// for callers that already hold the required role.
#[derive(Debug, Clone)]
pub struct AccessGate<D> {
    directory: D,
}

impl<D: AccountDirectory> AccessGate<D> {
    pub fn new(directory: D) -> Self {
        Self { directory }
    }

    pub fn authorize(&self, caller: &Caller, required: Role) -> Result<(), AccessError> {
        if caller.role != required {
            tracing::warn!(
                account_id = %caller.account_id,
                your_role = %caller.role,
                required_role = %required,
                "role gate rejected caller"
            );
            return Err(ForbiddenError::RoleMismatch {
                required,
                actual: caller.role,
            }
            .into());
        }

        let active = self
            .directory
            .account(caller.account_id)?
            .is_some_and(|account| account.status.is_active());

        if !active {
            tracing::warn!(account_id = %caller.account_id, "inactive account rejected");
            return Err(ForbiddenError::AccountInactive.into());
        }

        Ok(())
    }
}
