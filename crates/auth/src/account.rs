//! Read-only view of the external user store.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

use bizops_core::{AccountId, StoreResult};

use crate::Role;

/// Account status as recorded by the user store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    #[default]
    Active,
    Inactive,
}

impl AccountStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, AccountStatus::Active)
    }
}

impl core::fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            AccountStatus::Active => write!(f, "active"),
            AccountStatus::Inactive => write!(f, "inactive"),
        }
    }
}

/// The slice of an account the reporting core reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    pub id: AccountId,
    pub role: Role,
    pub status: AccountStatus,
}

/// Lookup into the user store.
pub trait AccountDirectory: Send + Sync {
    /// `Ok(None)` when no such account exists.
    fn account(&self, id: AccountId) -> StoreResult<Option<AccountRecord>>;
}

impl<S> AccountDirectory for Arc<S>
where
    S: AccountDirectory + ?Sized,
{
    fn account(&self, id: AccountId) -> StoreResult<Option<AccountRecord>> {
        (**self).account(id)
    }
}

/// In-memory user store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryAccountDirectory {
    inner: RwLock<HashMap<AccountId, AccountRecord>>,
}

impl InMemoryAccountDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&self, record: AccountRecord) {
        self.write().insert(record.id, record);
    }

    pub fn set_status(&self, id: AccountId, status: AccountStatus) {
        if let Some(record) = self.write().get_mut(&id) {
            record.status = status;
        }
    }

    // Single-entry inserts cannot leave the map half-updated, so a poisoned
    // lock is recovered rather than reported.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<AccountId, AccountRecord>> {
        self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<AccountId, AccountRecord>> {
        self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl AccountDirectory for InMemoryAccountDirectory {
    fn account(&self, id: AccountId) -> StoreResult<Option<AccountRecord>> {
        Ok(self.read().get(&id).cloned())
    }
}
