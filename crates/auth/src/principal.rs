use serde::{Deserialize, Serialize};

use bizops_core::AccountId;

use crate::Role;

/// The authenticated identity making a request.
///
/// Built from verified token claims by the transport layer and passed
/// explicitly to every component that needs it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Caller {
    pub account_id: AccountId,
    pub role: Role,
}

impl Caller {
    pub fn new(account_id: AccountId, role: Role) -> Self {
        Self { account_id, role }
    }

    /// Stable key identifying this caller as a rate-limited client.
    pub fn client_key(&self) -> String {
        format!("account:{}", self.account_id)
    }
}
