use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Role held by an account in the user store.
///
/// Each dashboard is gated on exactly one role; there is no hierarchy and no
/// role implies another.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Sales,
    Finance,
    Developer,
    Investor,
    IwbPartner,
    Client,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl Role {
    pub const ALL: [Role; 6] = [
        Role::Sales,
        Role::Finance,
        Role::Developer,
        Role::Investor,
        Role::IwbPartner,
        Role::Client,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Sales => "sales",
            Role::Finance => "finance",
            Role::Developer => "developer",
            Role::Investor => "investor",
            Role::IwbPartner => "iwb_partner",
            Role::Client => "client",
        }
    }

    /// Human-facing name, as shown in access-denied messages.
    pub fn title(&self) -> &'static str {
        match self {
            Role::Sales => "Sales",
            Role::Finance => "Finance",
            Role::Developer => "Developer",
            Role::Investor => "Investor",
            Role::IwbPartner => "IWB Partner",
            Role::Client => "Client",
        }
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
