//! `bizops-auth`: role gate and identity boundary.
//!
//! This crate is decoupled from HTTP and storage: the user store is reached
//! through [`AccountDirectory`], and tokens are verified, never issued.

pub mod account;
pub mod authorize;
pub mod claims;
pub mod jwt;
pub mod principal;
pub mod roles;

pub use account::{AccountDirectory, AccountRecord, AccountStatus, InMemoryAccountDirectory};
pub use authorize::{AccessError, AccessGate, ForbiddenError};
pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use jwt::{Hs256JwtValidator, JwtError, JwtValidator};
pub use principal::Caller;
pub use roles::{Role, UnknownRole};
