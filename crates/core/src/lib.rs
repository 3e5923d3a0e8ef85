//! `bizops-core`: shared building blocks for the reporting workspace.
//!
//! Pure types only: identifiers, money, and the storage error every
//! read-side collaborator reports through.

pub mod error;
pub mod id;
pub mod money;

pub use error::{StoreError, StoreResult};
pub use id::{AccountId, ExpenseId, ProductId, SaleId};
pub use money::Money;
