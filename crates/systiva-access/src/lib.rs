//! Systiva Access — the access-control scoping and assignment
//! consistency engine.
//!
//! Manages Users, Groups, and Roles across the two-tier tenancy model
//! (one global catalog plus per-account catalogs) on a backing store
//! with no joins and no multi-record transactions. The engine enforces
//! membership consistency, prevents cross-tenant group leakage, and
//! degrades gracefully under partial failure in bulk flows.

pub mod bulk;
pub mod error;
mod membership;
pub mod scope;
pub mod service;

pub use bulk::{AssignGroupsInput, AssignmentOutcome, GroupSpec};
pub use error::AccessError;
pub use scope::{GroupScope, ScopeCheck};
pub use service::AccessService;
