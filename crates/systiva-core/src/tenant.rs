//! Tenant context and catalog addressing.
//!
//! The engine manages two tiers of catalogs: the single global catalog
//! (the "Systiva" tenant) and one catalog per account. Every store call
//! addresses records by `(TenantKey, id)`, never by a bare id.

use serde::{Deserialize, Serialize};

/// Partition key of the global catalog.
pub const GLOBAL_TENANT: &str = "systiva";

/// Storage partition a record lives in: the global catalog or one
/// account's catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TenantKey {
    Global,
    Account(String),
}

impl TenantKey {
    /// The partition string records are keyed under.
    pub fn storage_key(&self) -> &str {
        match self {
            TenantKey::Global => GLOBAL_TENANT,
            TenantKey::Account(id) => id,
        }
    }

    /// Inverse of [`TenantKey::storage_key`].
    pub fn from_storage_key(key: &str) -> TenantKey {
        if key == GLOBAL_TENANT {
            TenantKey::Global
        } else {
            TenantKey::Account(key.to_owned())
        }
    }

    pub fn is_global(&self) -> bool {
        matches!(self, TenantKey::Global)
    }
}

impl std::fmt::Display for TenantKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.storage_key())
    }
}

/// Which catalog a request operates against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TenantScope {
    Global,
    Account {
        account_id: String,
        account_name: String,
    },
}

/// Listing-time narrowing by enterprise. Never a storage partition:
/// groups carry an enterprise tag and list operations match against it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnterpriseFilter {
    pub enterprise_id: String,
    pub enterprise_name: String,
}

/// Resolved tenant context for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantContext {
    pub scope: TenantScope,
    pub enterprise: Option<EnterpriseFilter>,
}

/// The upstream client encodes "absent" as a missing field, an empty
/// string, or the literal string "null". Preserved as-is for
/// compatibility; no other module re-implements these checks.
fn is_unset(value: Option<&str>) -> bool {
    match value {
        None => true,
        Some(v) => v.is_empty() || v == "null",
    }
}

impl TenantContext {
    /// Derive the tenant context from the raw request fields.
    ///
    /// The context is global when `account_id` or `account_name` is
    /// unset, or when `account_name` is "systiva" (any case). An
    /// enterprise filter is attached only when both enterprise fields
    /// carry real values and the name is not "global" (any case); a
    /// "global" enterprise name means no filter, same as absent.
    pub fn resolve(
        account_id: Option<&str>,
        account_name: Option<&str>,
        enterprise_id: Option<&str>,
        enterprise_name: Option<&str>,
    ) -> TenantContext {
        let scope = match (account_id, account_name) {
            (Some(id), Some(name))
                if !is_unset(account_id)
                    && !is_unset(account_name)
                    && !name.eq_ignore_ascii_case(GLOBAL_TENANT) =>
            {
                TenantScope::Account {
                    account_id: id.to_owned(),
                    account_name: name.to_owned(),
                }
            }
            _ => TenantScope::Global,
        };

        let enterprise = match (enterprise_id, enterprise_name) {
            (Some(id), Some(name))
                if !is_unset(enterprise_id)
                    && !is_unset(enterprise_name)
                    && !name.eq_ignore_ascii_case("global") =>
            {
                Some(EnterpriseFilter {
                    enterprise_id: id.to_owned(),
                    enterprise_name: name.to_owned(),
                })
            }
            _ => None,
        };

        TenantContext { scope, enterprise }
    }

    /// Context for the global catalog with no enterprise filter.
    pub fn global() -> TenantContext {
        TenantContext {
            scope: TenantScope::Global,
            enterprise: None,
        }
    }

    /// The storage partition this context addresses.
    pub fn tenant_key(&self) -> TenantKey {
        match &self.scope {
            TenantScope::Global => TenantKey::Global,
            TenantScope::Account { account_id, .. } => TenantKey::Account(account_id.clone()),
        }
    }

    pub fn is_global(&self) -> bool {
        matches!(self.scope, TenantScope::Global)
    }
}
