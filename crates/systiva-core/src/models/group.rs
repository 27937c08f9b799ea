//! Group domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::tenant::TenantKey;

/// A named set of roles that can be assigned to users.
///
/// Group names are unique within their tenant. That uniqueness is what
/// makes cross-tenant fallback matching possible: a global group and an
/// account-local group with the same name are distinct entities, and the
/// account-local one wins when assigning inside that account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: Uuid,
    pub tenant: TenantKey,
    pub name: String,
    pub description: String,
    pub entity: Option<String>,
    pub product: Option<String>,
    pub service: Option<String>,
    /// Enterprise tag matched by the listing-time enterprise filter.
    pub enterprise_id: Option<String>,
    /// Ids of assigned roles, deduplicated.
    pub assigned_roles: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGroup {
    pub name: String,
    pub description: Option<String>,
    pub entity: Option<String>,
    pub product: Option<String>,
    pub service: Option<String>,
    pub enterprise_id: Option<String>,
    pub assigned_roles: Option<Vec<Uuid>>,
}

/// Partial update: only supplied fields change.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateGroup {
    pub name: Option<String>,
    pub description: Option<String>,
    pub entity: Option<String>,
    pub product: Option<String>,
    pub service: Option<String>,
    pub enterprise_id: Option<String>,
    pub assigned_roles: Option<Vec<Uuid>>,
}

impl UpdateGroup {
    /// True when no field is supplied; the engine skips empty updates.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.entity.is_none()
            && self.product.is_none()
            && self.service.is_none()
            && self.enterprise_id.is_none()
            && self.assigned_roles.is_none()
    }
}
