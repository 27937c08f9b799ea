//! User domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::tenant::TenantKey;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum UserStatus {
    Active,
    Inactive,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    /// Home catalog. A user never moves between tenants.
    pub tenant: TenantKey,
    pub first_name: String,
    pub last_name: String,
    /// Unique within the user's tenant.
    pub email: String,
    pub status: UserStatus,
    /// Service identities that log in with machine credentials.
    pub technical_user: bool,
    /// Ids of assigned groups. May reference groups that have since been
    /// deleted; readers treat missing lookups as "group removed".
    pub assigned_groups: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a user. Group membership is not part of
/// the create payload; assignments go through the validated membership
/// operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub status: Option<UserStatus>,
    pub technical_user: Option<bool>,
}

/// Partial update: only supplied fields change.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateUser {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub status: Option<UserStatus>,
    pub technical_user: Option<bool>,
    /// Written only by the membership manager after validation.
    pub assigned_groups: Option<Vec<Uuid>>,
}
