//! Catalog store contracts.
//!
//! One trait per entity type, implemented against whatever persistence
//! backend is configured. Every operation addresses a single tenant
//! partition. No cross-entity integrity is enforced at this layer; that
//! is the membership manager's job. Implementations provide single-record
//! atomicity only, and the engine never assumes multi-record transactions.

use uuid::Uuid;

use crate::error::SystivaResult;
use crate::models::{
    group::{CreateGroup, Group, UpdateGroup},
    role::{CreateRole, Role, UpdateRole},
    user::{CreateUser, UpdateUser, User},
};
use crate::tenant::TenantKey;

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

pub trait UserStore: Send + Sync {
    fn create(
        &self,
        tenant: &TenantKey,
        input: CreateUser,
    ) -> impl Future<Output = SystivaResult<User>> + Send;
    fn get_by_id(
        &self,
        tenant: &TenantKey,
        id: Uuid,
    ) -> impl Future<Output = SystivaResult<User>> + Send;
    fn get_by_email(
        &self,
        tenant: &TenantKey,
        email: &str,
    ) -> impl Future<Output = SystivaResult<User>> + Send;
    fn update(
        &self,
        tenant: &TenantKey,
        id: Uuid,
        input: UpdateUser,
    ) -> impl Future<Output = SystivaResult<User>> + Send;
    fn delete(
        &self,
        tenant: &TenantKey,
        id: Uuid,
    ) -> impl Future<Output = SystivaResult<()>> + Send;
    fn list(
        &self,
        tenant: &TenantKey,
        pagination: Pagination,
    ) -> impl Future<Output = SystivaResult<PaginatedResult<User>>> + Send;
}

pub trait GroupStore: Send + Sync {
    fn create(
        &self,
        tenant: &TenantKey,
        input: CreateGroup,
    ) -> impl Future<Output = SystivaResult<Group>> + Send;
    fn get_by_id(
        &self,
        tenant: &TenantKey,
        id: Uuid,
    ) -> impl Future<Output = SystivaResult<Group>> + Send;
    /// Exact-name lookup within one tenant. Group names are unique per
    /// tenant, so this returns at most one record.
    fn get_by_name(
        &self,
        tenant: &TenantKey,
        name: &str,
    ) -> impl Future<Output = SystivaResult<Group>> + Send;
    fn update(
        &self,
        tenant: &TenantKey,
        id: Uuid,
        input: UpdateGroup,
    ) -> impl Future<Output = SystivaResult<Group>> + Send;
    fn delete(
        &self,
        tenant: &TenantKey,
        id: Uuid,
    ) -> impl Future<Output = SystivaResult<()>> + Send;
    fn list(
        &self,
        tenant: &TenantKey,
        pagination: Pagination,
    ) -> impl Future<Output = SystivaResult<PaginatedResult<Group>>> + Send;
}

pub trait RoleStore: Send + Sync {
    fn create(
        &self,
        tenant: &TenantKey,
        input: CreateRole,
    ) -> impl Future<Output = SystivaResult<Role>> + Send;
    fn get_by_id(
        &self,
        tenant: &TenantKey,
        id: Uuid,
    ) -> impl Future<Output = SystivaResult<Role>> + Send;
    fn update(
        &self,
        tenant: &TenantKey,
        id: Uuid,
        input: UpdateRole,
    ) -> impl Future<Output = SystivaResult<Role>> + Send;
    fn delete(
        &self,
        tenant: &TenantKey,
        id: Uuid,
    ) -> impl Future<Output = SystivaResult<()>> + Send;
    fn list(
        &self,
        tenant: &TenantKey,
        pagination: Pagination,
    ) -> impl Future<Output = SystivaResult<PaginatedResult<Role>>> + Send;
}
