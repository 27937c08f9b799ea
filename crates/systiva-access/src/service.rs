//! Catalog CRUD and membership operations.
//!
//! `AccessService` is generic over the store implementations so the
//! engine has no dependency on the database crate; the caller selects
//! the backend at startup and injects it through the constructor.

use systiva_core::error::{SystivaError, SystivaResult};
use systiva_core::models::group::{CreateGroup, Group, UpdateGroup};
use systiva_core::models::role::{CreateRole, Role, UpdateRole};
use systiva_core::models::user::{CreateUser, UpdateUser, User};
use systiva_core::store::{GroupStore, Pagination, RoleStore, UserStore};
use systiva_core::tenant::{TenantContext, TenantKey};
use tracing::warn;
use uuid::Uuid;

use crate::bulk::AssignmentOutcome;
use crate::error::AccessError;
use crate::membership::{append_if_absent, dedup_ids, difference};

/// Page size used when scanning a full tenant partition.
const SCAN_PAGE: u64 = 500;

/// The access-control engine over one set of catalog stores.
pub struct AccessService<U: UserStore, G: GroupStore, R: RoleStore> {
    pub(crate) users: U,
    pub(crate) groups: G,
    pub(crate) roles: R,
}

impl<U: UserStore, G: GroupStore, R: RoleStore> AccessService<U, G, R> {
    pub fn new(users: U, groups: G, roles: R) -> Self {
        Self {
            users,
            groups,
            roles,
        }
    }

    // -------------------------------------------------------------------
    // Users
    // -------------------------------------------------------------------

    pub async fn create_user(&self, ctx: &TenantContext, input: CreateUser) -> SystivaResult<User> {
        if input.email.is_empty() {
            return Err(SystivaError::Validation {
                message: "user email is required".into(),
            });
        }

        let tenant = ctx.tenant_key();
        match self.users.get_by_email(&tenant, &input.email).await {
            Ok(_) => {
                return Err(SystivaError::AlreadyExists {
                    entity: format!("user with email '{}'", input.email),
                });
            }
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }

        self.users.create(&tenant, input).await
    }

    pub async fn get_user(&self, ctx: &TenantContext, id: Uuid) -> SystivaResult<User> {
        self.users.get_by_id(&ctx.tenant_key(), id).await
    }

    pub async fn list_users(&self, ctx: &TenantContext) -> SystivaResult<Vec<User>> {
        self.scan_users(&ctx.tenant_key()).await
    }

    /// Partial update. Group membership cannot be written through this
    /// path; it only changes via the validated membership operations.
    pub async fn update_user(
        &self,
        ctx: &TenantContext,
        id: Uuid,
        mut input: UpdateUser,
    ) -> SystivaResult<User> {
        input.assigned_groups = None;

        let tenant = ctx.tenant_key();
        if let Some(email) = &input.email {
            if email.is_empty() {
                return Err(SystivaError::Validation {
                    message: "user email must not be empty".into(),
                });
            }
            match self.users.get_by_email(&tenant, email).await {
                Ok(other) if other.id != id => {
                    return Err(SystivaError::AlreadyExists {
                        entity: format!("user with email '{email}'"),
                    });
                }
                Ok(_) => {}
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(e),
            }
        }

        self.users.update(&tenant, id, input).await
    }

    pub async fn delete_user(&self, ctx: &TenantContext, id: Uuid) -> SystivaResult<()> {
        self.users.delete(&ctx.tenant_key(), id).await
    }

    // -------------------------------------------------------------------
    // Groups
    // -------------------------------------------------------------------

    pub async fn create_group(
        &self,
        ctx: &TenantContext,
        mut input: CreateGroup,
    ) -> SystivaResult<Group> {
        if input.name.is_empty() {
            return Err(SystivaError::Validation {
                message: "group name is required".into(),
            });
        }

        let tenant = ctx.tenant_key();
        match self.groups.get_by_name(&tenant, &input.name).await {
            Ok(_) => {
                return Err(SystivaError::AlreadyExists {
                    entity: format!("group '{}' in tenant '{tenant}'", input.name),
                });
            }
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }

        input.assigned_roles = input.assigned_roles.map(dedup_ids);
        self.groups.create(&tenant, input).await
    }

    pub async fn get_group(&self, ctx: &TenantContext, id: Uuid) -> SystivaResult<Group> {
        self.groups.get_by_id(&ctx.tenant_key(), id).await
    }

    /// List the tenant's groups, narrowed by the context's enterprise
    /// filter when present.
    pub async fn list_groups(&self, ctx: &TenantContext) -> SystivaResult<Vec<Group>> {
        let mut groups = self.scan_groups(&ctx.tenant_key()).await?;
        if let Some(filter) = &ctx.enterprise {
            groups.retain(|g| g.enterprise_id.as_deref() == Some(filter.enterprise_id.as_str()));
        }
        Ok(groups)
    }

    pub async fn update_group(
        &self,
        ctx: &TenantContext,
        id: Uuid,
        mut input: UpdateGroup,
    ) -> SystivaResult<Group> {
        let tenant = ctx.tenant_key();
        if let Some(name) = &input.name {
            if name.is_empty() {
                return Err(SystivaError::Validation {
                    message: "group name must not be empty".into(),
                });
            }
            match self.groups.get_by_name(&tenant, name).await {
                Ok(other) if other.id != id => {
                    return Err(SystivaError::AlreadyExists {
                        entity: format!("group '{name}' in tenant '{tenant}'"),
                    });
                }
                Ok(_) => {}
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(e),
            }
        }

        input.assigned_roles = input.assigned_roles.map(dedup_ids);
        self.groups.update(&tenant, id, input).await
    }

    /// Delete a group. User references to it are left in place; readers
    /// treat the dangling id as "group removed".
    pub async fn delete_group(&self, ctx: &TenantContext, id: Uuid) -> SystivaResult<()> {
        self.groups.delete(&ctx.tenant_key(), id).await
    }

    // -------------------------------------------------------------------
    // Roles
    // -------------------------------------------------------------------

    pub async fn create_role(&self, ctx: &TenantContext, input: CreateRole) -> SystivaResult<Role> {
        if input.name.is_empty() {
            return Err(SystivaError::Validation {
                message: "role name is required".into(),
            });
        }
        self.roles.create(&ctx.tenant_key(), input).await
    }

    pub async fn get_role(&self, ctx: &TenantContext, id: Uuid) -> SystivaResult<Role> {
        self.roles.get_by_id(&ctx.tenant_key(), id).await
    }

    pub async fn list_roles(&self, ctx: &TenantContext) -> SystivaResult<Vec<Role>> {
        self.scan_roles(&ctx.tenant_key()).await
    }

    pub async fn update_role(
        &self,
        ctx: &TenantContext,
        id: Uuid,
        input: UpdateRole,
    ) -> SystivaResult<Role> {
        self.roles.update(&ctx.tenant_key(), id, input).await
    }

    pub async fn delete_role(&self, ctx: &TenantContext, id: Uuid) -> SystivaResult<()> {
        self.roles.delete(&ctx.tenant_key(), id).await
    }

    // -------------------------------------------------------------------
    // Membership: user <-> group
    // -------------------------------------------------------------------

    /// Additive, idempotent assignment of one group to a user.
    ///
    /// The group id is scope-validated first; a global group referenced
    /// from an account context is substituted with the same-named
    /// account-local group when one exists, and rejected otherwise.
    pub async fn assign_group(
        &self,
        ctx: &TenantContext,
        user_id: Uuid,
        group_id: Uuid,
    ) -> SystivaResult<User> {
        let tenant = ctx.tenant_key();
        let check = self.validate_group_scope(ctx, group_id).await?;

        let resolved = if check.is_valid {
            check.group.map(|g| g.id).unwrap_or(group_id)
        } else if let Some(group) = check.group {
            match self.find_account_group_by_name(ctx, &group.name).await? {
                Some(local) => {
                    warn!(
                        requested = %group.id,
                        substituted = %local.id,
                        name = %group.name,
                        "substituted global group with account-local equivalent"
                    );
                    local.id
                }
                None => {
                    return Err(AccessError::GroupScopeViolation {
                        group_id,
                        tenant: tenant.clone(),
                    }
                    .into());
                }
            }
        } else {
            return Err(SystivaError::not_found("group", group_id));
        };

        let user = self.users.get_by_id(&tenant, user_id).await?;
        match append_if_absent(&user.assigned_groups, resolved) {
            Some(next) => {
                self.users
                    .update(
                        &tenant,
                        user_id,
                        UpdateUser {
                            assigned_groups: Some(next),
                            ..Default::default()
                        },
                    )
                    .await
            }
            None => Ok(user),
        }
    }

    /// Authoritative replacement of a user's group membership.
    ///
    /// Each id is scope-validated with fallback substitution; ids that
    /// cannot be resolved are dropped with a warning. The replace is
    /// refused outright when a non-empty request validates down to
    /// nothing, so a failed batch can never silently strip membership.
    pub async fn assign_groups(
        &self,
        ctx: &TenantContext,
        user_id: Uuid,
        group_ids: Vec<Uuid>,
    ) -> SystivaResult<AssignmentOutcome> {
        let tenant = ctx.tenant_key();
        let requested = group_ids.len();
        let mut warnings = Vec::new();
        let mut final_ids: Vec<Uuid> = Vec::new();

        for group_id in group_ids {
            if let Some(resolved) = self
                .resolve_assignable_group(ctx, group_id, &mut warnings)
                .await?
            {
                if !final_ids.contains(&resolved) {
                    final_ids.push(resolved);
                }
            }
        }

        self.replace_user_groups(&tenant, user_id, requested, final_ids, warnings)
            .await
    }

    /// Final step shared by the id-based replace and the bulk
    /// orchestrator: guard against an empty replace, then write.
    ///
    /// The read-modify-write here is not atomic; concurrent writers to
    /// the same user's membership are last-write-wins, as provided by
    /// the backing store.
    pub(crate) async fn replace_user_groups(
        &self,
        tenant: &TenantKey,
        user_id: Uuid,
        requested: usize,
        final_ids: Vec<Uuid>,
        warnings: Vec<String>,
    ) -> SystivaResult<AssignmentOutcome> {
        if final_ids.is_empty() && requested > 0 {
            return Err(AccessError::EmptyAssignment { requested }.into());
        }

        self.users
            .update(
                tenant,
                user_id,
                UpdateUser {
                    assigned_groups: Some(final_ids.clone()),
                    ..Default::default()
                },
            )
            .await?;

        for warning in &warnings {
            warn!(user = %user_id, tenant = %tenant, "{warning}");
        }

        Ok(AssignmentOutcome {
            requested,
            assigned: final_ids.len(),
            assigned_ids: final_ids,
            warnings,
        })
    }

    pub async fn remove_group(
        &self,
        ctx: &TenantContext,
        user_id: Uuid,
        group_id: Uuid,
    ) -> SystivaResult<User> {
        self.remove_groups(ctx, user_id, &[group_id]).await
    }

    pub async fn remove_groups(
        &self,
        ctx: &TenantContext,
        user_id: Uuid,
        group_ids: &[Uuid],
    ) -> SystivaResult<User> {
        let tenant = ctx.tenant_key();
        let user = self.users.get_by_id(&tenant, user_id).await?;

        let next = difference(&user.assigned_groups, group_ids);
        if next.len() == user.assigned_groups.len() {
            return Ok(user);
        }

        self.users
            .update(
                &tenant,
                user_id,
                UpdateUser {
                    assigned_groups: Some(next),
                    ..Default::default()
                },
            )
            .await
    }

    // -------------------------------------------------------------------
    // Membership: group <-> role
    // -------------------------------------------------------------------

    /// Additive, idempotent assignment of one role to a group. The role
    /// id must resolve in the group's own tenant or the global catalog.
    pub async fn assign_role(
        &self,
        ctx: &TenantContext,
        group_id: Uuid,
        role_id: Uuid,
    ) -> SystivaResult<Group> {
        let tenant = ctx.tenant_key();
        let group = self.groups.get_by_id(&tenant, group_id).await?;

        if self.resolve_role(&tenant, role_id).await?.is_none() {
            return Err(SystivaError::not_found("role", role_id));
        }

        match append_if_absent(&group.assigned_roles, role_id) {
            Some(next) => {
                self.groups
                    .update(
                        &tenant,
                        group_id,
                        UpdateGroup {
                            assigned_roles: Some(next),
                            ..Default::default()
                        },
                    )
                    .await
            }
            None => Ok(group),
        }
    }

    /// Authoritative replacement of a group's role list, with the same
    /// empty-replace guard as the group assignment path.
    pub async fn assign_roles(
        &self,
        ctx: &TenantContext,
        group_id: Uuid,
        role_ids: Vec<Uuid>,
    ) -> SystivaResult<AssignmentOutcome> {
        let tenant = ctx.tenant_key();
        let requested = role_ids.len();
        let mut warnings = Vec::new();
        let mut final_ids: Vec<Uuid> = Vec::new();

        for role_id in dedup_ids(role_ids) {
            match self.resolve_role(&tenant, role_id).await? {
                Some(role) => final_ids.push(role.id),
                None => warnings.push(format!(
                    "role {role_id} was not found in tenant '{tenant}' or the global catalog \
                     and was dropped from the assignment"
                )),
            }
        }

        if final_ids.is_empty() && requested > 0 {
            return Err(AccessError::EmptyAssignment { requested }.into());
        }

        self.groups
            .update(
                &tenant,
                group_id,
                UpdateGroup {
                    assigned_roles: Some(final_ids.clone()),
                    ..Default::default()
                },
            )
            .await?;

        for warning in &warnings {
            warn!(group = %group_id, tenant = %tenant, "{warning}");
        }

        Ok(AssignmentOutcome {
            requested,
            assigned: final_ids.len(),
            assigned_ids: final_ids,
            warnings,
        })
    }

    pub async fn remove_role(
        &self,
        ctx: &TenantContext,
        group_id: Uuid,
        role_id: Uuid,
    ) -> SystivaResult<Group> {
        self.remove_roles(ctx, group_id, &[role_id]).await
    }

    pub async fn remove_roles(
        &self,
        ctx: &TenantContext,
        group_id: Uuid,
        role_ids: &[Uuid],
    ) -> SystivaResult<Group> {
        let tenant = ctx.tenant_key();
        let group = self.groups.get_by_id(&tenant, group_id).await?;

        let next = difference(&group.assigned_roles, role_ids);
        if next.len() == group.assigned_roles.len() {
            return Ok(group);
        }

        self.groups
            .update(
                &tenant,
                group_id,
                UpdateGroup {
                    assigned_roles: Some(next),
                    ..Default::default()
                },
            )
            .await
    }

    // -------------------------------------------------------------------
    // Partition scans
    // -------------------------------------------------------------------

    async fn scan_users(&self, tenant: &TenantKey) -> SystivaResult<Vec<User>> {
        let mut items = Vec::new();
        let mut offset = 0;
        loop {
            let page = self
                .users
                .list(
                    tenant,
                    Pagination {
                        offset,
                        limit: SCAN_PAGE,
                    },
                )
                .await?;
            let fetched = page.items.len() as u64;
            items.extend(page.items);
            if fetched < SCAN_PAGE {
                return Ok(items);
            }
            offset += fetched;
        }
    }

    async fn scan_groups(&self, tenant: &TenantKey) -> SystivaResult<Vec<Group>> {
        let mut items = Vec::new();
        let mut offset = 0;
        loop {
            let page = self
                .groups
                .list(
                    tenant,
                    Pagination {
                        offset,
                        limit: SCAN_PAGE,
                    },
                )
                .await?;
            let fetched = page.items.len() as u64;
            items.extend(page.items);
            if fetched < SCAN_PAGE {
                return Ok(items);
            }
            offset += fetched;
        }
    }

    async fn scan_roles(&self, tenant: &TenantKey) -> SystivaResult<Vec<Role>> {
        let mut items = Vec::new();
        let mut offset = 0;
        loop {
            let page = self
                .roles
                .list(
                    tenant,
                    Pagination {
                        offset,
                        limit: SCAN_PAGE,
                    },
                )
                .await?;
            let fetched = page.items.len() as u64;
            items.extend(page.items);
            if fetched < SCAN_PAGE {
                return Ok(items);
            }
            offset += fetched;
        }
    }

    /// Resolve a role id in the group's own tenant first, then the
    /// global catalog. A role id is only meaningful within the catalog
    /// it was created in.
    async fn resolve_role(&self, tenant: &TenantKey, role_id: Uuid) -> SystivaResult<Option<Role>> {
        match self.roles.get_by_id(tenant, role_id).await {
            Ok(role) => return Ok(Some(role)),
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }

        if !tenant.is_global() {
            match self.roles.get_by_id(&TenantKey::Global, role_id).await {
                Ok(role) => return Ok(Some(role)),
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(e),
            }
        }

        Ok(None)
    }
}
