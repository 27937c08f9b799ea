//! Bulk "create-and-assign-by-name" orchestration.
//!
//! Callers submit group specifications whose ids may be client-side
//! placeholders, so groups are resolved by name within the target
//! tenant: existing groups are reused (and sparsely updated), missing
//! ones are created, and the final deduplicated id set replaces the
//! user's membership. Per-item failures become warnings; only a batch
//! that validates down to nothing is refused.

use serde::{Deserialize, Serialize};
use systiva_core::error::{SystivaError, SystivaResult};
use systiva_core::models::group::{CreateGroup, Group, UpdateGroup};
use systiva_core::models::user::{CreateUser, User};
use systiva_core::store::{GroupStore, RoleStore, UserStore};
use systiva_core::tenant::{TenantContext, TenantKey};
use tracing::debug;
use uuid::Uuid;

use crate::error::AccessError;
use crate::membership::dedup_ids;
use crate::service::AccessService;

/// One requested group in a bulk assignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupSpec {
    /// Caller-supplied id, possibly a client-side placeholder that was
    /// never persisted. Kept for logging only; lookups go by name.
    pub id: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub entity: Option<String>,
    pub product: Option<String>,
    pub service: Option<String>,
    pub enterprise_id: Option<String>,
    pub roles: Option<Vec<Uuid>>,
}

/// Group assignment request as the transport hands it over: exactly one
/// of the fields is expected to be populated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssignGroupsInput {
    pub group_id: Option<Uuid>,
    pub group_ids: Option<Vec<Uuid>>,
    pub groups: Option<Vec<GroupSpec>>,
}

/// Result of a (possibly partial) assignment.
#[derive(Debug)]
pub struct AssignmentOutcome {
    /// Number of items the caller asked for.
    pub requested: usize,
    /// Number of ids actually assigned after validation and dedup.
    pub assigned: usize,
    pub assigned_ids: Vec<Uuid>,
    pub warnings: Vec<String>,
}

/// Build the sparse update for an existing group from a specification:
/// only fields that are supplied, non-empty, and different from the
/// stored value. A blank description in a stale client payload must
/// never wipe a stored one.
fn spec_update(existing: &Group, spec: &GroupSpec) -> UpdateGroup {
    let mut update = UpdateGroup::default();

    if let Some(description) = &spec.description {
        if !description.is_empty() && *description != existing.description {
            update.description = Some(description.clone());
        }
    }
    if let Some(entity) = &spec.entity {
        if !entity.is_empty() && existing.entity.as_deref() != Some(entity.as_str()) {
            update.entity = Some(entity.clone());
        }
    }
    if let Some(product) = &spec.product {
        if !product.is_empty() && existing.product.as_deref() != Some(product.as_str()) {
            update.product = Some(product.clone());
        }
    }
    if let Some(service) = &spec.service {
        if !service.is_empty() && existing.service.as_deref() != Some(service.as_str()) {
            update.service = Some(service.clone());
        }
    }
    if let Some(enterprise_id) = &spec.enterprise_id {
        if !enterprise_id.is_empty()
            && existing.enterprise_id.as_deref() != Some(enterprise_id.as_str())
        {
            update.enterprise_id = Some(enterprise_id.clone());
        }
    }
    if let Some(roles) = &spec.roles {
        let roles = dedup_ids(roles.clone());
        if !roles.is_empty() && roles != existing.assigned_roles {
            update.assigned_roles = Some(roles);
        }
    }

    update
}

impl<U: UserStore, G: GroupStore, R: RoleStore> AccessService<U, G, R> {
    /// Dispatch a group assignment request to the matching flow:
    /// specifications run the full create-and-assign-by-name pipeline,
    /// bare id lists run the validated replace, a single id runs the
    /// additive assign. A request carrying none of them is malformed.
    pub async fn apply_group_assignment(
        &self,
        ctx: &TenantContext,
        user_id: Uuid,
        input: AssignGroupsInput,
    ) -> SystivaResult<AssignmentOutcome> {
        if let Some(specs) = input.groups {
            return self.create_and_assign_groups(ctx, user_id, specs).await;
        }
        if let Some(group_ids) = input.group_ids {
            return self.assign_groups(ctx, user_id, group_ids).await;
        }
        if let Some(group_id) = input.group_id {
            let user = self.assign_group(ctx, user_id, group_id).await?;
            return Ok(AssignmentOutcome {
                requested: 1,
                assigned: 1,
                assigned_ids: user.assigned_groups,
                warnings: Vec::new(),
            });
        }
        Err(AccessError::MissingGroupInput.into())
    }

    /// The create-and-assign-by-name workflow.
    ///
    /// Specifications are processed sequentially, in input order, since
    /// later ones depend on the dedup state established by earlier
    /// ones. Nothing is rolled back if the batch is cut short: every
    /// completed create or update is individually consistent.
    pub async fn create_and_assign_groups(
        &self,
        ctx: &TenantContext,
        user_id: Uuid,
        specs: Vec<GroupSpec>,
    ) -> SystivaResult<AssignmentOutcome> {
        let tenant = ctx.tenant_key();
        let requested = specs.len();
        let mut warnings = Vec::new();
        let mut final_ids: Vec<Uuid> = Vec::new();

        for spec in specs {
            if spec.name.is_empty() {
                warnings.push(format!(
                    "group specification without a name was skipped (client id: {})",
                    spec.id.as_deref().unwrap_or("none"),
                ));
                continue;
            }

            let resolved = match self.groups.get_by_name(&tenant, &spec.name).await {
                Ok(existing) => {
                    let update = spec_update(&existing, &spec);
                    if !update.is_empty() {
                        match self.groups.update(&tenant, existing.id, update).await {
                            Ok(_) => {}
                            Err(SystivaError::Store(e)) => return Err(SystivaError::Store(e)),
                            // The group itself is still assignable; keep
                            // it and record the failed refresh.
                            Err(e) => warnings.push(format!(
                                "failed to update existing group '{}': {e}",
                                spec.name,
                            )),
                        }
                    }
                    Some(existing.id)
                }
                Err(e) if e.is_not_found() => {
                    let create = CreateGroup {
                        name: spec.name.clone(),
                        description: spec.description.clone(),
                        entity: spec.entity.clone(),
                        product: spec.product.clone(),
                        service: spec.service.clone(),
                        enterprise_id: spec.enterprise_id.clone(),
                        assigned_roles: spec.roles.clone().map(dedup_ids),
                    };
                    match self.groups.create(&tenant, create).await {
                        Ok(group) => Some(group.id),
                        Err(SystivaError::Store(e)) => return Err(SystivaError::Store(e)),
                        Err(e) => {
                            warnings.push(format!("failed to create group '{}': {e}", spec.name));
                            None
                        }
                    }
                }
                Err(SystivaError::Store(e)) => return Err(SystivaError::Store(e)),
                Err(e) => {
                    warnings.push(format!("failed to look up group '{}': {e}", spec.name));
                    None
                }
            };

            if let Some(id) = resolved {
                if final_ids.contains(&id) {
                    debug!(
                        group = %id,
                        name = %spec.name,
                        "specification resolved to an already-seen group; skipped"
                    );
                } else {
                    final_ids.push(id);
                }
            }
        }

        self.replace_user_groups(&tenant, user_id, requested, final_ids, warnings)
            .await
    }

    /// Create a user and run their requested groups through the
    /// create-and-assign-by-name pipeline in one call.
    ///
    /// The user create is not rolled back if the assignment is refused;
    /// the caller is left with a user that has no group membership.
    pub async fn create_user_with_groups(
        &self,
        ctx: &TenantContext,
        input: CreateUser,
        specs: Vec<GroupSpec>,
    ) -> SystivaResult<(User, AssignmentOutcome)> {
        let user = self.create_user(ctx, input).await?;

        if specs.is_empty() {
            return Ok((
                user,
                AssignmentOutcome {
                    requested: 0,
                    assigned: 0,
                    assigned_ids: Vec::new(),
                    warnings: Vec::new(),
                },
            ));
        }

        let outcome = self.create_and_assign_groups(ctx, user.id, specs).await?;
        let user = self.users.get_by_id(&ctx.tenant_key(), user.id).await?;
        Ok((user, outcome))
    }

    /// Resolve a user's membership ids to the group records that still
    /// exist. Deleting a group never cascades into user records, so
    /// dangling ids are expected here and read as "group removed".
    pub async fn resolve_user_groups(
        &self,
        ctx: &TenantContext,
        user: &User,
    ) -> SystivaResult<Vec<Group>> {
        let tenant = ctx.tenant_key();
        let mut groups = Vec::new();

        for group_id in &user.assigned_groups {
            match self.groups.get_by_id(&tenant, *group_id).await {
                Ok(group) => {
                    groups.push(group);
                    continue;
                }
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(e),
            }
            if !tenant.is_global() {
                match self.groups.get_by_id(&TenantKey::Global, *group_id).await {
                    Ok(group) => groups.push(group),
                    Err(e) if e.is_not_found() => {}
                    Err(e) => return Err(e),
                }
            }
        }

        Ok(groups)
    }
}
