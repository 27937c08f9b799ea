//! Group scope validation and cross-tenant fallback resolution.
//!
//! A group id is only meaningful within the catalog it was created in,
//! so validation tries the two catalogs the id could plausibly belong
//! to: the target tenant's own catalog first, then the global catalog.
//! A global group referenced from an account context is the leakage
//! case this engine exists to prevent; the fallback resolver looks for
//! an account-local group with the same name to substitute.

use systiva_core::error::SystivaResult;
use systiva_core::models::group::Group;
use systiva_core::store::{GroupStore, RoleStore, UserStore};
use systiva_core::tenant::{TenantContext, TenantKey};
use tracing::debug;
use uuid::Uuid;

use crate::service::AccessService;

/// Which catalog a validated group was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupScope {
    Global,
    Account,
}

/// Result of validating one group id against a target tenant.
#[derive(Debug)]
pub struct ScopeCheck {
    /// Whether the group may be assigned in the target tenant as-is.
    pub is_valid: bool,
    /// The group record, when the id resolved in either catalog.
    pub group: Option<Group>,
    /// Catalog the group was found in; `None` when not found anywhere.
    pub scope: Option<GroupScope>,
    pub warning: Option<String>,
}

impl<U: UserStore, G: GroupStore, R: RoleStore> AccessService<U, G, R> {
    /// Decide whether `group_id` is assignable in the context's tenant.
    ///
    /// Valid when the group lives in the target tenant's own catalog, or
    /// when both the group and the target are global. A global group
    /// against an account target is invalid and carries a warning; the
    /// caller decides whether to attempt name-based fallback.
    pub async fn validate_group_scope(
        &self,
        ctx: &TenantContext,
        group_id: Uuid,
    ) -> SystivaResult<ScopeCheck> {
        let target = ctx.tenant_key();

        // 1. The target tenant's own catalog.
        match self.groups.get_by_id(&target, group_id).await {
            Ok(group) => {
                let scope = if target.is_global() {
                    GroupScope::Global
                } else {
                    GroupScope::Account
                };
                return Ok(ScopeCheck {
                    is_valid: true,
                    group: Some(group),
                    scope: Some(scope),
                    warning: None,
                });
            }
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }

        // 2. The global catalog, when the target is an account.
        if !target.is_global() {
            match self.groups.get_by_id(&TenantKey::Global, group_id).await {
                Ok(group) => {
                    return Ok(ScopeCheck {
                        is_valid: false,
                        warning: Some(format!(
                            "group '{}' ({group_id}) belongs to the global catalog and is not \
                             assignable in account '{target}'",
                            group.name,
                        )),
                        group: Some(group),
                        scope: Some(GroupScope::Global),
                    });
                }
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(e),
            }
        }

        // 3. Not found in either catalog.
        Ok(ScopeCheck {
            is_valid: false,
            group: None,
            scope: None,
            warning: None,
        })
    }

    /// Exact-name lookup in the target tenant's own catalog, honoring
    /// the context's enterprise filter against the group's stored
    /// enterprise tag. Returns `None` on a miss; the caller downgrades
    /// that to a warning, never a hard failure.
    pub async fn find_account_group_by_name(
        &self,
        ctx: &TenantContext,
        name: &str,
    ) -> SystivaResult<Option<Group>> {
        let target = ctx.tenant_key();

        match self.groups.get_by_name(&target, name).await {
            Ok(group) => {
                if let Some(filter) = &ctx.enterprise {
                    if group.enterprise_id.as_deref() != Some(filter.enterprise_id.as_str()) {
                        debug!(
                            group = %group.id,
                            enterprise = %filter.enterprise_id,
                            "name match rejected by enterprise filter"
                        );
                        return Ok(None);
                    }
                }
                Ok(Some(group))
            }
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Resolve a requested group id to the id that may actually be
    /// assigned in this context: the id itself when valid, an
    /// account-local same-named substitute for a global group, or
    /// `None` (with a warning recorded) when the group must be dropped.
    pub(crate) async fn resolve_assignable_group(
        &self,
        ctx: &TenantContext,
        group_id: Uuid,
        warnings: &mut Vec<String>,
    ) -> SystivaResult<Option<Uuid>> {
        let check = self.validate_group_scope(ctx, group_id).await?;

        if check.is_valid {
            return Ok(check.group.map(|g| g.id));
        }

        let Some(group) = check.group else {
            warnings.push(format!(
                "group {group_id} was not found in any catalog and was dropped from the assignment"
            ));
            return Ok(None);
        };

        match self.find_account_group_by_name(ctx, &group.name).await? {
            Some(local) => {
                warnings.push(format!(
                    "substituted global group '{}' ({}) with account-local group ({})",
                    group.name, group.id, local.id,
                ));
                Ok(Some(local.id))
            }
            None => {
                warnings.push(format!(
                    "global group '{}' ({}) has no same-named group in tenant '{}' and was \
                     dropped from the assignment",
                    group.name,
                    group.id,
                    ctx.tenant_key(),
                ));
                Ok(None)
            }
        }
    }
}
