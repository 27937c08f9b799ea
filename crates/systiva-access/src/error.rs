//! Engine error types.

use systiva_core::error::SystivaError;
use systiva_core::tenant::TenantKey;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum AccessError {
    #[error("group {group_id} is not assignable in tenant '{tenant}' and no same-named local group exists")]
    GroupScopeViolation { group_id: Uuid, tenant: TenantKey },

    #[error("none of the {requested} requested assignments could be validated")]
    EmptyAssignment { requested: usize },

    #[error("request must supply a group id, a list of group ids, or group specifications")]
    MissingGroupInput,
}

impl From<AccessError> for SystivaError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::GroupScopeViolation { .. } | AccessError::EmptyAssignment { .. } => {
                SystivaError::ScopeViolation {
                    message: err.to_string(),
                }
            }
            AccessError::MissingGroupInput => SystivaError::Validation {
                message: err.to_string(),
            },
        }
    }
}
