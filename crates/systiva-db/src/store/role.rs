//! SurrealDB implementation of [`RoleStore`].

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use systiva_core::error::SystivaResult;
use systiva_core::models::role::{CreateRole, Role, UpdateRole};
use systiva_core::store::{PaginatedResult, Pagination, RoleStore};
use systiva_core::tenant::TenantKey;
use uuid::Uuid;

use super::CountRow;
use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct RoleRow {
    tenant: String,
    name: String,
    description: String,
    scope_config: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RoleRow {
    fn into_role(self, id: Uuid) -> Role {
        Role {
            id,
            tenant: TenantKey::from_storage_key(&self.tenant),
            name: self.name,
            description: self.description,
            scope_config: self.scope_config,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct RoleRowWithId {
    record_id: String,
    tenant: String,
    name: String,
    description: String,
    scope_config: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RoleRowWithId {
    fn try_into_role(self) -> Result<Role, DbError> {
        let id = super::parse_uuid(&self.record_id, "role")?;
        Ok(Role {
            id,
            tenant: TenantKey::from_storage_key(&self.tenant),
            name: self.name,
            description: self.description,
            scope_config: self.scope_config,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the Role catalog store.
#[derive(Clone)]
pub struct SurrealRoleStore<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealRoleStore<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> RoleStore for SurrealRoleStore<C> {
    async fn create(&self, tenant: &TenantKey, input: CreateRole) -> SystivaResult<Role> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let tenant_str = tenant.storage_key().to_owned();

        let scope_config = input
            .scope_config
            .unwrap_or(serde_json::Value::Object(Default::default()));

        let result = self
            .db
            .query(
                "CREATE type::record('role', $id) SET \
                 tenant = $tenant, \
                 name = $name, description = $description, \
                 scope_config = $scope_config",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant", tenant_str))
            .bind(("name", input.name))
            .bind(("description", input.description.unwrap_or_default()))
            .bind(("scope_config", scope_config))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(DbError::from)?;

        let rows: Vec<RoleRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "role".into(),
            id: id_str,
        })?;

        Ok(row.into_role(id))
    }

    async fn get_by_id(&self, tenant: &TenantKey, id: Uuid) -> SystivaResult<Role> {
        let id_str = id.to_string();
        let tenant_str = tenant.storage_key().to_owned();

        let mut result = self
            .db
            .query(
                "SELECT * FROM type::record('role', $id) \
                 WHERE tenant = $tenant",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant", tenant_str))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoleRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "role".into(),
            id: id_str,
        })?;

        Ok(row.into_role(id))
    }

    async fn update(&self, tenant: &TenantKey, id: Uuid, input: UpdateRole) -> SystivaResult<Role> {
        let id_str = id.to_string();
        let tenant_str = tenant.storage_key().to_owned();

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.description.is_some() {
            sets.push("description = $description");
        }
        if input.scope_config.is_some() {
            sets.push("scope_config = $scope_config");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('role', $id) SET {} \
             WHERE tenant = $tenant",
            sets.join(", ")
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("id", id_str.clone()))
            .bind(("tenant", tenant_str));

        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(description) = input.description {
            builder = builder.bind(("description", description));
        }
        if let Some(scope_config) = input.scope_config {
            builder = builder.bind(("scope_config", scope_config));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(DbError::from)?;

        let rows: Vec<RoleRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "role".into(),
            id: id_str,
        })?;

        Ok(row.into_role(id))
    }

    async fn delete(&self, tenant: &TenantKey, id: Uuid) -> SystivaResult<()> {
        let id_str = id.to_string();
        let tenant_str = tenant.storage_key().to_owned();

        let mut result = self
            .db
            .query(
                "DELETE type::record('role', $id) \
                 WHERE tenant = $tenant RETURN BEFORE",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant", tenant_str))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoleRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::NotFound {
                entity: "role".into(),
                id: id_str,
            }
            .into());
        }

        Ok(())
    }

    async fn list(
        &self,
        tenant: &TenantKey,
        pagination: Pagination,
    ) -> SystivaResult<PaginatedResult<Role>> {
        let tenant_str = tenant.storage_key().to_owned();

        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM role \
                 WHERE tenant = $tenant GROUP ALL",
            )
            .bind(("tenant", tenant_str.clone()))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM role \
                 WHERE tenant = $tenant \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("tenant", tenant_str))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoleRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_role())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
