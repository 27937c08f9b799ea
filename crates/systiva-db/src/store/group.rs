//! SurrealDB implementation of [`GroupStore`].

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use systiva_core::error::SystivaResult;
use systiva_core::models::group::{CreateGroup, Group, UpdateGroup};
use systiva_core::store::{GroupStore, PaginatedResult, Pagination};
use systiva_core::tenant::TenantKey;
use uuid::Uuid;

use super::{CountRow, ids_to_strings, parse_id_list};
use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct GroupRow {
    tenant: String,
    name: String,
    description: String,
    entity: Option<String>,
    product: Option<String>,
    service: Option<String>,
    enterprise_id: Option<String>,
    assigned_roles: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl GroupRow {
    fn into_group(self, id: Uuid) -> Result<Group, DbError> {
        Ok(Group {
            id,
            tenant: TenantKey::from_storage_key(&self.tenant),
            name: self.name,
            description: self.description,
            entity: self.entity,
            product: self.product,
            service: self.service,
            enterprise_id: self.enterprise_id,
            assigned_roles: parse_id_list(self.assigned_roles, "role")?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct GroupRowWithId {
    record_id: String,
    tenant: String,
    name: String,
    description: String,
    entity: Option<String>,
    product: Option<String>,
    service: Option<String>,
    enterprise_id: Option<String>,
    assigned_roles: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl GroupRowWithId {
    fn try_into_group(self) -> Result<Group, DbError> {
        let id = super::parse_uuid(&self.record_id, "group")?;
        Ok(Group {
            id,
            tenant: TenantKey::from_storage_key(&self.tenant),
            name: self.name,
            description: self.description,
            entity: self.entity,
            product: self.product,
            service: self.service,
            enterprise_id: self.enterprise_id,
            assigned_roles: parse_id_list(self.assigned_roles, "role")?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the Group catalog store.
#[derive(Clone)]
pub struct SurrealGroupStore<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealGroupStore<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> GroupStore for SurrealGroupStore<C> {
    async fn create(&self, tenant: &TenantKey, input: CreateGroup) -> SystivaResult<Group> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let tenant_str = tenant.storage_key().to_owned();

        let assigned_roles = input.assigned_roles.unwrap_or_default();

        let result = self
            .db
            .query(
                "CREATE type::record('group', $id) SET \
                 tenant = $tenant, \
                 name = $name, description = $description, \
                 entity = $entity, product = $product, \
                 service = $service, enterprise_id = $enterprise_id, \
                 assigned_roles = $assigned_roles",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant", tenant_str))
            .bind(("name", input.name))
            .bind(("description", input.description.unwrap_or_default()))
            .bind(("entity", input.entity))
            .bind(("product", input.product))
            .bind(("service", input.service))
            .bind(("enterprise_id", input.enterprise_id))
            .bind(("assigned_roles", ids_to_strings(&assigned_roles)))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(DbError::from)?;

        let rows: Vec<GroupRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "group".into(),
            id: id_str,
        })?;

        Ok(row.into_group(id)?)
    }

    async fn get_by_id(&self, tenant: &TenantKey, id: Uuid) -> SystivaResult<Group> {
        let id_str = id.to_string();
        let tenant_str = tenant.storage_key().to_owned();

        let mut result = self
            .db
            .query(
                "SELECT * FROM type::record('group', $id) \
                 WHERE tenant = $tenant",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant", tenant_str))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<GroupRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "group".into(),
            id: id_str,
        })?;

        Ok(row.into_group(id)?)
    }

    async fn get_by_name(&self, tenant: &TenantKey, name: &str) -> SystivaResult<Group> {
        let tenant_str = tenant.storage_key().to_owned();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM group \
                 WHERE tenant = $tenant AND name = $name LIMIT 1",
            )
            .bind(("tenant", tenant_str))
            .bind(("name", name.to_owned()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<GroupRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "group".into(),
            id: name.to_owned(),
        })?;

        Ok(row.try_into_group()?)
    }

    async fn update(
        &self,
        tenant: &TenantKey,
        id: Uuid,
        input: UpdateGroup,
    ) -> SystivaResult<Group> {
        let id_str = id.to_string();
        let tenant_str = tenant.storage_key().to_owned();

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.description.is_some() {
            sets.push("description = $description");
        }
        if input.entity.is_some() {
            sets.push("entity = $entity");
        }
        if input.product.is_some() {
            sets.push("product = $product");
        }
        if input.service.is_some() {
            sets.push("service = $service");
        }
        if input.enterprise_id.is_some() {
            sets.push("enterprise_id = $enterprise_id");
        }
        if input.assigned_roles.is_some() {
            sets.push("assigned_roles = $assigned_roles");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('group', $id) SET {} \
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
        if let Some(entity) = input.entity {
            builder = builder.bind(("entity", entity));
        }
        if let Some(product) = input.product {
            builder = builder.bind(("product", product));
        }
        if let Some(service) = input.service {
            builder = builder.bind(("service", service));
        }
        if let Some(enterprise_id) = input.enterprise_id {
            builder = builder.bind(("enterprise_id", enterprise_id));
        }
        if let Some(ref assigned_roles) = input.assigned_roles {
            builder = builder.bind(("assigned_roles", ids_to_strings(assigned_roles)));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(DbError::from)?;

        let rows: Vec<GroupRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "group".into(),
            id: id_str,
        })?;

        Ok(row.into_group(id)?)
    }

    async fn delete(&self, tenant: &TenantKey, id: Uuid) -> SystivaResult<()> {
        let id_str = id.to_string();
        let tenant_str = tenant.storage_key().to_owned();

        // No cascade: user references to the deleted group stay in place
        // and readers treat the dangling id as "group removed".
        let mut result = self
            .db
            .query(
                "DELETE type::record('group', $id) \
                 WHERE tenant = $tenant RETURN BEFORE",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant", tenant_str))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<GroupRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::NotFound {
                entity: "group".into(),
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
    ) -> SystivaResult<PaginatedResult<Group>> {
        let tenant_str = tenant.storage_key().to_owned();

        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM group \
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
                "SELECT meta::id(id) AS record_id, * FROM group \
                 WHERE tenant = $tenant \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("tenant", tenant_str))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<GroupRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_group())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
