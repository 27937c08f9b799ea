//! SurrealDB implementation of [`UserStore`].

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use systiva_core::error::SystivaResult;
use systiva_core::models::user::{CreateUser, UpdateUser, User, UserStatus};
use systiva_core::store::{PaginatedResult, Pagination, UserStore};
use systiva_core::tenant::TenantKey;
use uuid::Uuid;

use super::{CountRow, ids_to_strings, parse_id_list};
use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct UserRow {
    tenant: String,
    first_name: String,
    last_name: String,
    email: String,
    status: String,
    technical_user: bool,
    assigned_groups: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self, id: Uuid) -> Result<User, DbError> {
        Ok(User {
            id,
            tenant: TenantKey::from_storage_key(&self.tenant),
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            status: parse_status(&self.status)?,
            technical_user: self.technical_user,
            assigned_groups: parse_id_list(self.assigned_groups, "group")?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct UserRowWithId {
    record_id: String,
    tenant: String,
    first_name: String,
    last_name: String,
    email: String,
    status: String,
    technical_user: bool,
    assigned_groups: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRowWithId {
    fn try_into_user(self) -> Result<User, DbError> {
        let id = super::parse_uuid(&self.record_id, "user")?;
        Ok(User {
            id,
            tenant: TenantKey::from_storage_key(&self.tenant),
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            status: parse_status(&self.status)?,
            technical_user: self.technical_user,
            assigned_groups: parse_id_list(self.assigned_groups, "group")?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn parse_status(s: &str) -> Result<UserStatus, DbError> {
    match s {
        "Active" => Ok(UserStatus::Active),
        "Inactive" => Ok(UserStatus::Inactive),
        other => Err(DbError::Decode(format!("unknown user status: {other}"))),
    }
}

fn status_to_str(status: &UserStatus) -> &'static str {
    match status {
        UserStatus::Active => "Active",
        UserStatus::Inactive => "Inactive",
    }
}

/// SurrealDB implementation of the User catalog store.
#[derive(Clone)]
pub struct SurrealUserStore<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealUserStore<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> UserStore for SurrealUserStore<C> {
    async fn create(&self, tenant: &TenantKey, input: CreateUser) -> SystivaResult<User> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let tenant_str = tenant.storage_key().to_owned();

        let status = input.status.unwrap_or(UserStatus::Active);

        let result = self
            .db
            .query(
                "CREATE type::record('user', $id) SET \
                 tenant = $tenant, \
                 first_name = $first_name, last_name = $last_name, \
                 email = $email, status = $status, \
                 technical_user = $technical_user, \
                 assigned_groups = []",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant", tenant_str))
            .bind(("first_name", input.first_name))
            .bind(("last_name", input.last_name))
            .bind(("email", input.email))
            .bind(("status", status_to_str(&status).to_string()))
            .bind(("technical_user", input.technical_user.unwrap_or(false)))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(DbError::from)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        Ok(row.into_user(id)?)
    }

    async fn get_by_id(&self, tenant: &TenantKey, id: Uuid) -> SystivaResult<User> {
        let id_str = id.to_string();
        let tenant_str = tenant.storage_key().to_owned();

        let mut result = self
            .db
            .query(
                "SELECT * FROM type::record('user', $id) \
                 WHERE tenant = $tenant",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant", tenant_str))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        Ok(row.into_user(id)?)
    }

    async fn get_by_email(&self, tenant: &TenantKey, email: &str) -> SystivaResult<User> {
        let tenant_str = tenant.storage_key().to_owned();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM user \
                 WHERE tenant = $tenant AND email = $email LIMIT 1",
            )
            .bind(("tenant", tenant_str))
            .bind(("email", email.to_owned()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: email.to_owned(),
        })?;

        Ok(row.try_into_user()?)
    }

    async fn update(&self, tenant: &TenantKey, id: Uuid, input: UpdateUser) -> SystivaResult<User> {
        let id_str = id.to_string();
        let tenant_str = tenant.storage_key().to_owned();

        let mut sets = Vec::new();
        if input.first_name.is_some() {
            sets.push("first_name = $first_name");
        }
        if input.last_name.is_some() {
            sets.push("last_name = $last_name");
        }
        if input.email.is_some() {
            sets.push("email = $email");
        }
        if input.status.is_some() {
            sets.push("status = $status");
        }
        if input.technical_user.is_some() {
            sets.push("technical_user = $technical_user");
        }
        if input.assigned_groups.is_some() {
            sets.push("assigned_groups = $assigned_groups");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('user', $id) SET {} \
             WHERE tenant = $tenant",
            sets.join(", ")
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("id", id_str.clone()))
            .bind(("tenant", tenant_str));

        if let Some(first_name) = input.first_name {
            builder = builder.bind(("first_name", first_name));
        }
        if let Some(last_name) = input.last_name {
            builder = builder.bind(("last_name", last_name));
        }
        if let Some(email) = input.email {
            builder = builder.bind(("email", email));
        }
        if let Some(ref status) = input.status {
            builder = builder.bind(("status", status_to_str(status).to_string()));
        }
        if let Some(technical_user) = input.technical_user {
            builder = builder.bind(("technical_user", technical_user));
        }
        if let Some(ref assigned_groups) = input.assigned_groups {
            builder = builder.bind(("assigned_groups", ids_to_strings(assigned_groups)));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(DbError::from)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        Ok(row.into_user(id)?)
    }

    async fn delete(&self, tenant: &TenantKey, id: Uuid) -> SystivaResult<()> {
        let id_str = id.to_string();
        let tenant_str = tenant.storage_key().to_owned();

        let mut result = self
            .db
            .query(
                "DELETE type::record('user', $id) \
                 WHERE tenant = $tenant RETURN BEFORE",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant", tenant_str))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::NotFound {
                entity: "user".into(),
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
    ) -> SystivaResult<PaginatedResult<User>> {
        let tenant_str = tenant.storage_key().to_owned();

        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM user \
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
                "SELECT meta::id(id) AS record_id, * FROM user \
                 WHERE tenant = $tenant \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("tenant", tenant_str))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_user())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
