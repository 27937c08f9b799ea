//! Integration tests for membership operations: additive assignment,
//! authoritative replacement, removals, and group/role symmetry.

use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use systiva_access::AccessService;
use systiva_core::error::SystivaError;
use systiva_core::models::group::{CreateGroup, Group};
use systiva_core::models::role::{CreateRole, Role};
use systiva_core::models::user::{CreateUser, User};
use systiva_core::tenant::TenantContext;
use systiva_db::store::{SurrealGroupStore, SurrealRoleStore, SurrealUserStore};
use uuid::Uuid;

type Service = AccessService<SurrealUserStore<Db>, SurrealGroupStore<Db>, SurrealRoleStore<Db>>;

/// Helper: spin up in-memory DB, run migrations, build the engine.
async fn setup() -> Service {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    systiva_db::run_migrations(&db).await.unwrap();

    AccessService::new(
        SurrealUserStore::new(db.clone()),
        SurrealGroupStore::new(db.clone()),
        SurrealRoleStore::new(db),
    )
}

fn acme() -> TenantContext {
    TenantContext::resolve(Some("42"), Some("Acme"), None, None)
}

async fn create_user(svc: &Service, ctx: &TenantContext, email: &str) -> User {
    svc.create_user(
        ctx,
        CreateUser {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: email.into(),
            status: None,
            technical_user: None,
        },
    )
    .await
    .unwrap()
}

async fn create_group(svc: &Service, ctx: &TenantContext, name: &str) -> Group {
    svc.create_group(
        ctx,
        CreateGroup {
            name: name.into(),
            description: Some("test group".into()),
            entity: None,
            product: None,
            service: None,
            enterprise_id: None,
            assigned_roles: None,
        },
    )
    .await
    .unwrap()
}

async fn create_role(svc: &Service, ctx: &TenantContext, name: &str) -> Role {
    svc.create_role(
        ctx,
        CreateRole {
            name: name.into(),
            description: None,
            scope_config: None,
        },
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn assign_group_is_idempotent() {
    let svc = setup().await;
    let ctx = acme();
    let user = create_user(&svc, &ctx, "ada@example.com").await;
    let group = create_group(&svc, &ctx, "Developers").await;

    let first = svc.assign_group(&ctx, user.id, group.id).await.unwrap();
    assert_eq!(first.assigned_groups, vec![group.id]);

    let second = svc.assign_group(&ctx, user.id, group.id).await.unwrap();
    assert_eq!(second.assigned_groups, vec![group.id]);
}

#[tokio::test]
async fn membership_never_contains_duplicates() {
    let svc = setup().await;
    let ctx = acme();
    let user = create_user(&svc, &ctx, "ada@example.com").await;
    let a = create_group(&svc, &ctx, "A").await;
    let b = create_group(&svc, &ctx, "B").await;

    svc.assign_group(&ctx, user.id, a.id).await.unwrap();
    svc.assign_group(&ctx, user.id, b.id).await.unwrap();
    svc.assign_group(&ctx, user.id, a.id).await.unwrap();

    // A replace with repeated ids still comes out deduplicated.
    let outcome = svc
        .assign_groups(&ctx, user.id, vec![a.id, b.id, a.id, b.id])
        .await
        .unwrap();
    assert_eq!(outcome.assigned_ids, vec![a.id, b.id]);
    assert_eq!(outcome.assigned, 2);

    let stored = svc.get_user(&ctx, user.id).await.unwrap();
    assert_eq!(stored.assigned_groups, vec![a.id, b.id]);
}

#[tokio::test]
async fn assign_groups_replaces_wholesale() {
    let svc = setup().await;
    let ctx = acme();
    let user = create_user(&svc, &ctx, "ada@example.com").await;
    let old = create_group(&svc, &ctx, "Old").await;
    let new_a = create_group(&svc, &ctx, "NewA").await;
    let new_b = create_group(&svc, &ctx, "NewB").await;

    svc.assign_group(&ctx, user.id, old.id).await.unwrap();

    let outcome = svc
        .assign_groups(&ctx, user.id, vec![new_a.id, new_b.id])
        .await
        .unwrap();
    assert_eq!(outcome.assigned_ids, vec![new_a.id, new_b.id]);

    let stored = svc.get_user(&ctx, user.id).await.unwrap();
    assert_eq!(stored.assigned_groups, vec![new_a.id, new_b.id]);
}

#[tokio::test]
async fn assign_group_substitutes_same_named_local_group() {
    let svc = setup().await;
    let ctx = acme();
    let global_admins = create_group(&svc, &TenantContext::global(), "Admins").await;
    let local_admins = create_group(&svc, &ctx, "Admins").await;
    let user = create_user(&svc, &ctx, "ada@example.com").await;

    let updated = svc
        .assign_group(&ctx, user.id, global_admins.id)
        .await
        .unwrap();

    assert_eq!(updated.assigned_groups, vec![local_admins.id]);
}

#[tokio::test]
async fn assign_group_rejects_global_group_without_local_equivalent() {
    let svc = setup().await;
    let ctx = acme();
    let global_only = create_group(&svc, &TenantContext::global(), "Admins").await;
    let user = create_user(&svc, &ctx, "ada@example.com").await;

    let err = svc
        .assign_group(&ctx, user.id, global_only.id)
        .await
        .unwrap_err();

    assert!(
        matches!(err, SystivaError::ScopeViolation { .. }),
        "expected ScopeViolation, got: {err:?}"
    );

    let stored = svc.get_user(&ctx, user.id).await.unwrap();
    assert!(stored.assigned_groups.is_empty());
}

#[tokio::test]
async fn assign_group_unknown_id_is_not_found() {
    let svc = setup().await;
    let ctx = acme();
    let user = create_user(&svc, &ctx, "ada@example.com").await;

    let err = svc
        .assign_group(&ctx, user.id, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, SystivaError::NotFound { .. }));
}

#[tokio::test]
async fn remove_groups_is_set_difference() {
    let svc = setup().await;
    let ctx = acme();
    let user = create_user(&svc, &ctx, "ada@example.com").await;
    let a = create_group(&svc, &ctx, "A").await;
    let b = create_group(&svc, &ctx, "B").await;
    let c = create_group(&svc, &ctx, "C").await;

    svc.assign_groups(&ctx, user.id, vec![a.id, b.id, c.id])
        .await
        .unwrap();

    let after = svc.remove_groups(&ctx, user.id, &[a.id, c.id]).await.unwrap();
    assert_eq!(after.assigned_groups, vec![b.id]);

    // Removing an id that is not a member is a no-op.
    let unchanged = svc.remove_group(&ctx, user.id, a.id).await.unwrap();
    assert_eq!(unchanged.assigned_groups, vec![b.id]);
}

#[tokio::test]
async fn deleting_group_leaves_user_reference_dangling() {
    let svc = setup().await;
    let ctx = acme();
    let user = create_user(&svc, &ctx, "ada@example.com").await;
    let a = create_group(&svc, &ctx, "A").await;
    let b = create_group(&svc, &ctx, "B").await;

    svc.assign_groups(&ctx, user.id, vec![a.id, b.id])
        .await
        .unwrap();
    svc.delete_group(&ctx, a.id).await.unwrap();

    // No cascade: the stored membership still lists the deleted id.
    let stored = svc.get_user(&ctx, user.id).await.unwrap();
    assert_eq!(stored.assigned_groups, vec![a.id, b.id]);

    // Readers resolve it to the groups that still exist.
    let groups = svc.resolve_user_groups(&ctx, &stored).await.unwrap();
    let ids: Vec<Uuid> = groups.iter().map(|g| g.id).collect();
    assert_eq!(ids, vec![b.id]);
}

#[tokio::test]
async fn assign_role_is_idempotent() {
    let svc = setup().await;
    let ctx = acme();
    let group = create_group(&svc, &ctx, "Developers").await;
    let role = create_role(&svc, &ctx, "Deployer").await;

    let first = svc.assign_role(&ctx, group.id, role.id).await.unwrap();
    assert_eq!(first.assigned_roles, vec![role.id]);

    let second = svc.assign_role(&ctx, group.id, role.id).await.unwrap();
    assert_eq!(second.assigned_roles, vec![role.id]);
}

#[tokio::test]
async fn assign_role_accepts_global_roles() {
    let svc = setup().await;
    let ctx = acme();
    let group = create_group(&svc, &ctx, "Developers").await;
    let global_role = create_role(&svc, &TenantContext::global(), "Auditor").await;

    let updated = svc.assign_role(&ctx, group.id, global_role.id).await.unwrap();
    assert_eq!(updated.assigned_roles, vec![global_role.id]);
}

#[tokio::test]
async fn assign_roles_replaces_and_drops_unknown_ids() {
    let svc = setup().await;
    let ctx = acme();
    let group = create_group(&svc, &ctx, "Developers").await;
    let keep = create_role(&svc, &ctx, "Deployer").await;

    let outcome = svc
        .assign_roles(&ctx, group.id, vec![keep.id, Uuid::new_v4()])
        .await
        .unwrap();

    assert_eq!(outcome.requested, 2);
    assert_eq!(outcome.assigned, 1);
    assert_eq!(outcome.assigned_ids, vec![keep.id]);
    assert_eq!(outcome.warnings.len(), 1);

    let stored = svc.get_group(&ctx, group.id).await.unwrap();
    assert_eq!(stored.assigned_roles, vec![keep.id]);
}

#[tokio::test]
async fn assign_roles_refuses_fully_invalid_replace() {
    let svc = setup().await;
    let ctx = acme();
    let role = create_role(&svc, &ctx, "Deployer").await;
    let group = create_group(&svc, &ctx, "Developers").await;
    svc.assign_role(&ctx, group.id, role.id).await.unwrap();

    let err = svc
        .assign_roles(&ctx, group.id, vec![Uuid::new_v4()])
        .await
        .unwrap_err();
    assert!(matches!(err, SystivaError::ScopeViolation { .. }));

    // Prior role list is untouched.
    let stored = svc.get_group(&ctx, group.id).await.unwrap();
    assert_eq!(stored.assigned_roles, vec![role.id]);
}

#[tokio::test]
async fn remove_role_is_set_difference() {
    let svc = setup().await;
    let ctx = acme();
    let group = create_group(&svc, &ctx, "Developers").await;
    let a = create_role(&svc, &ctx, "Deployer").await;
    let b = create_role(&svc, &ctx, "Viewer").await;

    svc.assign_roles(&ctx, group.id, vec![a.id, b.id])
        .await
        .unwrap();

    let after = svc.remove_role(&ctx, group.id, a.id).await.unwrap();
    assert_eq!(after.assigned_roles, vec![b.id]);
}
