//! Integration tests for the create-and-assign-by-name workflow and
//! the assignment request dispatch.

use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use systiva_access::{AccessService, AssignGroupsInput, GroupSpec};
use systiva_core::error::SystivaError;
use systiva_core::models::group::{CreateGroup, Group};
use systiva_core::models::user::{CreateUser, User};
use systiva_core::tenant::TenantContext;
use systiva_db::store::{SurrealGroupStore, SurrealRoleStore, SurrealUserStore};

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

fn spec(name: &str) -> GroupSpec {
    GroupSpec {
        id: None,
        name: name.into(),
        description: None,
        entity: None,
        product: None,
        service: None,
        enterprise_id: None,
        roles: None,
    }
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
            description: Some("stored description".into()),
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

#[tokio::test]
async fn creates_missing_groups_and_reuses_existing_by_name() {
    let svc = setup().await;
    let ctx = acme();
    let user = create_user(&svc, &ctx, "ada@example.com").await;
    let existing = create_group(&svc, &ctx, "Developers").await;

    let outcome = svc
        .create_and_assign_groups(&ctx, user.id, vec![spec("Developers"), spec("Testers")])
        .await
        .unwrap();

    assert_eq!(outcome.requested, 2);
    assert_eq!(outcome.assigned, 2);
    assert_eq!(outcome.assigned_ids[0], existing.id);
    assert!(outcome.warnings.is_empty());

    let created = svc
        .find_account_group_by_name(&ctx, "Testers")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(outcome.assigned_ids[1], created.id);

    let stored = svc.get_user(&ctx, user.id).await.unwrap();
    assert_eq!(stored.assigned_groups, outcome.assigned_ids);
}

#[tokio::test]
async fn caller_supplied_ids_are_never_used_for_lookup() {
    let svc = setup().await;
    let ctx = acme();
    let user = create_user(&svc, &ctx, "ada@example.com").await;
    let existing = create_group(&svc, &ctx, "Developers").await;

    let mut s = spec("Developers");
    s.id = Some("tmp-client-id-123".into());

    let outcome = svc
        .create_and_assign_groups(&ctx, user.id, vec![s])
        .await
        .unwrap();

    // Resolved by name to the real record despite the placeholder id.
    assert_eq!(outcome.assigned_ids, vec![existing.id]);
}

#[tokio::test]
async fn blank_description_never_overwrites_stored_one() {
    let svc = setup().await;
    let ctx = acme();
    let user = create_user(&svc, &ctx, "ada@example.com").await;
    let existing = create_group(&svc, &ctx, "Developers").await;

    let mut blank = spec("Developers");
    blank.description = Some(String::new());

    svc.create_and_assign_groups(&ctx, user.id, vec![blank])
        .await
        .unwrap();

    let stored = svc.get_group(&ctx, existing.id).await.unwrap();
    assert_eq!(stored.description, "stored description");
}

#[tokio::test]
async fn differing_fields_are_sparsely_updated() {
    let svc = setup().await;
    let ctx = acme();
    let user = create_user(&svc, &ctx, "ada@example.com").await;
    let existing = create_group(&svc, &ctx, "Developers").await;

    let mut s = spec("Developers");
    s.description = Some("refreshed description".into());
    s.entity = Some("billing".into());

    svc.create_and_assign_groups(&ctx, user.id, vec![s])
        .await
        .unwrap();

    let stored = svc.get_group(&ctx, existing.id).await.unwrap();
    assert_eq!(stored.description, "refreshed description");
    assert_eq!(stored.entity.as_deref(), Some("billing"));
    // Untouched fields keep their values.
    assert_eq!(stored.name, "Developers");
    assert!(stored.product.is_none());
}

#[tokio::test]
async fn duplicate_specifications_resolve_to_one_assignment() {
    let svc = setup().await;
    let ctx = acme();
    let user = create_user(&svc, &ctx, "ada@example.com").await;

    let outcome = svc
        .create_and_assign_groups(&ctx, user.id, vec![spec("Ops"), spec("Ops")])
        .await
        .unwrap();

    assert_eq!(outcome.requested, 2);
    assert_eq!(outcome.assigned, 1);
    assert_eq!(outcome.assigned_ids.len(), 1);
}

#[tokio::test]
async fn one_bad_specification_does_not_abort_the_batch() {
    let svc = setup().await;
    let ctx = acme();
    let user = create_user(&svc, &ctx, "ada@example.com").await;

    let outcome = svc
        .create_and_assign_groups(&ctx, user.id, vec![spec("A"), spec(""), spec("B")])
        .await
        .unwrap();

    assert_eq!(outcome.requested, 3);
    assert_eq!(outcome.assigned, 2);
    assert_eq!(outcome.warnings.len(), 1);

    let stored = svc.get_user(&ctx, user.id).await.unwrap();
    assert_eq!(stored.assigned_groups, outcome.assigned_ids);
    assert_eq!(stored.assigned_groups.len(), 2);
}

#[tokio::test]
async fn fully_failed_batch_is_a_hard_error_and_leaves_membership_alone() {
    let svc = setup().await;
    let ctx = acme();
    let user = create_user(&svc, &ctx, "ada@example.com").await;
    let keep = create_group(&svc, &ctx, "Keep").await;
    svc.assign_group(&ctx, user.id, keep.id).await.unwrap();

    let err = svc
        .create_and_assign_groups(&ctx, user.id, vec![spec(""), spec("")])
        .await
        .unwrap_err();
    assert!(
        matches!(err, SystivaError::ScopeViolation { .. }),
        "expected hard failure, got: {err:?}"
    );

    // The prior membership was not replaced with an empty set.
    let stored = svc.get_user(&ctx, user.id).await.unwrap();
    assert_eq!(stored.assigned_groups, vec![keep.id]);
}

#[tokio::test]
async fn request_without_any_group_input_is_rejected() {
    let svc = setup().await;
    let ctx = acme();
    let user = create_user(&svc, &ctx, "ada@example.com").await;

    let err = svc
        .apply_group_assignment(&ctx, user.id, AssignGroupsInput::default())
        .await
        .unwrap_err();
    assert!(matches!(err, SystivaError::Validation { .. }));
}

#[tokio::test]
async fn global_group_id_resolves_to_same_named_account_group() {
    let svc = setup().await;
    let ctx = acme();
    let global_admins = create_group(&svc, &TenantContext::global(), "Admins").await;
    let local_admins = create_group(&svc, &ctx, "Admins").await;
    let user = create_user(&svc, &ctx, "ada@example.com").await;

    let outcome = svc
        .apply_group_assignment(
            &ctx,
            user.id,
            AssignGroupsInput {
                group_ids: Some(vec![global_admins.id]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(outcome.assigned_ids, vec![local_admins.id]);
    assert_eq!(outcome.warnings.len(), 1);
    let warning = &outcome.warnings[0];
    assert!(
        warning.contains(&global_admins.id.to_string())
            && warning.contains(&local_admins.id.to_string()),
        "warning should mention the substitution: {warning}"
    );

    let stored = svc.get_user(&ctx, user.id).await.unwrap();
    assert_eq!(stored.assigned_groups, vec![local_admins.id]);
}

#[tokio::test]
async fn unresolvable_global_group_is_dropped_with_warning() {
    let svc = setup().await;
    let ctx = acme();
    let global_only = create_group(&svc, &TenantContext::global(), "Admins").await;
    let local = create_group(&svc, &ctx, "Developers").await;
    let user = create_user(&svc, &ctx, "ada@example.com").await;

    let outcome = svc
        .assign_groups(&ctx, user.id, vec![global_only.id, local.id])
        .await
        .unwrap();

    assert_eq!(outcome.requested, 2);
    assert_eq!(outcome.assigned, 1);
    assert_eq!(outcome.assigned_ids, vec![local.id]);
    assert_eq!(outcome.warnings.len(), 1);
}

#[tokio::test]
async fn create_user_with_groups_assigns_in_one_call() {
    let svc = setup().await;
    let ctx = acme();

    let (user, outcome) = svc
        .create_user_with_groups(
            &ctx,
            CreateUser {
                first_name: "Grace".into(),
                last_name: "Hopper".into(),
                email: "grace@example.com".into(),
                status: None,
                technical_user: None,
            },
            vec![spec("Developers"), spec("Testers")],
        )
        .await
        .unwrap();

    assert_eq!(outcome.requested, 2);
    assert_eq!(outcome.assigned, 2);
    assert_eq!(user.assigned_groups, outcome.assigned_ids);
}

#[tokio::test]
async fn new_group_inherits_specification_fields() {
    let svc = setup().await;
    let ctx = acme();
    let user = create_user(&svc, &ctx, "ada@example.com").await;

    let mut s = spec("Platform");
    s.description = Some("platform engineering".into());
    s.product = Some("pipelines".into());
    s.enterprise_id = Some("ent-1".into());

    svc.create_and_assign_groups(&ctx, user.id, vec![s])
        .await
        .unwrap();

    let created = svc
        .find_account_group_by_name(&ctx, "Platform")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(created.description, "platform engineering");
    assert_eq!(created.product.as_deref(), Some("pipelines"));
    assert_eq!(created.enterprise_id.as_deref(), Some("ent-1"));
}
