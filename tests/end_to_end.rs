//! Full container lifecycle through the service API.

mod common;

use authz_proto::{Acl, ContainerId, ContainerOp, OperationMask, ServerKey, verify_cap};
use authzd::AuthzError;
use authzd::store::{KvStore, MemoryStore};
use common::TestService;
use std::sync::Arc;

#[tokio::test]
async fn test_container_lifecycle() {
    let t = TestService::spawn();
    let (u1, u1_cred) = t.user();
    let (u2, u2_cred) = t.user();
    let id = ContainerId::new(7);

    let create = t.create_cap(u1_cred).await;
    let creator_cap = t.service.create_container(id, &create).await.unwrap();
    assert_eq!(creator_cap.data.container_id, id);
    assert_eq!(
        creator_cap.data.operation_mask,
        OperationMask::MODACL | OperationMask::REMOVE | OperationMask::READ
    );
    assert!(t.service.container_exists(id).await.unwrap());

    // Creator is seeded onto exactly the ACLs of its own rights.
    let read_acl = t.service.get_acl(id, ContainerOp::Read, &creator_cap).await.unwrap();
    assert_eq!(read_acl.as_slice(), &[u1]);
    let write_acl = t.service.get_acl(id, ContainerOp::Write, &creator_cap).await.unwrap();
    assert!(write_acl.is_empty());

    t.service
        .mod_acl(id, OperationMask::WRITE, &[u2], &[], &creator_cap)
        .await
        .unwrap();

    let u2_cap = t
        .service
        .get_cap(id, OperationMask::WRITE, u2_cred)
        .await
        .unwrap();
    assert!(verify_cap(&t.service.state().server_key, &u2_cap).is_ok());
    assert_eq!(u2_cap.data.credential.user_id, u2);

    t.service.remove_container(id, &creator_cap).await.unwrap();
    assert!(!t.service.container_exists(id).await.unwrap());

    let err = t
        .service
        .get_acl(id, ContainerOp::Write, &creator_cap)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthzError::NotFound(_)), "got {err:?}");
}

#[tokio::test]
async fn test_explicit_id_collision() {
    let t = TestService::spawn();
    let (_, cred) = t.user();
    let create = t.create_cap(cred).await;

    t.service
        .create_container(ContainerId::new(3), &create)
        .await
        .unwrap();
    let err = t
        .service
        .create_container(ContainerId::new(3), &create)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthzError::AlreadyExists(_)));
}

#[tokio::test]
async fn test_create_requires_create_right() {
    let t = TestService::spawn();
    let (_, cred) = t.user();
    let creator_cap = t.new_container(cred).await;

    // A capability without CREATE cannot be used to create containers.
    let err = t
        .service
        .create_container(ContainerId::ANY, &creator_cap)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthzError::VerifyCap(_)));
}

#[tokio::test]
async fn test_remove_requires_remove_right() {
    let t = TestService::spawn();
    let (_, owner) = t.user();
    let (reader, reader_cred) = t.user();
    let creator_cap = t.new_container(owner).await;
    let id = creator_cap.data.container_id;

    t.service
        .mod_acl(id, OperationMask::READ, &[reader], &[], &creator_cap)
        .await
        .unwrap();
    let reader_cap = t
        .service
        .get_cap(id, OperationMask::READ, reader_cred)
        .await
        .unwrap();

    let err = t.service.remove_container(id, &reader_cap).await.unwrap_err();
    assert!(matches!(err, AuthzError::VerifyCap(_)));
    assert!(t.service.container_exists(id).await.unwrap());
}

#[tokio::test]
async fn test_capabilities_from_other_key_are_rejected() {
    let t = TestService::spawn();
    let other = TestService::spawn();
    let (_, cred) = t.user();
    let creator_cap = t.new_container(cred).await;
    let id = creator_cap.data.container_id;

    // Same credential authority secret, different server key.
    let foreign = other.new_container(cred).await;
    assert_eq!(foreign.data.container_id, id);

    let err = t
        .service
        .get_acl(id, ContainerOp::Read, &foreign)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthzError::VerifyCap(_)));
}

#[tokio::test]
async fn test_without_acls_capability_is_sufficient() {
    let t = TestService::without_acls();
    let (_, owner) = t.user();
    let (_, stranger) = t.user();
    let creator_cap = t.new_container(owner).await;
    let id = creator_cap.data.container_id;

    // The ACLs exist but are empty and never consulted, so any credential
    // can obtain any right.
    let cap = t
        .service
        .get_cap(id, OperationMask::WRITE | OperationMask::REMOVE, stranger)
        .await
        .unwrap();
    t.service.remove_container(id, &cap).await.unwrap();

    let err = t
        .service
        .get_cap(id, OperationMask::READ, stranger)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthzError::NotFound(_)));
}

#[tokio::test]
async fn test_without_acls_acls_are_still_administrable() {
    let t = TestService::without_acls();
    let (owner, cred) = t.user();
    let cap = t.new_container(cred).await;
    let id = cap.data.container_id;

    for op in ContainerOp::ALL {
        assert!(t.service.get_acl(id, op, &cap).await.unwrap().is_empty());
    }
    t.service
        .mod_acl(id, OperationMask::READ, &[owner], &[], &cap)
        .await
        .unwrap();
    let acl = t.service.get_acl(id, ContainerOp::Read, &cap).await.unwrap();
    assert_eq!(acl, Acl::from_users([owner]));
}

#[tokio::test]
async fn test_enabling_acls_later_denies_rather_than_not_found() {
    let kv: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
    let key = ServerKey::generate();

    let open = TestService::with_key(kv.clone(), false, key.clone());
    let (owner, cred) = open.user();
    let cap = open.new_container(cred).await;
    let id = cap.data.container_id;
    open.service
        .mod_acl(id, OperationMask::READ, &[owner], &[], &cap)
        .await
        .unwrap();

    let enforced = TestService::with_key(kv, true, key);
    let acl = enforced
        .service
        .get_acl(id, ContainerOp::Read, &cap)
        .await
        .unwrap();
    assert!(acl.contains(&owner));

    // MODACL was never granted while checking was off.
    let err = enforced
        .service
        .mod_acl(id, OperationMask::WRITE, &[owner], &[], &cap)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthzError::AccessDenied { .. }), "got {err:?}");
}
