//! ACL state and file-backed server keys across restarts.

mod common;

use authz_proto::{ContainerId, ContainerOp, OperationMask};
use authzd::security::load_or_generate;
use authzd::store::{OpenOptions, RedbStore};
use common::TestService;
use std::sync::Arc;

#[tokio::test]
async fn test_acls_and_caps_survive_restart_with_key_file() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("authz.redb");
    let db_path = db_path.to_str().unwrap();
    let key_path = dir.path().join("server.key");
    let key_path = key_path.to_str().unwrap();

    let (cap, reader) = {
        let kv = Arc::new(RedbStore::open(db_path, OpenOptions::default()).unwrap());
        let key = load_or_generate(Some(key_path)).unwrap();
        let t = TestService::with_key(kv, true, key);
        let (_, cred) = t.user();
        let cap = t.new_container(cred).await;
        let (reader, _) = t.user();
        t.service
            .mod_acl(cap.data.container_id, OperationMask::READ, &[reader], &[], &cap)
            .await
            .unwrap();
        (cap, reader)
    };

    let kv = Arc::new(RedbStore::open(db_path, OpenOptions::default()).unwrap());
    let key = load_or_generate(Some(key_path)).unwrap();
    let t = TestService::with_key(kv, true, key);

    let acl = t
        .service
        .get_acl(cap.data.container_id, ContainerOp::Read, &cap)
        .await
        .unwrap();
    assert!(acl.contains(&reader));
    assert!(acl.contains(&cap.data.credential.user_id));

    // The id counter persisted too.
    let (_, cred) = t.user();
    let next = t.new_container(cred).await;
    assert_eq!(next.data.container_id, ContainerId::new(2));
}

#[tokio::test]
async fn test_ephemeral_key_invalidates_caps_on_restart() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("authz.redb");
    let db_path = db_path.to_str().unwrap();

    let cap = {
        let kv = Arc::new(RedbStore::open(db_path, OpenOptions::default()).unwrap());
        let t = TestService::with_store(kv, true);
        let (_, cred) = t.user();
        t.new_container(cred).await
    };

    let kv = Arc::new(RedbStore::open(db_path, OpenOptions::default()).unwrap());
    let t = TestService::with_store(kv, true);
    let err = t
        .service
        .get_acl(cap.data.container_id, ContainerOp::Read, &cap)
        .await
        .unwrap_err();
    assert!(matches!(err, authzd::AuthzError::VerifyCap(_)));
}
