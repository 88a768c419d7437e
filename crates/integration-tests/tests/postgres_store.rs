//! `PgStore` against a real database.
//!
//! These tests require a `PostgreSQL` database reachable through
//! `LOCALBITE_TEST_DATABASE_URL`. Migrations are applied on connect, and each
//! test uses uids unique to its run.
//!
//! Run with: cargo test -p localbite-integration-tests -- --include-ignored

#![allow(clippy::unwrap_used)]

use std::time::{SystemTime, UNIX_EPOCH};

use secrecy::SecretString;

use localbite_api::db::{
    self, PgStore, RepositoryError, UserRepository, VerificationRepository, entity,
};
use localbite_api::models::{NewUser, NewVerificationRequest};
use localbite_core::{Email, Role, Uid, VerificationStatus};

async fn store() -> PgStore {
    let url = std::env::var("LOCALBITE_TEST_DATABASE_URL")
        .map(SecretString::from)
        .expect("LOCALBITE_TEST_DATABASE_URL not set");
    let pool = db::create_pool(&url).await.unwrap();
    sqlx::migrate!("../api/migrations").run(&pool).await.unwrap();
    PgStore::new(pool)
}

fn unique_uid(prefix: &str) -> Uid {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    Uid::parse(&format!("{prefix}-{nanos}")).unwrap()
}

async fn seed_request(store: &PgStore, prefix: &str) -> (Uid, localbite_api::models::VerificationRequest) {
    let uid = unique_uid(prefix);
    let user = store
        .upsert_user(&NewUser {
            uid: uid.clone(),
            full_name: "Amina".into(),
            email: Email::parse("amina@example.com").unwrap(),
            role: Role::Cook,
        })
        .await
        .unwrap();
    let request = store
        .create_request(&NewVerificationRequest::snapshot(&user))
        .await
        .unwrap();
    (uid, request)
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (LOCALBITE_TEST_DATABASE_URL)"]
async fn test_unique_request_per_uid() {
    let store = store().await;
    let (uid, _) = seed_request(&store, "dup").await;
    let user = store.get_user(&uid).await.unwrap().unwrap();

    let err = store
        .create_request(&NewVerificationRequest::snapshot(&user))
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict(_)));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (LOCALBITE_TEST_DATABASE_URL)"]
async fn test_approve_is_atomic() {
    let store = store().await;

    let (uid, request) = seed_request(&store, "approve").await;
    let approved = store.approve_request(request.id).await.unwrap();
    assert_eq!(approved.status, VerificationStatus::Approved);
    assert!(store.get_user(&uid).await.unwrap().unwrap().is_verified);

    let (orphan_uid, orphan) = seed_request(&store, "orphan").await;
    store.delete_user(&orphan_uid).await.unwrap();
    let err = store.approve_request(orphan.id).await.unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound(entity::USER)));
    let unchanged = store.get_request(orphan.id).await.unwrap().unwrap();
    assert_eq!(unchanged.status, VerificationStatus::Pending);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (LOCALBITE_TEST_DATABASE_URL)"]
async fn test_resolved_request_is_final() {
    let store = store().await;
    let (uid, request) = seed_request(&store, "decline").await;

    store.decline_request(request.id).await.unwrap();
    let err = store.approve_request(request.id).await.unwrap_err();
    assert!(matches!(err, RepositoryError::InvalidState(_)));
    assert!(!store.get_user(&uid).await.unwrap().unwrap().is_verified);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (LOCALBITE_TEST_DATABASE_URL)"]
async fn test_direct_verify_keeps_request_consistent() {
    let store = store().await;

    let (uid, request) = seed_request(&store, "direct").await;
    assert!(store.verify_user(&uid).await.unwrap().is_verified);
    let stored = store.get_request(request.id).await.unwrap().unwrap();
    assert_eq!(stored.status, VerificationStatus::Approved);
    let err = store.decline_request(request.id).await.unwrap_err();
    assert!(matches!(err, RepositoryError::InvalidState(_)));

    let (declined_uid, declined) = seed_request(&store, "direct-declined").await;
    store.decline_request(declined.id).await.unwrap();
    let err = store.verify_user(&declined_uid).await.unwrap_err();
    assert!(matches!(err, RepositoryError::InvalidState(_)));
    assert!(!store.get_user(&declined_uid).await.unwrap().unwrap().is_verified);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (LOCALBITE_TEST_DATABASE_URL)"]
async fn test_decline_refused_for_verified_user() {
    let store = store().await;
    let uid = unique_uid("late");
    store
        .upsert_user(&NewUser {
            uid: uid.clone(),
            full_name: "Amina".into(),
            email: Email::parse("amina@example.com").unwrap(),
            role: Role::Cook,
        })
        .await
        .unwrap();
    let user = store.verify_user(&uid).await.unwrap();
    let request = store
        .create_request(&NewVerificationRequest::snapshot(&user))
        .await
        .unwrap();

    let err = store.decline_request(request.id).await.unwrap_err();
    assert!(matches!(err, RepositoryError::InvalidState(_)));
    let stored = store.get_request(request.id).await.unwrap().unwrap();
    assert_eq!(stored.status, VerificationStatus::Pending);
}
