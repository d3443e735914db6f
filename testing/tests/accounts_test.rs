//! Registration, login, token resolution and admin bootstrap.

#![allow(clippy::unwrap_used)]

use futures::future::join_all;
use slotbook_core::{BookingError, Credentials, Viewer};
use slotbook_testing::TestServices;

#[tokio::test]
async fn register_login_and_resolve_token() {
    let services = TestServices::new();
    let credentials = Credentials::new("alice", "wonderland");

    let registered = services.accounts.register(&credentials).await.unwrap();
    assert!(!registered.is_staff);
    assert_ne!(registered.password_hash, "wonderland");

    let login = services.accounts.login(&credentials).await.unwrap();
    assert_eq!(login.username, "alice");
    assert!(!login.is_admin);

    let identity = services.accounts.authenticate(&login.token).await.unwrap();
    assert_eq!(identity.user_id, registered.id);

    let current = services
        .accounts
        .current_user(&Viewer::from(identity))
        .unwrap();
    assert_eq!(current.username, "alice");
    assert!(!current.is_staff);
    assert!(!current.is_superuser);
}

#[tokio::test]
async fn repeated_login_reuses_the_token() {
    let services = TestServices::new();
    let credentials = Credentials::new("alice", "wonderland");
    services.accounts.register(&credentials).await.unwrap();

    let first = services.accounts.login(&credentials).await.unwrap();
    let second = services.accounts.login(&credentials).await.unwrap();
    assert_eq!(first.token, second.token);
    assert_eq!(services.users.token_count(), 1);
}

#[tokio::test]
async fn duplicate_username_is_a_validation_error() {
    let services = TestServices::new();
    services
        .accounts
        .register(&Credentials::new("alice", "one"))
        .await
        .unwrap();

    let err = services
        .accounts
        .register(&Credentials::new("alice", "two"))
        .await
        .unwrap_err();
    assert_eq!(err, BookingError::Validation("Username already exists".into()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_registrations_of_one_name_create_one_user() {
    let services = TestServices::new();

    let results = join_all((0..8).map(|_| {
        let accounts = services.accounts.clone();
        async move { accounts.register(&Credentials::new("alice", "pw")).await }
    }))
    .await;

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert_eq!(services.users.user_count(), 1);
}

#[tokio::test]
async fn missing_fields_are_rejected_on_register() {
    let services = TestServices::new();

    let err = services
        .accounts
        .register(&Credentials::default())
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::Validation(_)));
    assert_eq!(services.users.user_count(), 0);
}

#[tokio::test]
async fn bad_credentials_are_indistinguishable() {
    let services = TestServices::new();
    services
        .accounts
        .register(&Credentials::new("alice", "wonderland"))
        .await
        .unwrap();

    let wrong_password = services
        .accounts
        .login(&Credentials::new("alice", "looking-glass"))
        .await
        .unwrap_err();
    let unknown_user = services
        .accounts
        .login(&Credentials::new("mallory", "wonderland"))
        .await
        .unwrap_err();

    assert_eq!(wrong_password, unknown_user);
    assert!(matches!(wrong_password, BookingError::Unauthenticated(_)));
}

#[tokio::test]
async fn unknown_token_and_anonymous_viewer_are_unauthenticated() {
    let services = TestServices::new();

    assert!(matches!(
        services.accounts.authenticate("nope").await,
        Err(BookingError::Unauthenticated(_))
    ));
    assert!(matches!(
        services.accounts.current_user(&Viewer::Anonymous),
        Err(BookingError::Unauthenticated(_))
    ));
}

#[tokio::test]
async fn ensure_admin_creates_then_promotes() {
    let services = TestServices::new();

    let created = services.accounts.ensure_admin("root", "toor").await.unwrap();
    assert!(created.is_staff && created.is_superuser);
    let again = services.accounts.ensure_admin("root", "other").await.unwrap();
    assert_eq!(again.id, created.id);
    assert_eq!(services.users.user_count(), 1);

    services
        .accounts
        .register(&Credentials::new("alice", "wonderland"))
        .await
        .unwrap();
    let promoted = services
        .accounts
        .ensure_admin("alice", "ignored")
        .await
        .unwrap();
    assert!(promoted.is_staff);

    let login = services
        .accounts
        .login(&Credentials::new("alice", "wonderland"))
        .await
        .unwrap();
    assert!(login.is_admin);
}
