//! Error surfacing: server messages, auth failures and cancellation.

mod common;

use std::time::Duration;

use assert_matches::assert_matches;

use dealerdash_client::error::GENERIC_ERROR_MESSAGE;
use dealerdash_client::resources::{Brands, NewsFeed};
use dealerdash_client::toaster::{handle_req_with_toaster, RecordingNotifier, ToastMessages};
use dealerdash_client::ClientError;
use dealerdash_core::error::CoreError;
use dealerdash_core::locale::Locale;
use dealerdash_core::pagination::ListQuery;
use dealerdash_core::session::{AdminProfile, AuthToken, Session};

use common::*;

#[tokio::test]
async fn server_message_becomes_error_toast() {
    let backend = spawn_backend().await;
    let api = super_admin_client(&backend).await;
    let notifier = RecordingNotifier::new();

    let result = handle_req_with_toaster(
        &notifier,
        ToastMessages::new("Deleting brand...", "Brand deleted"),
        api.delete(&Brands, 1),
    )
    .await;

    assert_matches!(result, Err(ClientError::Api { status: 409, .. }));
    assert_eq!(notifier.last_error().as_deref(), Some("Brand has models"));
}

#[tokio::test]
async fn empty_error_body_falls_back_to_generic_message() {
    let backend = spawn_backend().await;
    let api = super_admin_client(&backend).await;

    let err = api.delete(&NewsFeed, 4).await.unwrap_err();

    assert_matches!(err, ClientError::Api { status: 500, .. });
    assert_eq!(err.toast_message(), GENERIC_ERROR_MESSAGE);
}

#[tokio::test]
async fn wrong_password_is_reported_and_session_stays_anonymous() {
    let backend = spawn_backend().await;
    let api = client(&backend, Session::anonymous(Locale::En));

    let err = api.login("admin@example.com", "nope").await.unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(err.toast_message(), "Invalid email or password");
    assert!(!api.session().read().await.is_authenticated());
}

#[tokio::test]
async fn expired_token_yields_unauthorized() {
    let backend = spawn_backend().await;
    let mut session = Session::anonymous(Locale::En);
    session.login(
        AuthToken::new("expired"),
        AdminProfile {
            id: 1,
            name: "Sara".into(),
            email: "admin@example.com".into(),
            role: "superAdmin".into(),
            permissions: Default::default(),
        },
    );
    let api = client(&backend, session);

    let err = api.me().await.unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(err.toast_message(), "Session expired");
}

#[tokio::test]
async fn anonymous_session_never_hits_the_network() {
    let backend = spawn_backend().await;
    let api = client(&backend, Session::anonymous(Locale::En));

    assert_matches!(
        api.list_all(&Brands).await,
        Err(ClientError::Core(CoreError::Unauthorized(_)))
    );
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn logout_clears_credentials() {
    let backend = spawn_backend().await;
    let api = super_admin_client(&backend).await;
    assert_eq!(api.me().await.unwrap().role, "superAdmin");

    api.logout().await;

    assert!(api.session().read().await.token().is_none());
    assert!(api.cache().is_empty().await);
}

// -- cancellation --

#[tokio::test]
async fn cancelling_a_scope_aborts_in_flight_request() {
    let backend = spawn_backend().await;
    let api = super_admin_client(&backend).await;
    let scoped = api.scoped();

    let token = scoped.cancellation_token();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        token.cancel();
    });

    let started = std::time::Instant::now();
    let result = scoped.list(&NewsFeed, &ListQuery::default()).await;

    assert_matches!(result, Err(ClientError::Cancelled));
    assert!(started.elapsed() < Duration::from_secs(2));
    // The parent handle is unaffected.
    assert!(api.me().await.is_ok());
}
