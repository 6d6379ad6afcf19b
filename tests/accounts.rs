mod common;

use common::{init_tracing, paris_trip};
use journy::auth::{AuthProvider, MemoryAuth};
use journy::config::ClientOptions;
use journy::error::Error;
use journy::mapper::{encode_trip, Decoded};
use journy::Journy;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_sign_up_then_sign_in() {
    init_tracing();
    let journy = Journy::in_memory();

    let created = journy.sign_up("a@b.com", "secret1").await.unwrap();
    journy.sign_out().await.unwrap();

    let signed_in = journy.sign_in("a@b.com", "secret1").await.unwrap();
    assert_eq!(signed_in.id, created.id);
    assert_eq!(signed_in.email, "a@b.com");
    journy.sign_out().await.unwrap();

    match journy.sign_in("a@b.com", "wrong-password").await {
        Err(Error::Auth(_)) => {}
        other => panic!("expected an auth error, got {:?}", other),
    }
    assert!(journy.current_user().is_none());
}

#[tokio::test]
async fn test_state_listener_sees_sign_in_and_out() {
    let auth = MemoryAuth::new();
    let mut state = auth.on_state_change();

    let user = auth.sign_up("c@d.org", "secret1").await.unwrap();
    state.changed().await.unwrap();
    assert_eq!(state.borrow_and_update().clone(), Some(user));

    auth.sign_out().await.unwrap();
    state.changed().await.unwrap();
    assert_eq!(*state.borrow(), None);
}

#[tokio::test]
async fn test_hosted_backends_share_the_session() {
    init_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "jwt-u1",
            "refresh_token": "refresh",
            "token_type": "bearer",
            "expires_in": 3600,
            "user": {"id": "u1", "email": "a@b.com"}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/documents/v1/users/u1"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let paris = paris_trip();
    Mock::given(method("GET"))
        .and(path("/documents/v1/users/u1/trips"))
        .and(header("apikey", "anon-key"))
        .and(header("Authorization", "Bearer jwt-u1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": paris.id, "version": 4, "fields": encode_trip(&paris)},
            {"id": "zz-broken", "version": 1, "fields": {"id": "zz-broken", "title": "no dates"}}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let journy =
        Journy::new_with_options(&server.uri(), "anon-key", ClientOptions::default()).unwrap();
    let user = journy.sign_in("a@b.com", "secret1").await.unwrap();
    assert_eq!(user.id, "u1");

    match journy.trips().unwrap().fetch_trips().await.unwrap() {
        Decoded::Partial { value, warnings } => {
            assert_eq!(value, vec![paris]);
            assert_eq!(warnings.len(), 1);
            assert_eq!(warnings[0].index, 1);
        }
        other => panic!("expected a partial list, got {:?}", other),
    }
}
