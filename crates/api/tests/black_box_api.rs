use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use gatehouse_api::app::{build_app, build_services, notes::default_policy, AppServices};
use gatehouse_auth::{AuthConfig, Identity, Role, TokenClaims, TokenKind};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{json, Value};

const JWT_SECRET: &str = "test-secret";

struct TestServer {
    base_url: String,
    services: Arc<AppServices>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod, bound to an ephemeral port.
        let services = Arc::new(build_services(
            &AuthConfig::new(JWT_SECRET.as_bytes().to_vec()),
            default_policy(),
        ));
        let app = build_app(services.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            services,
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn user(&self, login: &str, role: &'static str) -> Identity {
        self.services
            .register_user(login, login, Role::new(role), &format!("{login}-pw"))
            .unwrap()
    }

    async fn login(&self, client: &reqwest::Client, login: &str) -> Value {
        let res = client
            .post(self.url("/auth/login"))
            .json(&json!({ "login_id": login, "secret": format!("{login}-pw") }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        res.json().await.unwrap()
    }

    async fn access_token(&self, client: &reqwest::Client, login: &str) -> String {
        self.login(client, login).await["access_token"]
            .as_str()
            .unwrap()
            .to_string()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(identity: &Identity, typ: TokenKind, issued_ago: ChronoDuration, ttl: ChronoDuration) -> String {
    let iat = Utc::now() - issued_ago;
    let claims = TokenClaims {
        sub: identity.id.unwrap().to_string(),
        role: identity.role.clone(),
        typ,
        iat: iat.timestamp(),
        exp: (iat + ttl).timestamp(),
        iss: "gatehouse".to_string(),
        jti: "test".to_string(),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("failed to encode jwt")
}

/// First value recorded under `key` in the status' `ErrorInfo` metadata.
fn metadata<'a>(body: &'a Value, key: &str) -> Option<&'a str> {
    body["details"][0]["metadata"]
        .as_array()?
        .iter()
        .find(|entry| entry["key"] == key)
        .and_then(|entry| entry["value"].as_str())
}

async fn create_note(client: &reqwest::Client, srv: &TestServer, token: &str, title: &str) -> Value {
    let res = client
        .post(srv.url("/notes"))
        .bearer_auth(token)
        .json(&json!({ "title": title, "body": "..." }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    res.json().await.unwrap()
}

#[tokio::test]
async fn anonymous_call_to_open_action_succeeds() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client.get(srv.url("/notes")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await.unwrap(), json!([]));

    let res = client.get(srv.url("/whoami")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["anonymous"], true);
    assert_eq!(body["role"], "guest");
    assert!(body["user_id"].is_null());
}

#[tokio::test]
async fn non_bearer_scheme_is_anonymous_but_empty_bearer_is_rejected() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .get(srv.url("/whoami"))
        .header("Authorization", "Basic dXNlcjpwYXNz")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await.unwrap()["anonymous"], true);

    for header in ["Bearer", "Bearer    ", "Bearer not-a-jwt", "bearer a b"] {
        let res = client
            .get(srv.url("/whoami"))
            .header("Authorization", header)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{header:?}");
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["code"], "UNAUTHENTICATED");
    }
}

#[tokio::test]
async fn anonymous_cannot_create() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/notes"))
        .json(&json!({ "title": "hi" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], "PERMISSION_DENIED");
    assert_eq!(metadata(&body, "permission"), Some("note_create"));
}

#[tokio::test]
async fn owner_only_action_on_foreign_object_is_denied() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    srv.user("alice", "user");
    srv.user("bob", "user");

    let alice = srv.access_token(&client, "alice").await;
    let bob = srv.access_token(&client, "bob").await;
    let note = create_note(&client, &srv, &alice, "alice's note").await;
    let id = note["id"].as_str().unwrap();

    let res = client
        .put(srv.url(&format!("/notes/{id}")))
        .header("Authorization", format!("Bearer {bob}"))
        .json(&json!({ "title": "mine now" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(res.json::<Value>().await.unwrap()["code"], "PERMISSION_DENIED");

    // Bob can still read it: detail is open.
    let res = client
        .get(srv.url(&format!("/notes/{id}")))
        .bearer_auth(&bob)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await.unwrap()["title"], "alice's note");
}

#[tokio::test]
async fn owner_and_admin_may_modify() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    srv.user("alice", "user");
    srv.user("root", "admin");

    let alice = srv.access_token(&client, "alice").await;
    let root = srv.access_token(&client, "root").await;
    let note = create_note(&client, &srv, &alice, "draft").await;
    let id = note["id"].as_str().unwrap();

    let res = client
        .put(srv.url(&format!("/notes/{id}")))
        .bearer_auth(&alice)
        .json(&json!({ "title": "final" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await.unwrap()["title"], "final");

    let res = client
        .delete(srv.url(&format!("/notes/{id}")))
        .bearer_auth(&root)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client
        .get(srv.url(&format!("/notes/{id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["details"][0]["reason"], "RESOURCE_NOT_FOUND");
    assert_eq!(metadata(&body, "id"), Some(id));
}

#[tokio::test]
async fn expired_token_is_unauthenticated_and_handler_never_runs() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let alice = srv.user("alice", "user");

    let expired = mint_jwt(
        &alice,
        TokenKind::Access,
        ChronoDuration::minutes(30),
        ChronoDuration::minutes(15),
    );

    let res = client
        .post(srv.url("/notes"))
        .bearer_auth(&expired)
        .json(&json!({ "title": "should not exist" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], "UNAUTHENTICATED");
    assert_eq!(metadata(&body, "cause"), Some("CREDENTIAL_EXPIRED"));

    assert!(srv.services.notes.list().unwrap().is_empty());
}

#[tokio::test]
async fn refresh_token_is_not_a_bearer_credential() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    srv.user("alice", "user");

    let pair = srv.login(&client, "alice").await;
    let res = client
        .get(srv.url("/whoami"))
        .bearer_auth(pair["refresh_token"].as_str().unwrap())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(metadata(&body, "cause"), Some("INVALID_CREDENTIALS"));
}

#[tokio::test]
async fn refresh_issues_a_working_pair() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let alice = srv.user("alice", "user");

    let pair = srv.login(&client, "alice").await;
    let res = client
        .post(srv.url("/auth/refresh"))
        .json(&json!({ "refresh_token": pair["refresh_token"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let next: Value = res.json().await.unwrap();
    assert_eq!(next["token_type"], "Bearer");

    let res = client
        .get(srv.url("/whoami"))
        .bearer_auth(next["access_token"].as_str().unwrap())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["user_id"], alice.id.unwrap().to_string());
    assert_eq!(body["role"], "user");

    // Access tokens cannot refresh; expired refresh tokens are rejected.
    let res = client
        .post(srv.url("/auth/refresh"))
        .json(&json!({ "refresh_token": pair["access_token"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(res.json::<Value>().await.unwrap()["details"][0]["reason"], "INVALID_CREDENTIALS");

    let stale = mint_jwt(&alice, TokenKind::Refresh, ChronoDuration::days(8), ChronoDuration::days(7));
    let res = client
        .post(srv.url("/auth/refresh"))
        .json(&json!({ "refresh_token": stale }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(res.json::<Value>().await.unwrap()["details"][0]["reason"], "CREDENTIAL_EXPIRED");
}

#[tokio::test]
async fn wrong_secret_and_unknown_login_are_indistinguishable() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    srv.user("alice", "user");

    let wrong_secret = client
        .post(srv.url("/auth/login"))
        .json(&json!({ "login_id": "alice", "secret": "nope" }))
        .send()
        .await
        .unwrap();
    let unknown_login = client
        .post(srv.url("/auth/login"))
        .json(&json!({ "login_id": "mallory", "secret": "alice-pw" }))
        .send()
        .await
        .unwrap();

    assert_eq!(wrong_secret.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_secret.status(), unknown_login.status());
    let a: Value = wrong_secret.json().await.unwrap();
    let b: Value = unknown_login.json().await.unwrap();
    assert_eq!(a, b);
    assert_eq!(a["details"][0]["reason"], "INVALID_CREDENTIALS");
}

#[tokio::test]
async fn deleted_subject_is_unauthenticated() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let alice = srv.user("alice", "user");

    let token = srv.access_token(&client, "alice").await;
    srv.services.identities.remove(alice.id.unwrap()).unwrap();

    let res = client
        .get(srv.url("/whoami"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(metadata(&body, "cause"), Some("IDENTITY_NOT_FOUND"));
}

#[tokio::test]
async fn validation_errors_carry_field_violations() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    srv.user("alice", "user");
    let alice = srv.access_token(&client, "alice").await;

    let res = client
        .post(srv.url("/notes"))
        .bearer_auth(&alice)
        .json(&json!({ "title": "   " }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], "INVALID_ARGUMENT");
    assert_eq!(body["details"][0]["type"], "bad_request");
    assert_eq!(body["details"][0]["field_violations"][0]["field"], "title");
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;
    let res = reqwest::get(srv.url("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn malformed_bodies_get_a_structured_status() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/auth/login"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], "INVALID_ARGUMENT");
    assert_eq!(body["details"][0]["type"], "bad_request");
    assert_eq!(body["details"][0]["field_violations"][0]["field"], "body");

    let res = client
        .post(srv.url("/auth/refresh"))
        .json(&json!({ "token": "wrong field name" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(res.json::<Value>().await.unwrap()["code"], "INVALID_ARGUMENT");
}

#[tokio::test]
async fn error_metadata_is_an_ordered_list() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    srv.user("alice", "user");
    let alice = srv.access_token(&client, "alice").await;

    let res = client
        .put(srv.url("/notes/not-a-uuid"))
        .bearer_auth(&alice)
        .json(&json!({ "title": "x" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    let entries = body["details"][0]["metadata"].as_array().unwrap();
    assert_eq!(entries[0], json!({ "key": "kind", "value": "note" }));
    assert_eq!(entries[1], json!({ "key": "id", "value": "not-a-uuid" }));
}
