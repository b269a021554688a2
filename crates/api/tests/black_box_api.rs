use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{Value, json};

use ers_api::app::{self, services::Stores};
use ers_auth::{
    Argon2PasswordHasher, AuthService, Hs256TokenService, PasswordHasher, Principal, Role,
    TokenClaims, TokenVerifier,
};
use ers_core::{EmployeeId, IdentityId};
use ers_directory::DirectoryService;
use ers_reimbursement::ReimbursementService;

const SECRET: &str = "black-box-secret-black-box-secret-0123";

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(app: axum::Router) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn tokens() -> Arc<Hs256TokenService> {
    Arc::new(Hs256TokenService::new(SECRET, ChronoDuration::minutes(10)).unwrap())
}

async fn spawn_auth() -> TestServer {
    let tokens = tokens();
    let verifier: Arc<dyn TokenVerifier> = tokens.clone();
    let hasher: Arc<dyn PasswordHasher> = Arc::new(Argon2PasswordHasher::new());
    let auth = AuthService::new(Stores::in_memory().credentials, hasher, tokens);
    TestServer::spawn(app::build_auth_app(Arc::new(auth), verifier)).await
}

async fn spawn_directory() -> TestServer {
    let hasher: Arc<dyn PasswordHasher> = Arc::new(Argon2PasswordHasher::new());
    let directory = DirectoryService::new(Stores::in_memory().directory, hasher);
    TestServer::spawn(app::build_directory_app(Arc::new(directory), tokens())).await
}

async fn spawn_reimbursement() -> TestServer {
    let reimbursements = ReimbursementService::new(Stores::in_memory().reimbursements);
    TestServer::spawn(app::build_reimbursement_app(Arc::new(reimbursements), tokens())).await
}

fn token_for(role: Role, employee_id: i64, manager_id: Option<i64>) -> String {
    let principal = Principal {
        identity_id: IdentityId::new(),
        username: format!("user{employee_id}"),
        role,
        employee_id: Some(EmployeeId::new(employee_id)),
        manager_id: manager_id.map(EmployeeId::new),
    };
    tokens().issue(&principal).unwrap().token
}

fn mint_raw(secret: &str, iat: chrono::DateTime<Utc>, ttl: ChronoDuration) -> String {
    let claims = TokenClaims {
        sub: IdentityId::new(),
        username: "raw".to_string(),
        role: Role::Manager,
        employee_id: Some(EmployeeId::new(2)),
        manager_id: None,
        iat: iat.timestamp(),
        exp: (iat + ttl).timestamp(),
    };
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("failed to encode jwt")
}

async fn create_reimbursement(
    client: &reqwest::Client,
    server: &TestServer,
    token: &str,
    body: Value,
) -> reqwest::Response {
    client
        .post(server.url("/api/reimbursements"))
        .bearer_auth(token)
        .json(&body)
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn health_is_public_on_every_service() {
    let client = reqwest::Client::new();
    for server in [spawn_auth().await, spawn_directory().await, spawn_reimbursement().await] {
        let res = client.get(server.url("/health")).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn missing_token_is_401_on_every_service() {
    let client = reqwest::Client::new();
    let cases = [
        (spawn_auth().await, "/api/auth/me"),
        (spawn_directory().await, "/api/employees"),
        (spawn_reimbursement().await, "/api/reimbursements"),
    ];

    for (server, path) in cases {
        let res = client.get(server.url(path)).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{path}");
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["error"], "unauthorized");
    }
}

#[tokio::test]
async fn expired_and_foreign_tokens_are_rejected_with_distinct_codes() {
    let server = spawn_reimbursement().await;
    let client = reqwest::Client::new();

    let expired = mint_raw(SECRET, Utc::now() - ChronoDuration::hours(2), ChronoDuration::minutes(10));
    let res = client
        .get(server.url("/api/reimbursements"))
        .bearer_auth(&expired)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "token_expired");

    let foreign = mint_raw(
        "some-other-service-key-some-other-service-key",
        Utc::now(),
        ChronoDuration::minutes(10),
    );
    let res = client
        .get(server.url("/api/reimbursements"))
        .bearer_auth(&foreign)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "token_malformed");

    let res = client
        .get(server.url("/api/reimbursements"))
        .header("Authorization", "Basic dXNlcjpwdw==")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // Valid signature, but the claims do not decode (no username, unknown role).
    let now = Utc::now().timestamp();
    let unusable = jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &json!({ "sub": IdentityId::new().to_string(), "role": "ADMIN", "iat": now, "exp": now + 600 }),
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap();
    let res = client
        .get(server.url("/api/reimbursements"))
        .bearer_auth(&unusable)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "token_invalid");
}

#[tokio::test]
async fn register_login_and_me_round_trip_claims() {
    let server = spawn_auth().await;
    let client = reqwest::Client::new();

    let res = client
        .post(server.url("/api/auth/register"))
        .json(&json!({
            "username": "alice",
            "password": "s3cret",
            "role": "EMPLOYEE",
            "employeeId": 1,
            "managerId": 2,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "User registered successfully");

    let res = client
        .post(server.url("/api/auth/login"))
        .json(&json!({ "username": "alice", "password": "s3cret" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["tokenType"], "Bearer");
    let token = body["token"].as_str().unwrap().to_string();

    let claims = tokens().verify(&token, Utc::now()).unwrap();
    assert_eq!(claims.role, Role::Employee);
    assert_eq!(claims.employee_id, Some(EmployeeId::new(1)));
    assert_eq!(claims.manager_id, Some(EmployeeId::new(2)));

    let me: Value = client
        .get(server.url("/api/auth/me"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(me["username"], "alice");
    assert_eq!(me["role"], "EMPLOYEE");
    assert_eq!(me["managerId"], 2);
}

#[tokio::test]
async fn login_failures_and_registration_rules() {
    let server = spawn_auth().await;
    let client = reqwest::Client::new();

    let res = client
        .post(server.url("/api/auth/login"))
        .json(&json!({ "username": "nobody", "password": "x" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_credentials");

    let res = client
        .post(server.url("/api/auth/register"))
        .json(&json!({ "username": "bob", "password": "pw", "role": "EMPLOYEE", "employeeId": 3 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "missing_manager");

    let res = client
        .post(server.url("/api/auth/register"))
        .json(&json!({ "username": "carol", "password": "pw", "role": "ADMIN" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .post(server.url("/api/auth/register"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn directory_enforces_manager_and_self_access() {
    let server = spawn_directory().await;
    let client = reqwest::Client::new();
    let manager = token_for(Role::Manager, 2, None);
    let employee = token_for(Role::Employee, 1, Some(2));

    let res = client
        .post(server.url("/api/employees"))
        .bearer_auth(&manager)
        .json(&json!({ "username": "alice", "password": "pw", "role": "EMPLOYEE", "employeeId": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let alice: Value = res.json().await.unwrap();
    assert_eq!(alice["managerId"], 2);
    assert!(alice.get("passwordHash").is_none());
    let alice_id = alice["id"].as_str().unwrap().to_string();

    let res = client
        .post(server.url("/api/employees"))
        .bearer_auth(&manager)
        .json(&json!({ "username": "dave", "password": "pw", "role": "EMPLOYEE", "employeeId": 4 }))
        .send()
        .await
        .unwrap();
    let dave: Value = res.json().await.unwrap();
    let dave_id = dave["id"].as_str().unwrap().to_string();

    let res = client
        .post(server.url("/api/employees"))
        .bearer_auth(&employee)
        .json(&json!({ "username": "eve", "password": "pw", "role": "EMPLOYEE", "employeeId": 5 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    for query in ["", "?managerId=2", "?managerId=not-a-number"] {
        let res = client
            .get(server.url(&format!("/api/employees{query}")))
            .bearer_auth(&employee)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::FORBIDDEN, "{query}");
    }

    let listed: Vec<Value> = client
        .get(server.url("/api/employees?managerId=2"))
        .bearer_auth(&manager)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed.len(), 2);

    let res = client
        .get(server.url(&format!("/api/employees/{alice_id}")))
        .bearer_auth(&employee)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .get(server.url(&format!("/api/employees/{dave_id}")))
        .bearer_auth(&employee)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .delete(server.url(&format!("/api/employees/{dave_id}")))
        .bearer_auth(&manager)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client
        .get(server.url(&format!("/api/employees/{dave_id}")))
        .bearer_auth(&manager)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .get(server.url("/api/employees/not-a-uuid"))
        .bearer_auth(&manager)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn reimbursement_approval_scenario() {
    let server = spawn_reimbursement().await;
    let client = reqwest::Client::new();
    let employee = token_for(Role::Employee, 1, Some(2));
    let manager = token_for(Role::Manager, 2, None);
    let other_manager = token_for(Role::Manager, 999, None);

    let res = create_reimbursement(
        &client,
        &server,
        &employee,
        json!({ "employeeId": 1, "managerId": 2, "amount": "1000.00", "description": "Travel" }),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let created: Value = res.json().await.unwrap();
    assert_eq!(created["status"], "PENDING");
    assert_eq!(created["amount"], "1000.00");
    assert!(created["actionAt"].is_null());
    let id = created["id"].as_str().unwrap().to_string();

    let res = client
        .put(server.url(&format!("/api/reimbursements/{id}/approve")))
        .bearer_auth(&other_manager)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: Value = res.json().await.unwrap();
    assert_eq!(
        body["message"],
        "Only the assigned manager can approve this reimbursement"
    );

    let res = client
        .put(server.url(&format!("/api/reimbursements/{id}/approve")))
        .bearer_auth(&employee)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .put(server.url(&format!("/api/reimbursements/{id}/approve")))
        .bearer_auth(&manager)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let approved: Value = res.json().await.unwrap();
    assert_eq!(approved["status"], "APPROVED");
    assert!(!approved["actionAt"].is_null());
    assert_eq!(approved["version"], 2);

    let res = client
        .put(server.url(&format!("/api/reimbursements/{id}/approve")))
        .bearer_auth(&manager)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Only PENDING reimbursements can be approved");

    let res = client
        .delete(server.url(&format!("/api/reimbursements/{id}")))
        .bearer_auth(&employee)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let listed: Vec<Value> = client
        .get(server.url("/api/reimbursements?managerId=2"))
        .bearer_auth(&manager)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
async fn reimbursement_create_and_delete_rules() {
    let server = spawn_reimbursement().await;
    let client = reqwest::Client::new();
    let employee = token_for(Role::Employee, 1, Some(2));
    let manager = token_for(Role::Manager, 2, None);

    let res = create_reimbursement(
        &client,
        &server,
        &employee,
        json!({ "employeeId": 1, "managerId": 1, "amount": "5.00", "description": "Lunch" }),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "same_party");

    let res = create_reimbursement(
        &client,
        &server,
        &employee,
        json!({ "employeeId": 1, "managerId": 2, "description": "Lunch" }),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["field"], "amount");

    let created: Value = create_reimbursement(
        &client,
        &server,
        &employee,
        json!({ "employeeId": 1, "managerId": 2, "amount": "12.50", "description": "Taxi" }),
    )
    .await
    .json()
    .await
    .unwrap();
    let id = created["id"].as_str().unwrap().to_string();

    let res = client
        .delete(server.url(&format!("/api/reimbursements/{id}?actorId=7")))
        .bearer_auth(&employee)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .delete(server.url(&format!("/api/reimbursements/{id}")))
        .bearer_auth(&manager)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "operation_not_allowed");

    let res = client
        .delete(server.url(&format!("/api/reimbursements/{id}?actorId=1")))
        .bearer_auth(&employee)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client
        .get(server.url(&format!("/api/reimbursements/{id}")))
        .bearer_auth(&employee)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
