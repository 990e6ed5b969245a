use jsonwebtoken::{Algorithm, EncodingKey, Header};
use messagely_api::config::AppConfig;
use messagely_auth::HashingCost;
use reqwest::StatusCode;
use serde_json::{Value, json};

const SECRET: &str = "test-secret";

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        messagely_observability::init_for_tests();

        // Same router as prod, in-memory store, cheap hashing, ephemeral port.
        let config = AppConfig::new(SECRET, HashingCost::new(8, 1, 1));
        let app = messagely_api::app::build_app(&config)
            .await
            .expect("failed to build app");
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
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn register(&self, username: &str) -> String {
        let res = self
            .client
            .post(self.url("/auth/register"))
            .json(&json!({
                "username": username,
                "password": "secret",
                "first_name": "First",
                "last_name": "Last",
                "phone": "555-0100",
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        let body: Value = res.json().await.unwrap();
        body["token"].as_str().unwrap().to_string()
    }

    async fn get(&self, path: &str, token: Option<&str>) -> reqwest::Response {
        let mut req = self.client.get(self.url(path));
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        req.send().await.unwrap()
    }

    async fn send_message(&self, token: &str, to: &str, body: &str) -> String {
        let res = self
            .client
            .post(self.url("/messages"))
            .bearer_auth(token)
            .json(&json!({ "to_username": to, "body": body }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        let body: Value = res.json().await.unwrap();
        body["message"]["id"].as_str().unwrap().to_string()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn assert_unauthorized(res: reqwest::Response) {
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Unauthorized");
}

fn forge(secret: &str, username: &str) -> String {
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &json!({ "username": username }),
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("failed to encode jwt")
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;
    let res = srv.get("/health", None).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn register_then_login_issues_tokens() {
    let srv = TestServer::spawn().await;
    let registered = srv.register("bob").await;
    assert!(!registered.is_empty());

    let res = srv
        .client
        .post(srv.url("/auth/login"))
        .json(&json!({ "username": "bob", "password": "secret" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Logged in");
    let token = body["token"].as_str().unwrap();

    let res = srv.get("/users", Some(token)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    let users = body["users"].as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["username"], "bob");
    assert!(users[0].get("password_hash").is_none());
}

#[tokio::test]
async fn duplicate_registration_is_rejected() {
    let srv = TestServer::spawn().await;
    srv.register("bob").await;

    let res = srv
        .client
        .post(srv.url("/auth/register"))
        .json(&json!({
            "username": "bob",
            "password": "other",
            "first_name": "B",
            "last_name": "B",
            "phone": "1",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Username already in use");
}

#[tokio::test]
async fn missing_inputs_are_reported() {
    let srv = TestServer::spawn().await;
    let res = srv
        .client
        .post(srv.url("/auth/login"))
        .json(&json!({ "username": "bob" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Missing required inputs");
}

#[tokio::test]
async fn login_failures_look_the_same() {
    let srv = TestServer::spawn().await;
    srv.register("bob").await;

    let mut messages = Vec::new();
    for (username, password) in [("bob", "wrong"), ("nobody", "secret")] {
        let res = srv
            .client
            .post(srv.url("/auth/login"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = res.json().await.unwrap();
        messages.push(body["message"].clone());
    }
    assert_eq!(messages[0], "Invalid username/password");
    assert_eq!(messages[0], messages[1]);
}

#[tokio::test]
async fn protected_routes_need_a_valid_token() {
    let srv = TestServer::spawn().await;
    let token = srv.register("bob").await;

    assert_unauthorized(srv.get("/users", None).await).await;
    assert_unauthorized(srv.get("/users", Some("not-a-token")).await).await;
    assert_unauthorized(srv.get("/users", Some(&forge("other-secret", "bob"))).await).await;

    let mut tampered = token.clone().into_bytes();
    let sig = token.rfind('.').unwrap() + 1;
    tampered[sig] = if tampered[sig] == b'A' { b'B' } else { b'A' };
    let tampered = String::from_utf8(tampered).unwrap();
    assert_unauthorized(srv.get("/users", Some(&tampered)).await).await;

    let res = srv.get("/users", Some(&forge(SECRET, "bob"))).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn token_is_accepted_from_query_and_body() {
    let srv = TestServer::spawn().await;
    let bob = srv.register("bob").await;
    srv.register("carol").await;

    let res = srv.get(&format!("/users?_token={bob}"), None).await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = srv
        .client
        .post(srv.url("/messages"))
        .json(&json!({ "_token": bob, "to_username": "carol", "body": "hi" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"]["from_username"], "bob");
    assert_eq!(body["message"]["body"], "hi");
}

#[tokio::test]
async fn users_only_see_their_own_profile_and_mailboxes() {
    let srv = TestServer::spawn().await;
    let bob = srv.register("bob").await;
    srv.register("carol").await;

    let res = srv.get("/users/bob", Some(&bob)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["user"]["username"], "bob");
    assert!(body["user"]["join_at"].is_string());

    for path in ["/users/carol", "/users/carol/to", "/users/carol/from"] {
        assert_unauthorized(srv.get(path, Some(&bob)).await).await;
    }
    assert_unauthorized(srv.get("/users/bob", None).await).await;
}

#[tokio::test]
async fn message_access_follows_participants() {
    let srv = TestServer::spawn().await;
    let bob = srv.register("bob").await;
    let carol = srv.register("carol").await;
    let dave = srv.register("dave").await;

    let id = srv.send_message(&bob, "carol", "hello carol").await;
    let path = format!("/messages/{id}");

    for token in [&bob, &carol] {
        let res = srv.get(&path, Some(token)).await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["message"]["from_user"]["username"], "bob");
        assert_eq!(body["message"]["to_user"]["username"], "carol");
    }
    assert_unauthorized(srv.get(&path, Some(&dave)).await).await;

    let res = srv.get("/users/carol/to", Some(&carol)).await;
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["messages"].as_array().unwrap().len(), 1);
    assert_eq!(body["messages"][0]["from_user"]["username"], "bob");

    let res = srv.get("/users/bob/from", Some(&bob)).await;
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["messages"][0]["to_user"]["username"], "carol");
}

#[tokio::test]
async fn only_the_recipient_marks_read() {
    let srv = TestServer::spawn().await;
    let bob = srv.register("bob").await;
    let carol = srv.register("carol").await;
    let dave = srv.register("dave").await;

    let id = srv.send_message(&bob, "carol", "read me").await;
    let path = srv.url(&format!("/messages/{id}/read"));

    for token in [&bob, &dave] {
        let res = srv.client.post(&path).bearer_auth(token).send().await.unwrap();
        assert_unauthorized(res).await;
    }

    let res = srv.client.post(&path).bearer_auth(&carol).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let first: Value = res.json().await.unwrap();
    assert_eq!(first["message"]["id"], id.as_str());
    assert!(first["message"]["read_at"].is_string());

    let res = srv.client.post(&path).bearer_auth(&carol).send().await.unwrap();
    let second: Value = res.json().await.unwrap();
    assert_eq!(first["message"]["read_at"], second["message"]["read_at"]);
}

#[tokio::test]
async fn missing_and_malformed_ids_are_unauthorized() {
    let srv = TestServer::spawn().await;
    let bob = srv.register("bob").await;

    assert_unauthorized(srv.get("/messages/not-an-id", Some(&bob)).await).await;
    assert_unauthorized(
        srv.get(&format!("/messages/{}", messagely_core::MessageId::new()), Some(&bob))
            .await,
    )
    .await;
}

#[tokio::test]
async fn posting_to_unknown_recipient_is_404() {
    let srv = TestServer::spawn().await;
    let bob = srv.register("bob").await;

    let res = srv
        .client
        .post(srv.url("/messages"))
        .bearer_auth(&bob)
        .json(&json!({ "to_username": "ghost", "body": "anyone?" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = srv
        .client
        .post(srv.url("/messages"))
        .bearer_auth(&bob)
        .json(&json!({ "to_username": "ghost", "body": "  " }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}
