use std::sync::Arc;
use std::time::Duration;

use coursegate_core::{ModuleId, ProductId};
use coursegate_events::{EntitlementEvent, EventBus};
use coursegate_infra::{AppConfig, EntitlementRuntime};
use reqwest::StatusCode;
use serde_json::{json, Value};

const USER: u64 = 5;
const OTHER_USER: u64 = 6;
const MODULE: u64 = 3;
const COURSE: u64 = 7;
const OTHER_COURSE: u64 = 8;
const PRODUCT: u64 = 42;
const TOKEN: &str = "test-service-token";

struct TestServer {
    base_url: String,
    runtime: Arc<EntitlementRuntime>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        Self::spawn_with(AppConfig {
            service_token: Some(TOKEN.to_string()),
            dev_routes: true,
            ..AppConfig::default()
        })
        .await
    }

    async fn spawn_with(config: AppConfig) -> Self {
        // Same router as prod, bound to an ephemeral port.
        let runtime = Arc::new(EntitlementRuntime::in_memory(&config));
        runtime.start().expect("failed to start grant worker");

        let app = coursegate_api::app::build_app(runtime.clone(), &config);
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
            runtime,
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
        self.runtime.shutdown();
    }
}

fn as_service(req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    req.header("x-service-token", TOKEN)
}

fn as_user(req: reqwest::RequestBuilder, user: u64) -> reqwest::RequestBuilder {
    req.header("x-user-id", user.to_string())
}

/// Course 7 "Rust Basics" with module 3 gated behind product 42.
async fn seed(client: &reqwest::Client, server: &TestServer) {
    let res = as_service(client.put(server.url(&format!("/host/courses/{COURSE}"))))
        .json(&json!({"title": "Rust Basics"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = as_service(client.put(server.url(&format!("/host/modules/{MODULE}"))))
        .json(&json!({"name": "Ownership Deep Dive", "course_id": COURSE}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = as_service(client.put(server.url(&format!("/host/products/{PRODUCT}"))))
        .json(&json!({
            "name": "Ownership module",
            "permalink": "https://shop.example/p/42",
            "pricing": {"base_price": 1999, "currency": "USD"}
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = as_service(client.put(server.url(&format!("/modules/{MODULE}/product"))))
        .json(&json!({"product_id": PRODUCT}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

async fn enroll(client: &reqwest::Client, server: &TestServer, course: u64, user: u64) {
    let res = as_service(client.post(server.url(&format!("/host/courses/{course}/students/{user}"))))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
}

async fn validate(client: &reqwest::Client, server: &TestServer, user: Option<u64>) -> Value {
    let mut req = client
        .post(server.url("/cart/validate"))
        .json(&json!({"product_id": PRODUCT}));
    if let Some(user) = user {
        req = as_user(req, user);
    }
    let res = req.send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    res.json().await.unwrap()
}

async fn access(client: &reqwest::Client, server: &TestServer, user: u64, query: &str) -> reqwest::Response {
    as_user(client.get(server.url(&format!("/modules/{MODULE}/access{query}"))), user)
        .send()
        .await
        .unwrap()
}

async fn granted_modules_eventually(
    client: &reqwest::Client,
    server: &TestServer,
    user: u64,
) -> Vec<u64> {
    // Grants are applied by the worker thread after the 202.
    for _ in 0..50 {
        let body: Value = as_user(client.get(server.url(&format!("/users/{user}/modules"))), user)
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        let modules: Vec<u64> = serde_json::from_value(body["modules"].clone()).unwrap();
        if !modules.is_empty() {
            return modules;
        }

        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    panic!("grant did not become visible within timeout");
}

#[tokio::test]
async fn health_is_public() {
    let server = TestServer::spawn().await;
    let res = reqwest::get(server.url("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn malformed_identity_headers_are_rejected() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .get(server.url("/whoami"))
        .header("x-user-id", "not-a-number")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .get(server.url("/whoami"))
        .header("x-service-token", "guess")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn purchase_requires_the_parent_course_first() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();
    seed(&client, &server).await;

    let body = validate(&client, &server, None).await;
    assert_eq!(body["verdict"], "deny");
    assert_eq!(body["denial"]["kind"], "login_required");

    let body = validate(&client, &server, Some(USER)).await;
    assert_eq!(body["verdict"], "deny");
    assert_eq!(body["denial"]["kind"], "course_required");
    assert!(body["reason"].as_str().unwrap().contains("Rust Basics"));

    enroll(&client, &server, COURSE, USER).await;

    let body = validate(&client, &server, Some(USER)).await;
    assert_eq!(body["verdict"], "admit");
    assert!(body.get("reason").is_none());
}

#[tokio::test]
async fn completed_order_grants_once_and_unlocks_content() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();
    seed(&client, &server).await;
    let notifications = server.runtime.entitlement_bus.subscribe();

    enroll(&client, &server, COURSE, USER).await;

    let res = as_user(client.post(server.url(&format!("/modules/{MODULE}/content"))), USER)
        .json(&json!({"content": "<p>Lesson</p>"}))
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    let notice = body["content"].as_str().unwrap();
    assert!(notice.contains("https://shop.example/p/42"));
    assert!(notice.contains("Buy for 19.99 USD"));

    let order = json!({
        "order_id": 900,
        "user_id": USER,
        "items": [{"product_id": PRODUCT}]
    });
    let res = as_service(client.post(server.url("/commerce/orders/completed")))
        .json(&order)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::ACCEPTED);

    assert_eq!(granted_modules_eventually(&client, &server, USER).await, vec![MODULE]);

    let first = notifications.recv_timeout(Duration::from_secs(2)).unwrap();
    let EntitlementEvent::ModulePurchaseComplete(done) = first.payload();
    assert_eq!(done.user_id.get(), USER);
    assert_eq!(done.module_id.get(), MODULE);

    // Replaying the same completion changes nothing and notifies nobody.
    let res = as_service(client.post(server.url("/commerce/orders/completed")))
        .json(&order)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::ACCEPTED);
    assert!(notifications.recv_timeout(Duration::from_millis(200)).is_err());

    let res = as_user(client.post(server.url(&format!("/modules/{MODULE}/content"))), USER)
        .json(&json!({"content": "<p>Lesson</p>"}))
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["content"], "<p>Lesson</p>");

    let body = validate(&client, &server, Some(USER)).await;
    assert_eq!(body["verdict"], "deny");
    assert_eq!(body["denial"]["kind"], "already_owned");

    let body: Value = access(&client, &server, USER, "").await.json().await.unwrap();
    assert_eq!(body["allowed"], true);
    assert_eq!(body["explanation"]["decided_by"], "purchased_module");
}

#[tokio::test]
async fn ungated_module_content_is_shown_to_logged_in_users() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    as_service(client.put(server.url("/host/modules/11")))
        .json(&json!({"name": "Free intro", "course_id": COURSE}))
        .send()
        .await
        .unwrap();

    let res = as_user(client.post(server.url("/modules/11/content")), USER)
        .json(&json!({"content": "<p>Welcome</p>"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["content"], "<p>Welcome</p>");

    let res = client
        .post(server.url("/modules/11/content"))
        .json(&json!({"content": "<p>Welcome</p>"}))
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    assert!(body["content"].as_str().unwrap().contains("Please log in"));
}

#[tokio::test]
async fn links_are_unique_on_both_sides() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();
    seed(&client, &server).await;

    let res = as_service(client.put(server.url("/modules/8/product")))
        .json(&json!({"product_id": PRODUCT}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let body: Value = client
        .get(server.url(&format!("/products/{PRODUCT}/module")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["module_id"], MODULE);

    // Zero unlinks, like an empty selection in the host's editor.
    let res = as_service(client.put(server.url(&format!("/products/{PRODUCT}/module"))))
        .json(&json!({"module_id": 0}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = client
        .get(server.url(&format!("/modules/{MODULE}/product")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(body["product_id"].is_null());

    let links: Value = as_service(client.get(server.url("/links")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(links, json!([]));
}

#[tokio::test]
async fn access_check_requires_a_viewer_and_trusts_prior_only_from_services() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();
    seed(&client, &server).await;

    let res = client
        .get(server.url(&format!("/modules/{MODULE}/access")))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = access(&client, &server, 77, "?prior=true").await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = as_service(as_user(
        client.get(server.url(&format!("/modules/{MODULE}/access?prior=true"))),
        77,
    ))
    .send()
    .await
    .unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["allowed"], true);
    assert_eq!(body["explanation"]["decided_by"], "prior_decision");
}

#[tokio::test]
async fn access_check_uses_only_the_modules_own_course() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();
    seed(&client, &server).await;

    // Enrolled elsewhere and holding the product: still locked out of course 7.
    as_service(client.put(server.url(&format!("/host/courses/{OTHER_COURSE}"))))
        .json(&json!({"title": "Async Rust"}))
        .send()
        .await
        .unwrap();
    enroll(&client, &server, OTHER_COURSE, OTHER_USER).await;
    as_service(client.post(server.url("/host/purchases")))
        .json(&json!({"user_id": OTHER_USER, "product_id": PRODUCT}))
        .send()
        .await
        .unwrap();

    let res = access(&client, &server, OTHER_USER, &format!("?course_id={OTHER_COURSE}")).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body: Value = access(&client, &server, OTHER_USER, "").await.json().await.unwrap();
    assert_eq!(body["allowed"], false);

    let res = access(&client, &server, OTHER_USER, &format!("?course_id={COURSE}")).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["allowed"], false);
}

#[tokio::test]
async fn webhooks_and_link_edits_require_the_service_token() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();
    seed(&client, &server).await;
    enroll(&client, &server, COURSE, USER).await;

    let res = client
        .post(server.url("/commerce/orders/completed"))
        .json(&json!({"order_id": 901, "user_id": USER, "items": [{"product_id": PRODUCT}]}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = as_user(client.put(server.url(&format!("/modules/{MODULE}/product"))), USER)
        .json(&json!({"product_id": null}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client.get(server.url("/links")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .put(server.url(&format!("/host/courses/{COURSE}")))
        .json(&json!({"title": "Hijacked"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // Nothing above granted or unlocked anything.
    let res = as_user(client.post(server.url(&format!("/modules/{MODULE}/content"))), USER)
        .json(&json!({"content": "SECRET"}))
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    assert_ne!(body["content"], "SECRET");
    assert_eq!(
        server
            .runtime
            .evaluator
            .get_module_product_id(ModuleId::new(MODULE))
            .unwrap(),
        Some(ProductId::new(PRODUCT))
    );
}

#[tokio::test]
async fn granted_modules_are_visible_to_their_owner_only() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = as_user(client.get(server.url(&format!("/users/{USER}/modules"))), OTHER_USER)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .get(server.url(&format!("/users/{USER}/modules")))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = as_user(client.get(server.url(&format!("/users/{USER}/modules"))), USER)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = as_service(client.get(server.url(&format!("/users/{USER}/modules"))))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn host_routes_are_absent_outside_dev_mode() {
    let server = TestServer::spawn_with(AppConfig {
        service_token: Some(TOKEN.to_string()),
        ..AppConfig::default()
    })
    .await;
    let client = reqwest::Client::new();

    let res = as_service(client.put(server.url(&format!("/host/courses/{COURSE}"))))
        .json(&json!({"title": "Rust Basics"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
