use reqwest::StatusCode;
use serde_json::{Value, json};

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Build app (same router as prod), but bind to an ephemeral port.
        let app = payvault_api::app::build_app("test-secret".to_string());
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
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn register(
    client: &reqwest::Client,
    base_url: &str,
    name: &str,
    email: &str,
) -> (String, Value) {
    let res = client
        .post(format!("{}/auth/register", base_url))
        .json(&json!({ "name": name, "email": email, "password": "correct-horse" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], true);
    let token = body["data"]["token"].as_str().unwrap().to_string();
    (token, body["data"]["user"].clone())
}

async fn top_up(client: &reqwest::Client, base_url: &str, token: &str, amount: f64) -> Value {
    let res = client
        .post(format!("{}/topup", base_url))
        .bearer_auth(token)
        .json(&json!({ "amount": amount }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    res.json().await.unwrap()
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    for path in ["/wallet/balance", "/transactions", "/dashboard/stats"] {
        let res = client
            .get(format!("{}{}", srv.base_url, path))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{path}");
    }

    let res = client
        .get(format!("{}/wallet/balance", srv.base_url))
        .bearer_auth("not-a-real-token")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn register_login_and_profile() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let (_, user) = register(&client, &srv.base_url, "Ada", "ada@example.com").await;
    assert_eq!(user["balance"], 0.0);

    // Second registration with the same email is rejected.
    let res = client
        .post(format!("{}/auth/register", srv.base_url))
        .json(&json!({ "name": "Ada Again", "email": "ada@example.com", "password": "correct-horse" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // Wrong password does not log in.
    let res = client
        .post(format!("{}/auth/login", srv.base_url))
        .json(&json!({ "email": "ada@example.com", "password": "wrong" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .post(format!("{}/auth/login", srv.base_url))
        .json(&json!({ "email": "ada@example.com", "password": "correct-horse" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    let token = body["data"]["token"].as_str().unwrap();

    let res = client
        .get(format!("{}/user/profile", srv.base_url))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["data"]["email"], "ada@example.com");
}

#[tokio::test]
async fn logout_requires_a_token_and_acknowledges() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/auth/logout", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let (token, _) = register(&client, &srv.base_url, "Ada", "ada@example.com").await;
    let res = client
        .post(format!("{}/auth/logout", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Logged out successfully");
}

#[tokio::test]
async fn topup_transfer_and_history_lifecycle() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let (ada_token, _) = register(&client, &srv.base_url, "Ada", "ada@example.com").await;
    let (bob_token, _) = register(&client, &srv.base_url, "Bob", "bob@example.com").await;

    let body = top_up(&client, &srv.base_url, &ada_token, 150.0).await;
    assert_eq!(body["data"]["new_balance"], 150.0);
    assert_eq!(body["data"]["transaction"]["type"], "topup");
    assert!(
        body["data"]["transaction"]["reference"]
            .as_str()
            .unwrap()
            .starts_with("TXN")
    );

    // Recipient is addressed by email.
    let res = client
        .post(format!("{}/transfer", srv.base_url))
        .bearer_auth(&ada_token)
        .json(&json!({ "recipient_email": "bob@example.com", "amount": 30.0, "note": "lunch" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["data"]["new_balance"], 120.0);
    assert_eq!(body["data"]["transaction"]["type"], "transfer_sent");
    assert_eq!(body["data"]["transaction"]["recipient"], "Bob");

    let res = client
        .get(format!("{}/wallet/balance", srv.base_url))
        .bearer_auth(&bob_token)
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["data"]["balance"], 30.0);

    // Bob's side of the transfer shows up in his history.
    let res = client
        .get(format!("{}/transactions", srv.base_url))
        .bearer_auth(&bob_token)
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    let rows = body["data"]["transactions"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["type"], "transfer_received");
    assert_eq!(rows[0]["sender"], "Ada");
    assert_eq!(rows[0]["note"], "lunch");

    // Single-row fetch is owner-scoped.
    let id = rows[0]["id"].as_str().unwrap();
    let res = client
        .get(format!("{}/transactions/{}", srv.base_url, id))
        .bearer_auth(&ada_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let res = client
        .get(format!("{}/transactions/{}", srv.base_url, id))
        .bearer_auth(&bob_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn transfer_addresses_recipients_by_id() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let (ada_token, _) = register(&client, &srv.base_url, "Ada", "ada@example.com").await;
    let (bob_token, _) = register(&client, &srv.base_url, "Bob", "bob@example.com").await;
    top_up(&client, &srv.base_url, &ada_token, 100.0).await;

    // Resolve the recipient first, the way the original clients do.
    let res = client
        .get(format!(
            "{}/users/search?email=bob@example.com",
            srv.base_url
        ))
        .bearer_auth(&ada_token)
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    let bob_id = body["data"]["id"].as_str().unwrap().to_string();

    let res = client
        .post(format!("{}/transfer", srv.base_url))
        .bearer_auth(&ada_token)
        .json(&json!({ "recipient_id": bob_id, "amount": 30.0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["data"]["new_balance"], 70.0);
    assert_eq!(body["data"]["transaction"]["recipient"], "Bob");

    let res = client
        .get(format!("{}/wallet/balance", srv.base_url))
        .bearer_auth(&bob_token)
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["data"]["balance"], 30.0);

    // Unknown recipient id is a 404, not an internal error.
    let res = client
        .post(format!("{}/transfer", srv.base_url))
        .bearer_auth(&ada_token)
        .json(&json!({
            "recipient_id": "00000000-0000-7000-8000-000000000000",
            "amount": 10.0
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // Neither addressing form present.
    let res = client
        .post(format!("{}/transfer", srv.base_url))
        .bearer_auth(&ada_token)
        .json(&json!({ "amount": 10.0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn bill_payment_against_the_seeded_catalog() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let (token, _) = register(&client, &srv.base_url, "Ada", "ada@example.com").await;
    top_up(&client, &srv.base_url, &token, 100.0).await;

    let res = client
        .get(format!("{}/billers", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    let billers = body["data"].as_array().unwrap();
    assert_eq!(billers.len(), 5);
    let biller_id = billers[0]["id"].as_str().unwrap();
    let biller_name = billers[0]["name"].as_str().unwrap();

    let res = client
        .post(format!("{}/bills/pay", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({ "biller_id": biller_id, "amount": 40.0, "account_number": "ACC-9" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["data"]["new_balance"], 60.0);
    assert_eq!(body["data"]["transaction"]["type"], "bill_payment");
    assert_eq!(body["data"]["transaction"]["biller"], biller_name);
    assert_eq!(body["data"]["transaction"]["account_number"], "ACC-9");
}

#[tokio::test]
async fn failed_operations_change_nothing() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let (ada_token, _) = register(&client, &srv.base_url, "Ada", "ada@example.com").await;
    register(&client, &srv.base_url, "Bob", "bob@example.com").await;
    top_up(&client, &srv.base_url, &ada_token, 50.0).await;

    // Over-balance transfer.
    let res = client
        .post(format!("{}/transfer", srv.base_url))
        .bearer_auth(&ada_token)
        .json(&json!({ "recipient_email": "bob@example.com", "amount": 80.0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // Self transfer.
    let res = client
        .post(format!("{}/transfer", srv.base_url))
        .bearer_auth(&ada_token)
        .json(&json!({ "recipient_email": "ada@example.com", "amount": 10.0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // Unknown recipient.
    let res = client
        .post(format!("{}/transfer", srv.base_url))
        .bearer_auth(&ada_token)
        .json(&json!({ "recipient_email": "nobody@example.com", "amount": 10.0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // Top-up over the ceiling.
    let res = client
        .post(format!("{}/topup", srv.base_url))
        .bearer_auth(&ada_token)
        .json(&json!({ "amount": 10_000.01 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Balance and history are exactly as the one successful top-up left them.
    let res = client
        .get(format!("{}/wallet/balance", srv.base_url))
        .bearer_auth(&ada_token)
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["data"]["balance"], 50.0);

    let res = client
        .get(format!("{}/transactions", srv.base_url))
        .bearer_auth(&ada_token)
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["data"]["total"], 1);
}

#[tokio::test]
async fn dashboard_reflects_activity() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let (ada_token, _) = register(&client, &srv.base_url, "Ada", "ada@example.com").await;
    register(&client, &srv.base_url, "Bob", "bob@example.com").await;
    top_up(&client, &srv.base_url, &ada_token, 100.0).await;

    let res = client
        .post(format!("{}/transfer", srv.base_url))
        .bearer_auth(&ada_token)
        .json(&json!({ "recipient_email": "bob@example.com", "amount": 25.0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .get(format!("{}/dashboard/stats", srv.base_url))
        .bearer_auth(&ada_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    let stats = &body["data"];
    assert_eq!(stats["current_balance"], 75.0);
    assert_eq!(stats["total_income"], 100.0);
    assert_eq!(stats["total_expenses"], 25.0);
    assert_eq!(stats["transaction_summary"]["topups"]["count"], 1);
    assert_eq!(stats["transaction_summary"]["transfers"]["sent"]["count"], 1);
}

#[tokio::test]
async fn transaction_listing_filters_by_type() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let (token, _) = register(&client, &srv.base_url, "Ada", "ada@example.com").await;
    top_up(&client, &srv.base_url, &token, 10.0).await;
    top_up(&client, &srv.base_url, &token, 20.0).await;

    let res = client
        .get(format!("{}/transactions?type=topup&limit=1", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["data"]["total"], 2);
    assert_eq!(body["data"]["transactions"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["has_more"], true);

    let res = client
        .get(format!("{}/transactions?type=bogus", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn user_search_excludes_the_caller() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let (ada_token, _) = register(&client, &srv.base_url, "Ada", "ada@example.com").await;
    register(&client, &srv.base_url, "Bob", "bob@example.com").await;

    let res = client
        .get(format!(
            "{}/users/search?email=bob@example.com",
            srv.base_url
        ))
        .bearer_auth(&ada_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["data"]["name"], "Bob");
    assert!(body["data"].get("balance").is_none());

    let res = client
        .get(format!(
            "{}/users/search?email=ada@example.com",
            srv.base_url
        ))
        .bearer_auth(&ada_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
