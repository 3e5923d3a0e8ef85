use std::sync::Arc;

use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::json;

use bizops_api::app::{build_app, Backends};
use bizops_api::config::{ApiConfig, Environment};
use bizops_api::rate_limit::RateLimitPolicy;
use bizops_auth::{AccountRecord, AccountStatus, InMemoryAccountDirectory, JwtClaims, Role};
use bizops_core::{AccountId, ExpenseId, Money, ProductId, SaleId, StoreError, StoreResult};
use bizops_reporting::{
    ExpenseRecord, InMemoryRecordStore, ProductRecord, RecordStore, SaleRecord,
};

const JWT_SECRET: &str = "test-secret";

const INVESTOR: i64 = 10;
const CLIENT: i64 = 11;
const DORMANT_INVESTOR: i64 = 12;

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(config: ApiConfig, records: Arc<dyn RecordStore>) -> Self {
        // Same router as prod, bound to an ephemeral port.
        let app = build_app(&config, Backends::new(records, accounts())).await;
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

    async fn seeded() -> Self {
        Self::spawn(config(), seeded_records()).await
    }

    async fn get(&self, path: &str, token: Option<&str>) -> reqwest::Response {
        let mut req = reqwest::Client::new().get(format!("{}{}", self.base_url, path));
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        req.send().await.unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn config() -> ApiConfig {
    ApiConfig {
        jwt_secret: JWT_SECRET.to_string(),
        ..ApiConfig::default()
    }
}

fn accounts() -> Arc<InMemoryAccountDirectory> {
    let accounts = Arc::new(InMemoryAccountDirectory::new());
    for (id, role, status) in [
        (INVESTOR, Role::Investor, AccountStatus::Active),
        (CLIENT, Role::Client, AccountStatus::Active),
        (DORMANT_INVESTOR, Role::Investor, AccountStatus::Inactive),
    ] {
        accounts.upsert(AccountRecord {
            id: AccountId::new(id),
            role,
            status,
        });
    }
    accounts
}

/// One sale of 1000.00 in May 2024 and one 500.00 expense in April 2024.
fn seeded_records() -> Arc<InMemoryRecordStore> {
    let records = Arc::new(InMemoryRecordStore::new());
    records.upsert_product(ProductRecord::new(
        ProductId::new(1),
        "Widget",
        5,
        Money::from_major(4),
    ));
    records.upsert_product(ProductRecord::new(
        ProductId::new(2),
        "Gadget",
        0,
        Money::from_major(7),
    ));
    records.insert_sale(SaleRecord::new(
        SaleId::new(1),
        ProductId::new(1),
        100,
        Money::from_major(10),
        Utc.with_ymd_and_hms(2024, 5, 14, 10, 0, 0).unwrap(),
    ));
    records.insert_expense(ExpenseRecord::new(
        ExpenseId::new(1),
        Money::from_major(500),
        Utc.with_ymd_and_hms(2024, 4, 3, 9, 0, 0).unwrap(),
    ));
    records
}

struct BrokenStore;

impl RecordStore for BrokenStore {
    fn sales(&self) -> StoreResult<Vec<SaleRecord>> {
        Err(StoreError::unavailable("db-primary:5432 connection refused"))
    }
    fn expenses(&self) -> StoreResult<Vec<ExpenseRecord>> {
        Err(StoreError::unavailable("db-primary:5432 connection refused"))
    }
    fn products(&self) -> StoreResult<Vec<ProductRecord>> {
        Err(StoreError::unavailable("db-primary:5432 connection refused"))
    }
}

fn mint_jwt(jwt_secret: &str, account: i64, role: Role) -> String {
    let now = Utc::now();
    let claims = JwtClaims {
        sub: AccountId::new(account),
        role,
        issued_at: now - ChronoDuration::minutes(1),
        expires_at: now + ChronoDuration::minutes(10),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )
    .expect("failed to encode jwt")
}

fn investor_token() -> String {
    mint_jwt(JWT_SECRET, INVESTOR, Role::Investor)
}

async fn body(res: reqwest::Response) -> serde_json::Value {
    res.json().await.unwrap()
}

#[tokio::test]
async fn health_check_needs_no_token() {
    let srv = TestServer::seeded().await;

    let res = srv.get("/health", None).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn auth_required_for_investor_endpoints() {
    let srv = TestServer::seeded().await;
    let forged = mint_jwt("some-other-secret", INVESTOR, Role::Investor);

    for token in [None, Some("not-a-jwt"), Some(forged.as_str())] {
        let res = srv.get("/investor/dashboard", token).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(res.headers()["x-frame-options"], "DENY");
        assert_eq!(
            body(res).await,
            json!({ "success": false, "error": "Authentication required" })
        );
    }
}

#[tokio::test]
async fn expired_token_is_rejected() {
    let srv = TestServer::seeded().await;
    let now = Utc::now();
    let claims = JwtClaims {
        sub: AccountId::new(INVESTOR),
        role: Role::Investor,
        issued_at: now - ChronoDuration::hours(2),
        expires_at: now - ChronoDuration::hours(1),
    };
    let token = jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap();

    let res = srv.get("/investor/health", Some(&token)).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn dashboard_reports_summary_with_security_headers() {
    let srv = TestServer::seeded().await;

    let res = srv.get("/investor/dashboard", Some(&investor_token())).await;
    assert_eq!(res.status(), StatusCode::OK);

    let headers = res.headers();
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(
        headers["strict-transport-security"],
        "max-age=63072000; includeSubDomains; preload"
    );
    assert_eq!(headers["content-security-policy"], "default-src 'self'");
    assert_eq!(headers["x-ratelimit-limit"], "100");
    assert_eq!(headers["x-ratelimit-remaining"], "99");
    assert!(headers.contains_key("x-request-id"));

    let body = body(res).await;
    assert_eq!(body["success"], true);
    assert!(body["lastUpdated"].is_string());
    assert!(body.get("count").is_none());

    let data = &body["data"];
    assert_eq!(data["totalRevenue"], 100_000);
    assert_eq!(data["totalExpenses"], 50_000);
    assert_eq!(data["netProfit"], 50_000);
    assert_eq!(data["activeProductCount"], 1);
    assert_eq!(data["transactionCount"], 1);
    assert_eq!(data["inventoryValue"], 2_000);
}

#[tokio::test]
async fn performance_rows_cover_sale_and_expense_months() {
    let srv = TestServer::seeded().await;

    let res = srv
        .get("/investor/performance?months=2", Some(&investor_token()))
        .await;
    assert_eq!(res.status(), StatusCode::OK);

    let body = body(res).await;
    assert_eq!(body["count"], 2);
    assert_eq!(
        body["data"],
        json!([
            { "month": "2024-05", "revenue": 100_000, "expenses": 0, "netProfit": 100_000 },
            { "month": "2024-04", "revenue": 0, "expenses": 50_000, "netProfit": -50_000 },
        ])
    );
}

#[tokio::test]
async fn months_bounds_are_enforced() {
    let srv = TestServer::seeded().await;
    let token = investor_token();

    for months in ["0", "37", "abc"] {
        let res = srv
            .get(&format!("/investor/performance?months={months}"), Some(&token))
            .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "months={months}");
        assert_eq!(
            body(res).await,
            json!({ "success": false, "error": "Months must be between 1 and 36" })
        );
    }

    for months in ["1", "36"] {
        let res = srv
            .get(&format!("/investor/performance?months={months}"), Some(&token))
            .await;
        assert_eq!(res.status(), StatusCode::OK, "months={months}");
    }
}

#[tokio::test]
async fn products_ranked_by_profit() {
    let srv = TestServer::seeded().await;

    let res = srv
        .get("/investor/products?limit=5", Some(&investor_token()))
        .await;
    assert_eq!(res.status(), StatusCode::OK);

    let ranked = body(res).await;
    assert_eq!(ranked["count"], 1);
    let widget = &ranked["data"][0];
    assert_eq!(widget["name"], "Widget");
    assert_eq!(widget["unitsSold"], 100);
    assert_eq!(widget["revenue"], 100_000);
    assert_eq!(widget["cost"], 40_000);
    assert_eq!(widget["profit"], 60_000);
    assert_eq!(widget["currentStock"], 5);

    let res = srv
        .get("/investor/products?limit=51", Some(&investor_token()))
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body(res).await["error"], "Limit must be between 1 and 50");
}

#[tokio::test]
async fn undecodable_query_is_a_json_400_that_spends_quota() {
    let config = ApiConfig {
        rate_limit: RateLimitPolicy {
            max_requests: 2,
            window: ChronoDuration::minutes(15),
        },
        ..config()
    };
    let srv = TestServer::spawn(config, seeded_records()).await;
    let token = investor_token();

    let res = srv
        .get("/investor/performance?months=1&months=2", Some(&token))
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(res.headers()["content-type"], "application/json");
    assert_eq!(
        body(res).await,
        json!({ "success": false, "error": "Invalid query string" })
    );

    assert_eq!(
        srv.get("/investor/performance", Some(&token)).await.status(),
        StatusCode::OK
    );
    assert_eq!(
        srv.get("/investor/performance?months=1&months=2", Some(&token))
            .await
            .status(),
        StatusCode::TOO_MANY_REQUESTS
    );
}

#[tokio::test]
async fn client_supplied_request_id_is_echoed() {
    let srv = TestServer::seeded().await;

    let res = reqwest::Client::new()
        .get(format!("{}/health", srv.base_url))
        .header("x-request-id", "trace-abc-123")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["x-request-id"], "trace-abc-123");
}

#[tokio::test]
async fn health_metrics_are_scored() {
    let srv = TestServer::seeded().await;

    let res = srv.get("/investor/health", Some(&investor_token())).await;
    assert_eq!(res.status(), StatusCode::OK);

    let body = body(res).await;
    let data = &body["data"];
    assert_eq!(data["profitMargin"], 0.5);
    assert_eq!(data["expenseRatio"], 0.5);
    assert_eq!(data["inventoryTurnover"], 0.02);
    assert_eq!(data["lowStockCount"], 1);
    assert_eq!(data["outOfStockCount"], 1);
    assert_eq!(data["healthStatus"], "Excellent");
    assert!(data["updatedAt"].is_string());
}

#[tokio::test]
async fn health_with_no_revenue_has_undefined_ratios() {
    let srv = TestServer::spawn(config(), Arc::new(InMemoryRecordStore::new())).await;

    let res = srv.get("/investor/health", Some(&investor_token())).await;
    assert_eq!(res.status(), StatusCode::OK);

    let body = body(res).await;
    let data = &body["data"];
    assert!(data["profitMargin"].is_null());
    assert!(data["inventoryTurnover"].is_null());
    assert!(data["expenseRatio"].is_null());
    assert_eq!(data["healthStatus"], "Unknown");
}

#[tokio::test]
async fn client_role_is_forbidden() {
    let srv = TestServer::seeded().await;
    let token = mint_jwt(JWT_SECRET, CLIENT, Role::Client);

    let res = srv.get("/investor/dashboard", Some(&token)).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        body(res).await,
        json!({
            "success": false,
            "message": "Access denied. Investor role required.",
            "requiredRole": "investor",
            "yourRole": "client",
        })
    );
}

#[tokio::test]
async fn inactive_account_is_forbidden() {
    let srv = TestServer::seeded().await;
    let token = mint_jwt(JWT_SECRET, DORMANT_INVESTOR, Role::Investor);

    let res = srv.get("/investor/products", Some(&token)).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        body(res).await,
        json!({ "success": false, "message": "Account not active" })
    );
}

#[tokio::test]
async fn hundred_and_first_request_is_rate_limited() {
    let srv = TestServer::seeded().await;
    let token = investor_token();
    let paths = [
        "/investor/dashboard",
        "/investor/performance",
        "/investor/products",
        "/investor/health",
    ];

    // The quota is shared by all four reports.
    for i in 0..100 {
        let res = srv.get(paths[i % paths.len()], Some(&token)).await;
        assert_eq!(res.status(), StatusCode::OK, "request {}", i + 1);
    }

    let res = srv.get("/investor/dashboard", Some(&token)).await;
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(res.headers().contains_key("retry-after"));
    assert_eq!(res.headers()["x-ratelimit-remaining"], "0");
    assert_eq!(
        body(res).await,
        json!({ "success": false, "error": "Too many requests, please try again later" })
    );

    // Another caller still has its own quota.
    let other = mint_jwt(JWT_SECRET, CLIENT, Role::Client);
    let res = srv.get("/investor/dashboard", Some(&other)).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn configured_quota_is_applied() {
    let config = ApiConfig {
        rate_limit: RateLimitPolicy {
            max_requests: 2,
            window: ChronoDuration::minutes(15),
        },
        ..config()
    };
    let srv = TestServer::spawn(config, seeded_records()).await;
    let token = investor_token();

    assert_eq!(srv.get("/investor/health", Some(&token)).await.status(), StatusCode::OK);
    assert_eq!(srv.get("/investor/health", Some(&token)).await.status(), StatusCode::OK);
    assert_eq!(
        srv.get("/investor/health", Some(&token)).await.status(),
        StatusCode::TOO_MANY_REQUESTS
    );
}

#[tokio::test]
async fn store_failure_hides_details_in_production() {
    let srv = TestServer::spawn(config(), Arc::new(BrokenStore)).await;

    let res = srv.get("/investor/dashboard", Some(&investor_token())).await;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body(res).await,
        json!({ "success": false, "error": "Failed to fetch investor dashboard" })
    );
}

#[tokio::test]
async fn store_failure_shows_details_in_development() {
    let config = ApiConfig {
        environment: Environment::Development,
        ..config()
    };
    let srv = TestServer::spawn(config, Arc::new(BrokenStore)).await;

    let res = srv.get("/investor/health", Some(&investor_token())).await;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = body(res).await;
    assert_eq!(body["error"], "Failed to calculate financial health");
    assert!(body["details"].as_str().unwrap().contains("connection refused"));
}
