/// Router-level tests.
///
/// The pool connects lazily and none of the paths exercised here reach the
/// database: they stop at auth, validation, or the stubbed quote provider.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;
use uuid::Uuid;

use stockcrypt_backend::app::create_app;
use stockcrypt_backend::auth::{issue_token, AuthConfig, Claims};
use stockcrypt_backend::config::CorsConfig;
use stockcrypt_backend::external::quote_provider::{Quote, QuoteError, QuoteProvider};
use stockcrypt_backend::services::quote_cache::QuoteCache;
use stockcrypt_backend::services::quote_service::QuoteService;
use stockcrypt_backend::state::AppState;

const SECRET: &str = "integration-test-secret";

/// Knows every symbol except `ZZZZ`.
struct StubQuotes;

#[async_trait]
impl QuoteProvider for StubQuotes {
    async fn fetch_quote(&self, symbol: &str) -> Result<Quote, QuoteError> {
        if symbol == "ZZZZ" {
            return Err(QuoteError::InvalidSymbol);
        }
        Ok(Quote {
            symbol: symbol.to_string(),
            name: Some(format!("{} Inc", symbol)),
            close: 150.0,
            change: 3.0,
            percent_change: 2.5,
            volume: Some("1000000".to_string()),
            market_cap: Some(2.5e12),
            datetime: Some("2024-01-02".to_string()),
        })
    }
}

fn app() -> Router {
    let pool = PgPoolOptions::new()
        .connect_lazy("postgres://localhost/stockcrypt_test")
        .unwrap();
    let quotes = QuoteService::new(Arc::new(StubQuotes), QuoteCache::new(Duration::minutes(5)));

    create_app(
        AppState {
            pool,
            quotes,
            auth: AuthConfig::new(SECRET),
        },
        &CorsConfig::default(),
    )
}

fn bearer() -> String {
    format!("Bearer {}", issue_token(Uuid::new_v4(), SECRET).unwrap())
}

fn json_request(method: &str, uri: &str, auth: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, auth: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    builder.body(Body::empty()).unwrap()
}

async fn send(request: Request<Body>) -> (StatusCode, Value) {
    let response = app().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or_else(|_| {
        Value::String(String::from_utf8_lossy(&bytes).into_owned())
    });
    (status, body)
}

#[tokio::test]
async fn test_root_and_health() {
    let (status, body) = send(get("/", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("StockCrypt backend running".into()));

    let (status, body) = send(get("/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("OK".into()));
}

#[tokio::test]
async fn test_private_routes_require_token() {
    for uri in [
        "/api/auth/me",
        "/api/stock/watchlist",
        "/api/portfolio/holdings",
        "/api/portfolio/summary",
        "/api/portfolio/performance",
        "/api/portfolio/transactions",
    ] {
        let (status, body) = send(get(uri, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
        assert_eq!(body["error"], "No token, authorization denied");
    }
}

#[tokio::test]
async fn test_rejects_bad_tokens() {
    let (status, body) = send(get("/api/portfolio/holdings", Some("Token abc"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Malformed authorization header");

    let (status, body) = send(get("/api/portfolio/holdings", Some("Bearer not.a.jwt"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Token is not valid");

    let foreign = issue_token(Uuid::new_v4(), "some-other-secret").unwrap();
    let (status, _) = send(get("/api/portfolio/holdings", Some(&format!("Bearer {}", foreign)))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_rejects_expired_token() {
    let issued = Utc::now() - Duration::hours(3);
    let claims = Claims {
        sub: Uuid::new_v4(),
        iat: issued.timestamp(),
        exp: (issued + Duration::hours(1)).timestamp(),
    };
    let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap();

    let (status, body) = send(get("/api/auth/me", Some(&format!("Bearer {}", token)))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Token has expired");
}

#[tokio::test]
async fn test_create_transaction_validation() {
    let auth = bearer();

    let cases = [
        (json!({ "symbol": "AAPL", "type": "BUY", "quantity": 1 }), "Missing required fields"),
        (
            json!({ "symbol": "AAPL", "type": "HOLD", "quantity": 1, "pricePerShare": 10 }),
            "Type must be BUY or SELL",
        ),
        (
            json!({ "symbol": "AAPL", "type": "buy", "quantity": -2, "pricePerShare": 10 }),
            "Quantity and price must be positive",
        ),
        (
            json!({ "symbol": "AAPL", "type": "SELL", "quantity": 1, "pricePerShare": 10, "notes": "n".repeat(501) }),
            "Notes cannot exceed 500 characters",
        ),
        (
            json!({ "symbol": "NOT A SYMBOL", "type": "BUY", "quantity": 1, "pricePerShare": 10 }),
            "Invalid stock symbol: NOT A SYMBOL",
        ),
    ];

    for (body, expected) in cases {
        let (status, response) =
            send(json_request("POST", "/api/portfolio/transaction", Some(&auth), body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(response["error"], expected);
    }
}

#[tokio::test]
async fn test_update_transaction_validation() {
    let uri = format!("/api/portfolio/transaction/{}", Uuid::new_v4());
    let (status, body) = send(json_request(
        "PUT",
        &uri,
        Some(&bearer()),
        json!({ "pricePerShare": 0 }),
    ))
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Quantity and price must be positive");
}

#[tokio::test]
async fn test_transaction_listing_rejects_inverted_dates() {
    let uri = "/api/portfolio/transactions?startDate=2024-03-01T00%3A00%3A00Z&endDate=2024-01-01T00%3A00%3A00Z";
    let (status, body) = send(get(uri, Some(&bearer()))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "startDate must not be after endDate");
}

#[tokio::test]
async fn test_analyze() {
    let (status, body) = send(json_request("POST", "/api/stock/analyze", None, json!({ "symbol": "aapl" }))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["symbol"], "AAPL");
    assert_eq!(body["companyOverview"]["name"], "AAPL Inc");
    assert_eq!(body["currentMarketStatus"]["currentPrice"], 150.0);
    assert_eq!(body["currentMarketStatus"]["trend"], "bullish");
    assert!(body["riskScore"]["score"].is_u64());
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_analyze_errors() {
    let (status, body) = send(json_request("POST", "/api/stock/analyze", None, json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Stock symbol is required");

    let (status, body) = send(json_request("POST", "/api/stock/analyze", None, json!({ "symbol": "ZZZZ" }))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body["error"],
        "Stock analysis failed: Invalid stock symbol or no data available"
    );
}

#[tokio::test]
async fn test_compare() {
    let (status, body) = send(json_request(
        "POST",
        "/api/stock/compare",
        None,
        json!({ "symbol1": "AAPL", "symbol2": "msft" }),
    ))
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stock1"]["symbol"], "AAPL");
    assert_eq!(body["stock2"]["symbol"], "MSFT");
    assert!(body["comparison"]["performance"]["winner"].is_string());

    let (status, body) = send(json_request("POST", "/api/stock/compare", None, json!({ "symbol1": "AAPL" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Both stock symbols are required");
}

#[tokio::test]
async fn test_trending() {
    let (status, body) = send(get("/api/stock/trending", None)).await;

    assert_eq!(status, StatusCode::OK);
    let stocks = body.as_array().unwrap();
    assert_eq!(stocks.len(), 5);
    assert_eq!(stocks[0]["symbol"], "AAPL");
    assert_eq!(stocks[0]["price"], 150.0);
}

#[tokio::test]
async fn test_watchlist_add_rejects_missing_symbol() {
    let (status, body) = send(json_request(
        "POST",
        "/api/stock/watchlist",
        Some(&bearer()),
        json!({ "notes": "later" }),
    ))
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Stock symbol is required");
}

#[tokio::test]
async fn test_create_transaction_accepts_form_strings() {
    let auth = bearer();

    // Parsed from strings, then rejected by the positivity rule
    let (status, body) = send(json_request(
        "POST",
        "/api/portfolio/transaction",
        Some(&auth),
        json!({ "symbol": "AAPL", "type": "BUY", "quantity": "-2", "pricePerShare": "150", "transactionDate": "2024-05-01" }),
    ))
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Quantity and price must be positive");

    // Blank form fields count as missing
    let (status, body) = send(json_request(
        "POST",
        "/api/portfolio/transaction",
        Some(&auth),
        json!({ "symbol": "AAPL", "type": "BUY", "quantity": "", "pricePerShare": "150" }),
    ))
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required fields");

    let (status, body) = send(json_request(
        "POST",
        "/api/portfolio/transaction",
        Some(&auth),
        json!({ "symbol": "AAPL", "type": "BUY", "quantity": "ten", "pricePerShare": "150" }),
    ))
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("invalid number: ten"));
}

#[tokio::test]
async fn test_malformed_requests_use_error_body() {
    let auth = bearer();

    let request = Request::builder()
        .method("POST")
        .uri("/api/portfolio/transaction")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, &auth)
        .body(Body::from("{\"symbol\": \"AAPL\","))
        .unwrap();
    let (status, body) = send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = send(json_request(
        "POST",
        "/api/stock/analyze",
        None,
        json!({ "symbol": 42 }),
    ))
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = send(json_request(
        "PUT",
        "/api/portfolio/transaction/not-a-uuid",
        Some(&auth),
        json!({ "quantity": 1 }),
    ))
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = send(get("/api/portfolio/transactions?startDate=yesterday", Some(&auth))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("invalid date: yesterday"));
}

#[tokio::test]
async fn test_transaction_listing_accepts_bare_dates() {
    let uri = "/api/portfolio/transactions?startDate=2024-03-01&endDate=2024-01-01";
    let (status, body) = send(get(uri, Some(&bearer()))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "startDate must not be after endDate");
}
