use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use zark_checkout::application::quotes::{QuoteEngine, QuotePolicy};
use zark_checkout::config::PixConfig;
use zark_checkout::domain::pix::crc16_ccitt;
use zark_checkout::domain::shipping::PostalCode;
use zark_checkout::infrastructure::cache::QuoteCache;
use zark_checkout::infrastructure::estimate::{EstimateProvider, EstimateTiers};
use zark_checkout::infrastructure::rate_limit::FixedWindowLimiter;
use zark_checkout::interfaces::http::{AppState, router};

fn test_app(rate_limit_max: u32) -> Router {
    let engine = QuoteEngine::new(
        Arc::new(EstimateProvider::new(EstimateTiers::default())),
        QuoteCache::new(Duration::from_secs(300)),
        QuotePolicy::default(),
    );
    router(AppState {
        engine: Arc::new(engine),
        limiter: Arc::new(FixedWindowLimiter::new(
            Duration::from_secs(60),
            rate_limit_max,
        )),
        origin: PostalCode::parse("01310-100").unwrap(),
        pix: Arc::new(PixConfig {
            key: "zark@zarabatanas.com.br".to_string(),
            merchant_name: "ZARK".to_string(),
            merchant_city: "Sao Paulo".to_string(),
            expiry_minutes: 15,
        }),
    })
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn calculate_body(cep: &str) -> Value {
    json!({
        "cep": cep,
        "products": [{
            "id": "sku-1",
            "price": "49.90",
            "quantity": 1,
            "weight": 0.3,
            "width": 12.0,
            "height": 4.0,
            "length": 18.0
        }]
    })
}

#[tokio::test]
async fn calculate_returns_ranked_options() {
    let app = test_app(10);
    let (status, body) = send(app, post_json("/shipping/calculate", calculate_body("04538-132"))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["estimated"], json!(true));
    assert_eq!(body["fromZip"], json!("01310100"));
    assert_eq!(body["toZip"], json!("04538132"));

    let options = body["options"].as_array().unwrap();
    assert!(!options.is_empty());

    let prices: Vec<i64> = options.iter().map(|o| o["price"].as_i64().unwrap()).collect();
    let mut sorted = prices.clone();
    sorted.sort_unstable();
    assert_eq!(prices, sorted);

    let cheapest: Vec<bool> = options
        .iter()
        .map(|o| o["isCheapest"].as_bool().unwrap())
        .collect();
    assert_eq!(cheapest.iter().filter(|flag| **flag).count(), 1);
    assert!(cheapest[0]);
}

#[tokio::test]
async fn calculate_rejects_invalid_cep() {
    let app = test_app(10);

    let (status, body) = send(
        app.clone(),
        post_json("/shipping/calculate", calculate_body("1234")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("CEP"));

    let (status, _) = send(
        app,
        post_json("/shipping/calculate", calculate_body("11111111")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn calculate_rejects_empty_cart() {
    let app = test_app(10);
    let (status, body) = send(
        app,
        post_json("/shipping/calculate", json!({ "cep": "04538132", "products": [] })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("cart is empty"));
}

#[tokio::test]
async fn calculate_names_product_missing_attributes() {
    let app = test_app(10);
    let body = json!({
        "cep": "04538132",
        "products": [{ "id": "sku-9", "quantity": 2, "weight": 0.5 }]
    });

    let (status, response) = send(app, post_json("/shipping/calculate", body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(response["error"].as_str().unwrap().contains("sku-9"));
}

#[tokio::test]
async fn calculate_enforces_rate_limit_per_client() {
    let app = test_app(2);

    for _ in 0..2 {
        let (status, _) = send(
            app.clone(),
            post_json("/shipping/calculate", calculate_body("04538132")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = send(
        app.clone(),
        post_json("/shipping/calculate", calculate_body("04538132")),
    )
    .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert!(body["error"].as_str().unwrap().contains("too many requests"));

    // a different client address is unaffected
    let mut request = post_json("/shipping/calculate", calculate_body("04538132"));
    request
        .headers_mut()
        .insert("x-forwarded-for", "203.0.113.7".parse().unwrap());
    let (status, _) = send(app, request).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn validate_endpoint_checks_structure() {
    let app = test_app(10);

    let (status, body) = send(
        app.clone(),
        Request::builder()
            .uri("/shipping/calculate?zipCode=01310-100")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], json!(true));
    assert_eq!(body["zipCode"], json!("01310100"));

    let (status, body) = send(
        app.clone(),
        Request::builder()
            .uri("/shipping/calculate?zipCode=99999999")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], json!(false));

    let (status, _) = send(
        app,
        Request::builder()
            .uri("/shipping/calculate")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn pix_generate_returns_verifiable_payload() {
    let app = test_app(10);
    let body = json!({
        "amount": 199.90,
        "customer": { "name": "Ana", "email": "ana@example.com" }
    });

    let (status, response) = send(app, post_json("/pix/generate", body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["success"], json!(true));

    let pix = &response["pix"];
    assert_eq!(pix["amount"], json!(199.90));
    assert_eq!(pix["description"], json!("Compra - Ana"));
    assert!(pix["expiresAt"].as_str().unwrap().contains('T'));

    let payload = pix["copyPaste"].as_str().unwrap();
    assert!(payload.contains("5406199.90"));
    assert!(payload.contains("BR.GOV.BCB.PIX"));

    let (body_part, checksum) = payload.split_at(payload.len() - 4);
    assert!(body_part.ends_with("6304"));
    assert_eq!(format!("{:04X}", crc16_ccitt(body_part)), checksum);
}

#[tokio::test]
async fn pix_generate_requires_amount_and_customer() {
    let app = test_app(10);

    let (status, body) = send(
        app.clone(),
        post_json("/pix/generate", json!({ "description": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));

    let (status, body) = send(
        app,
        post_json(
            "/pix/generate",
            json!({ "amount": 0, "customer": { "name": "Ana" } }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn pix_generate_uses_explicit_description() {
    let app = test_app(10);
    let body = json!({
        "amount": 10,
        "description": "Pedido 1234",
        "customer": { "name": "Ana" }
    });

    let (_, response) = send(app, post_json("/pix/generate", body)).await;
    assert_eq!(response["pix"]["description"], json!("Pedido 1234"));
}
