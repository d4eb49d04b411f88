use axum::Json;
use axum::Router;
use axum::http::{HeaderMap, StatusCode};
use axum::extract::Path;
use axum::routing::{get, post};
use commerce_sync::adapters::coinbase::charges::{
    API_VERSION, Charge, ChargeClient, ChargeRequest, DEFAULT_STORE_NAME, hosted_url,
};
use commerce_sync::domain::error::PaymentError;
use commerce_sync::domain::id::{ChargeCode, IncrementId};
use commerce_sync::domain::money::{Amount, CurrencyCode, Money};
use commerce_sync::domain::order::{Customer, Order, OrderPayment, OrderState};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn order() -> Order {
    Order {
        id: uuid::Uuid::now_v7(),
        increment_id: IncrementId::new("000000086").unwrap(),
        state: OrderState::Pending,
        customer: Customer {
            id: Some("2".into()),
            name: "Omair Khalid".into(),
            email: "omair.khalid@example.com".into(),
        },
        grand_total: Money::new(
            Amount::new("64.00").unwrap(),
            CurrencyCode::new("USD").unwrap(),
        ),
        email_sent: false,
        payment: OrderPayment::default(),
    }
}

type Seen = Arc<Mutex<Option<(HeaderMap, Value)>>>;

/// Fake processor answering every charge request with `status` and `reply`.
async fn fake_processor(status: StatusCode, reply: Value) -> (String, Seen) {
    let seen: Seen = Arc::default();
    let recorder = seen.clone();
    let app = Router::new().route(
        "/charges/",
        post(move |headers: HeaderMap, Json(body): Json<Value>| {
            let recorder = recorder.clone();
            let reply = reply.clone();
            async move {
                *recorder.lock().unwrap() = Some((headers, body));
                (status, Json(reply))
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), seen)
}

#[test]
fn request_carries_order_details() {
    let request = ChargeRequest::for_order(&order(), "Acme", "https://shop.example/success");
    let body = serde_json::to_value(&request).unwrap();

    assert_eq!(
        body,
        json!({
            "name": "Acme",
            "description": "Purchased through Coinbase Commerce",
            "local_price": {"amount": "64.00", "currency": "USD"},
            "pricing_type": "fixed_price",
            "metadata": {
                "id": "2",
                "customer_name": "Omair Khalid",
                "customer_email": "omair.khalid@example.com",
                "store_increment_id": "000000086"
            },
            "redirect_url": "https://shop.example/success"
        })
    );
}

#[test]
fn blank_store_name_falls_back() {
    let request = ChargeRequest::for_order(&order(), "  ", "/success");
    assert_eq!(request.name, DEFAULT_STORE_NAME);
}

#[test]
fn hosted_url_must_be_present() {
    let ok = json!({"data": {"code": "EMDWFKFL", "hosted_url": "https://commerce.coinbase.com/charges/EMDWFKFL"}});
    assert_eq!(
        hosted_url(&ok).unwrap(),
        "https://commerce.coinbase.com/charges/EMDWFKFL"
    );

    for missing in [json!({"data": {"code": "EMDWFKFL"}}), json!({"data": {"hosted_url": ""}}), json!({})] {
        assert!(matches!(
            hosted_url(&missing),
            Err(PaymentError::ChargeCreationFailed(_))
        ));
    }
}

#[tokio::test]
async fn create_charge_returns_hosted_url() {
    let (base, seen) = fake_processor(
        StatusCode::CREATED,
        json!({"data": {"code": "EMDWFKFL", "hosted_url": "https://commerce.coinbase.com/charges/EMDWFKFL"}}),
    )
    .await;
    let client = ChargeClient::new("key_123", &format!("{base}/"), Duration::from_secs(5)).unwrap();
    let request = ChargeRequest::for_order(&order(), "Acme", "/success");

    let charge = client.create_charge(&request).await.unwrap();
    assert_eq!(charge.code.as_str(), "EMDWFKFL");
    assert_eq!(charge.hosted_url, "https://commerce.coinbase.com/charges/EMDWFKFL");

    let (headers, body) = seen.lock().unwrap().take().unwrap();
    assert_eq!(headers["x-cc-api-key"], "key_123");
    assert_eq!(headers["x-cc-version"], API_VERSION);
    assert_eq!(headers["content-type"], "application/json");
    assert_eq!(body["metadata"]["store_increment_id"], "000000086");
    assert_eq!(body["local_price"]["amount"], "64.00");
}

#[tokio::test]
async fn response_without_hosted_url_fails() {
    let (base, _) = fake_processor(StatusCode::CREATED, json!({"data": {"code": "EMDWFKFL"}})).await;
    let client = ChargeClient::new("key_123", &base, Duration::from_secs(5)).unwrap();

    let err = client
        .create_charge(&ChargeRequest::for_order(&order(), "Acme", "/success"))
        .await
        .unwrap_err();
    assert!(matches!(err, PaymentError::ChargeCreationFailed(_)));
}

#[tokio::test]
async fn processor_rejection_fails() {
    let (base, _) = fake_processor(
        StatusCode::UNAUTHORIZED,
        json!({"error": {"type": "authorization_error", "message": "No such API key."}}),
    )
    .await;
    let client = ChargeClient::new("bad_key", &base, Duration::from_secs(5)).unwrap();

    let err = client
        .create_charge(&ChargeRequest::for_order(&order(), "Acme", "/success"))
        .await
        .unwrap_err();
    match err {
        PaymentError::ChargeCreationFailed(msg) => assert!(msg.contains("No such API key.")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn charge_needs_a_valid_code() {
    let body = json!({"data": {"hosted_url": "https://commerce.coinbase.com/charges/X"}});
    assert!(matches!(
        Charge::from_body(&body),
        Err(PaymentError::ChargeCreationFailed(_))
    ));

    let body = json!({"data": {"code": "not a code!", "hosted_url": "https://commerce.coinbase.com/charges/X"}});
    assert!(matches!(
        Charge::from_body(&body),
        Err(PaymentError::ChargeCreationFailed(_))
    ));
}

#[tokio::test]
async fn fetch_charge_reads_existing_charge() {
    let app = Router::new().route(
        "/charges/{code}",
        get(|headers: HeaderMap, Path(code): Path<String>| async move {
            assert_eq!(headers["x-cc-api-key"], "key_123");
            Json(json!({"data": {
                "code": code,
                "hosted_url": format!("https://commerce.coinbase.com/charges/{code}")
            }}))
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = ChargeClient::new("key_123", &format!("http://{addr}"), Duration::from_secs(5)).unwrap();
    let charge = client
        .fetch_charge(&ChargeCode::new("EMDWFKFL").unwrap())
        .await
        .unwrap();

    assert_eq!(charge.code.as_str(), "EMDWFKFL");
    assert_eq!(charge.hosted_url, "https://commerce.coinbase.com/charges/EMDWFKFL");
}
