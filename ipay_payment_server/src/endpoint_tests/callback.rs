//! Callback endpoint tests against a real SQLite backend, since the interesting behaviour is the
//! interplay between signature verification, reconciliation, and the HTTP status mapping.

use std::collections::HashMap;

use actix_web::{http::StatusCode, web, web::ServiceConfig};
use ipay_payment_engine::{
    db_types::{NewOrder, OrderId, PaymentState},
    events::EventProducers,
    helpers::{sign_fields, CALLBACK_SIGNATURE_FIELDS},
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    ReconciliationApi,
    SqliteDatabase,
};
use ipg_common::Cents;

use super::{
    helpers::{get_request, post_form},
    mocks::test_server_config,
};
use crate::routes::{IpayCallbackRedirectRoute, IpayCallbackRoute};

const SUCCESS: &str = "aei7p7yrx4ae34";
const PENDING: &str = "bdi6p2yy76etrs";

async fn new_db() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database")
}

async fn seed_order(db: &SqliteDatabase, order_id: &str) {
    let config = test_server_config(false);
    let api = ReconciliationApi::new(db.clone(), config.reconciliation_config(), EventProducers::default());
    let order = NewOrder::new(
        OrderId::from(order_id.to_string()),
        "jane@example.com".to_string(),
        "tok-100".to_string(),
        Cents::from_whole(100),
    );
    api.initiate_payment(order, "0712345678").await.expect("initiation failed");
}

fn configure(skip_signature_check: bool, db: SqliteDatabase) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let config = test_server_config(skip_signature_check);
        let api = ReconciliationApi::new(db, config.reconciliation_config(), EventProducers::default());
        cfg.service(IpayCallbackRoute::<SqliteDatabase>::new())
            .service(IpayCallbackRedirectRoute::<SqliteDatabase>::new())
            .app_data(web::Data::new(api))
            .app_data(web::Data::new(config));
    }
}

/// A callback carrying a valid signature over the fields the gateway signs, plus the unsigned
/// outcome fields.
fn signed_callback(order_id: &str, status: &str, amount: &str, txid: &str) -> HashMap<String, String> {
    let values = [
        "0",
        order_id,
        order_id,
        "10000",
        "254712345678",
        "jane@example.com",
        "demo",
        "KES",
        "",
        "",
        "",
        "",
        "https://shop.test/ipay/callback",
        "1",
        "2",
    ];
    let hsh = sign_fields("demo-secret-key", &values).expect("could not sign test callback");
    let mut fields: HashMap<String, String> = CALLBACK_SIGNATURE_FIELDS
        .iter()
        .zip(values)
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    fields.insert("status".to_string(), status.to_string());
    fields.insert("txncd".to_string(), txid.to_string());
    fields.insert("mc".to_string(), amount.to_string());
    fields.insert("hsh".to_string(), hsh);
    fields
}

fn response_status(body: &str) -> String {
    let v: serde_json::Value = serde_json::from_str(body).expect("response body is not JSON");
    v["status"].as_str().unwrap_or_default().to_string()
}

#[actix_web::test]
async fn verified_success_callback_settles_the_order() {
    let _ = env_logger::try_init().ok();
    let db = new_db().await;
    seed_order(&db, "W200").await;
    let form = signed_callback("W200", SUCCESS, "100.00", "TXN-200");
    let (status, body) = post_form("/ipay/callback", &form, configure(false, db)).await;
    assert_eq!(status, StatusCode::OK);
    let v: serde_json::Value = serde_json::from_str(&body).expect("response body is not JSON");
    assert_eq!(v["status"], "completed");
    // the gateway-facing body carries the order reference under "id"
    assert_eq!(v["id"], "W200");
}

#[actix_web::test]
async fn replayed_callback_is_acknowledged_as_duplicate() {
    let _ = env_logger::try_init().ok();
    let db = new_db().await;
    seed_order(&db, "W201").await;
    let form = signed_callback("W201", SUCCESS, "100.00", "TXN-201");
    let (status, _) = post_form("/ipay/callback", &form, configure(false, db.clone())).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = post_form("/ipay/callback", &form, configure(false, db)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response_status(&body), "duplicate");
}

#[actix_web::test]
async fn tampered_signature_is_rejected_without_side_effects() {
    let _ = env_logger::try_init().ok();
    let db = new_db().await;
    seed_order(&db, "W202").await;
    let mut form = signed_callback("W202", SUCCESS, "100.00", "TXN-202");
    form.insert("ttl".to_string(), "999999".to_string());
    let (status, body) = post_form("/ipay/callback", &form, configure(false, db.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, r#"{"error":"Callback signature invalid or missing"}"#);
    // the payment was never touched
    let config = test_server_config(false);
    let api = ReconciliationApi::new(db, config.reconciliation_config(), EventProducers::default());
    let poll = api.poll_status(&OrderId::from("W202".to_string())).await.unwrap();
    assert_eq!(poll.payment.unwrap().state, PaymentState::Checkout);
}

#[actix_web::test]
async fn callback_without_a_signature_is_rejected() {
    let _ = env_logger::try_init().ok();
    let db = new_db().await;
    seed_order(&db, "W203").await;
    let mut form = signed_callback("W203", SUCCESS, "100.00", "TXN-203");
    form.remove("hsh");
    let (status, _) = post_form("/ipay/callback", &form, configure(false, db)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn callback_without_a_status_field_is_a_bad_request() {
    let _ = env_logger::try_init().ok();
    let db = new_db().await;
    seed_order(&db, "W204").await;
    let mut form = signed_callback("W204", SUCCESS, "100.00", "TXN-204");
    form.remove("status");
    let (status, _) = post_form("/ipay/callback", &form, configure(false, db)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn insufficient_settlement_is_payment_required() {
    let _ = env_logger::try_init().ok();
    let db = new_db().await;
    seed_order(&db, "W205").await;
    let form = signed_callback("W205", SUCCESS, "50.00", "TXN-205");
    let (status, body) = post_form("/ipay/callback", &form, configure(false, db)).await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(response_status(&body), "failed");
}

#[actix_web::test]
async fn unknown_status_token_is_unprocessable() {
    let _ = env_logger::try_init().ok();
    let db = new_db().await;
    seed_order(&db, "W206").await;
    let form = signed_callback("W206", "zz9not8a7token", "100.00", "TXN-206");
    let (status, body) = post_form("/ipay/callback", &form, configure(false, db)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response_status(&body), "failed");
}

#[actix_web::test]
async fn callback_for_an_unknown_order_is_not_found() {
    let _ = env_logger::try_init().ok();
    let db = new_db().await;
    let form = signed_callback("W999", SUCCESS, "100.00", "TXN-999");
    let (status, _) = post_form("/ipay/callback", &form, configure(false, db)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn sandbox_opt_in_accepts_an_unsigned_redirect_callback() {
    let _ = env_logger::try_init().ok();
    let db = new_db().await;
    seed_order(&db, "W207").await;
    let path = format!("/ipay/callback?status={PENDING}&oid=W207&txncd=TXN-207&mc=100.00&curr=KES");
    let (status, body) = get_request(&path, configure(true, db)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response_status(&body), "processing");
}

#[actix_web::test]
async fn unsigned_redirect_callback_is_rejected_outside_the_sandbox_opt_in() {
    let _ = env_logger::try_init().ok();
    let db = new_db().await;
    seed_order(&db, "W208").await;
    let path = format!("/ipay/callback?status={PENDING}&oid=W208&txncd=TXN-208&mc=100.00&curr=KES");
    let (status, _) = get_request(&path, configure(false, db)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
