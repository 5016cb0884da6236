use actix_web::{http::StatusCode, web, web::ServiceConfig};
use ipay_payment_engine::{
    db_types::{PaymentState, SettlementStatus},
    events::EventProducers,
    helpers::sign_fields,
    ReconciliationApi,
};
use serde_json::json;

use super::{
    helpers::post_json,
    mocks::{seeded_order, seeded_payment, test_server_config, MockPaymentsDb},
};
use crate::{
    integrations::IpayClient,
    routes::{CancelPaymentRoute, InitiatePaymentRoute},
};

fn configure_initiate(cfg: &mut ServiceConfig) {
    let mut db = MockPaymentsDb::new();
    db.expect_insert_order().returning(|_| Ok((seeded_order(), true)));
    db.expect_fetch_latest_payment_for_order().returning(|_| Ok(None));
    db.expect_insert_payment().returning(|_| Ok(seeded_payment(PaymentState::Checkout)));
    db.expect_upsert_payment_source().returning(|_, _| Ok(()));
    let config = test_server_config(false);
    let api = ReconciliationApi::new(db, config.reconciliation_config(), EventProducers::default());
    cfg.service(InitiatePaymentRoute::<MockPaymentsDb>::new())
        .app_data(web::Data::new(api))
        .app_data(web::Data::new(config));
}

fn initiate_body(phone: &str) -> serde_json::Value {
    json!({
        "order_id": "W100",
        "email": "jane@example.com",
        "access_token": "tok-100",
        "total_price": "100.00",
        "phone": phone,
    })
}

#[actix_web::test]
async fn initiate_returns_the_signed_gateway_form() {
    let _ = env_logger::try_init().ok();
    let (status, body) = post_json("/ipay/initiate", &initiate_body("0712345678"), configure_initiate).await;
    assert_eq!(status, StatusCode::OK);
    let response: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(response["payment_id"], 1);
    assert_eq!(response["endpoint"], "https://payments.ipayafrica.com/v3/ke");
    assert_eq!(response["return_url"], "https://shop.test/orders/thanks");
    let fields: Vec<(String, String)> = serde_json::from_value(response["fields"].clone()).unwrap();
    let field = |name: &str| {
        fields.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str()).unwrap_or_else(|| panic!("missing {name}"))
    };
    assert_eq!(field("live"), "0");
    assert_eq!(field("oid"), "W100");
    assert_eq!(field("inv"), "W100");
    // minor units, normalized phone
    assert_eq!(field("ttl"), "10000");
    assert_eq!(field("tel"), "254712345678");
    assert_eq!(field("vid"), "demo");
    assert_eq!(field("curr"), "KES");
    let expected = sign_fields("demo-secret-key", &[
        "0",
        "W100",
        "W100",
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
    ])
    .unwrap();
    assert_eq!(field("hsh"), expected);
}

#[actix_web::test]
async fn initiate_rejects_an_invalid_phone_number() {
    let _ = env_logger::try_init().ok();
    let (status, _) = post_json("/ipay/initiate", &initiate_body("0812345678"), configure_initiate).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn initiate_rejects_an_unparseable_amount() {
    let _ = env_logger::try_init().ok();
    let mut body = initiate_body("0712345678");
    body["total_price"] = json!("a lot");
    let (status, _) = post_json("/ipay/initiate", &body, configure_initiate).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn initiate_conflicts_for_a_settled_order() {
    let _ = env_logger::try_init().ok();
    let configure = |cfg: &mut ServiceConfig| {
        let mut db = MockPaymentsDb::new();
        db.expect_insert_order().returning(|_| {
            let mut order = seeded_order();
            order.settlement = SettlementStatus::Paid;
            Ok((order, false))
        });
        let config = test_server_config(false);
        let api = ReconciliationApi::new(db, config.reconciliation_config(), EventProducers::default());
        cfg.service(InitiatePaymentRoute::<MockPaymentsDb>::new())
            .app_data(web::Data::new(api))
            .app_data(web::Data::new(config));
    };
    let (status, _) = post_json("/ipay/initiate", &initiate_body("0712345678"), configure).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

fn configure_cancel(cfg: &mut ServiceConfig) {
    let mut db = MockPaymentsDb::new();
    db.expect_fetch_payment()
        .returning(|id| if id == 1 { Ok(Some(seeded_payment(PaymentState::Processing))) } else { Ok(None) });
    db.expect_update_payment_state().returning(|_, state| Ok(seeded_payment(state)));
    let config = test_server_config(false);
    let client = IpayClient::new(config.ipay.clone()).unwrap();
    let api = ReconciliationApi::new(db, config.reconciliation_config(), EventProducers::default());
    cfg.service(CancelPaymentRoute::<MockPaymentsDb>::new())
        .app_data(web::Data::new(api))
        .app_data(web::Data::new(client));
}

#[actix_web::test]
async fn cancel_voids_a_payment_the_gateway_never_saw() {
    let _ = env_logger::try_init().ok();
    // No response code on record, so no gateway round-trip happens.
    let (status, body) = post_json("/ipay/cancel/1", &json!({}), configure_cancel).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"payment_id":1,"state":"Void","gateway_notified":false}"#);
}

#[actix_web::test]
async fn cancel_of_an_unknown_payment_is_not_found() {
    let _ = env_logger::try_init().ok();
    let (status, body) = post_json("/ipay/cancel/42", &json!({}), configure_cancel).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"The data was not found. Payment 42"}"#);
}
