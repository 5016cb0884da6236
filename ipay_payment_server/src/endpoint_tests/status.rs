use actix_web::{http::StatusCode, web, web::ServiceConfig};
use ipay_payment_engine::{db_types::PaymentState, events::EventProducers, ReconciliationApi};

use super::{
    helpers::get_request,
    mocks::{seeded_order, seeded_payment, test_server_config, MockPaymentsDb},
};
use crate::routes::OrderStatusRoute;

fn configure(cfg: &mut ServiceConfig) {
    let mut db = MockPaymentsDb::new();
    db.expect_fetch_order_by_order_id()
        .returning(|oid| if oid.as_str() == "W100" { Ok(Some(seeded_order())) } else { Ok(None) });
    db.expect_fetch_latest_payment_for_order().returning(|_| Ok(Some(seeded_payment(PaymentState::Processing))));
    let config = test_server_config(false);
    let api = ReconciliationApi::new(db, config.reconciliation_config(), EventProducers::default());
    cfg.service(OrderStatusRoute::<MockPaymentsDb>::new()).app_data(web::Data::new(api));
}

#[actix_web::test]
async fn status_poll_with_valid_credentials() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        get_request("/ipay/status/W100?token=tok-100&email=jane@example.com", configure).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        r#"{"order_id":"W100","checkout_state":"Payment","settlement":"Unpaid","payment_state":"Processing","total_price":"100.00","currency":"KES"}"#
    );
}

#[actix_web::test]
async fn status_poll_email_is_case_insensitive() {
    let _ = env_logger::try_init().ok();
    let (status, _) = get_request("/ipay/status/W100?token=tok-100&email=Jane@Example.COM", configure).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn status_poll_with_wrong_token_is_unauthorized() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        get_request("/ipay/status/W100?token=tok-999&email=jane@example.com", configure).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, r#"{"error":"Order credentials do not match"}"#);
}

#[actix_web::test]
async fn status_poll_with_wrong_email_is_unauthorized() {
    let _ = env_logger::try_init().ok();
    let (status, _) = get_request("/ipay/status/W100?token=tok-100&email=mallory@example.com", configure).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn status_poll_for_unknown_order_is_not_found() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        get_request("/ipay/status/W999?token=tok-100&email=jane@example.com", configure).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"The data was not found. Order #W999"}"#);
}

#[actix_web::test]
async fn status_poll_without_credentials_is_a_bad_request() {
    let _ = env_logger::try_init().ok();
    // Missing query parameters fail extraction before the handler runs.
    let (status, _) = get_request("/ipay/status/W100", configure).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
