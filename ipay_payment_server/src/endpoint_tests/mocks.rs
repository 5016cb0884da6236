use chrono::{TimeZone, Utc};
use ipay_payment_engine::{
    db_types::{
        CheckoutState,
        NewOrder,
        NewPayment,
        Order,
        OrderId,
        Payment,
        PaymentState,
        SettlementStatus,
    },
    ipay::{IpayConfig, OverpaymentPolicy},
    traits::{PaymentGatewayDatabase, PaymentGatewayError},
};
use ipg_common::{Cents, Secret};
use mockall::mock;

use crate::config::ServerConfig;

mock! {
    pub PaymentsDb {}
    impl Clone for PaymentsDb {
        fn clone(&self) -> Self;
    }
    impl PaymentGatewayDatabase for PaymentsDb {
        fn url(&self) -> &str;
        async fn insert_order(&self, order: NewOrder) -> Result<(Order, bool), PaymentGatewayError>;
        async fn fetch_order_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, PaymentGatewayError>;
        async fn insert_payment(&self, payment: NewPayment) -> Result<Payment, PaymentGatewayError>;
        async fn fetch_payment(&self, id: i64) -> Result<Option<Payment>, PaymentGatewayError>;
        async fn fetch_payment_by_response_code(&self, code: &str) -> Result<Option<Payment>, PaymentGatewayError>;
        async fn fetch_latest_payment_for_order(&self, order_id: &OrderId) -> Result<Option<Payment>, PaymentGatewayError>;
        async fn upsert_payment_source(&self, payment_id: i64, phone: &str) -> Result<(), PaymentGatewayError>;
        async fn fetch_payment_source(&self, payment_id: i64) -> Result<Option<String>, PaymentGatewayError>;
        async fn set_response_code(&self, payment_id: i64, code: &str) -> Result<Payment, PaymentGatewayError>;
        async fn update_payment_state(&self, payment_id: i64, new_state: PaymentState) -> Result<Payment, PaymentGatewayError>;
        async fn advance_order(&self, order_id: &OrderId) -> Result<Order, PaymentGatewayError>;
        async fn mark_order_paid(&self, order_id: &OrderId) -> Result<Order, PaymentGatewayError>;
        async fn close(&mut self) -> Result<(), PaymentGatewayError>;
    }
}

// Fixed fixtures shared by the mock-backed endpoint tests.
pub fn seeded_order() -> Order {
    Order {
        id: 1,
        order_id: OrderId::from("W100".to_string()),
        email: "jane@example.com".to_string(),
        access_token: "tok-100".to_string(),
        total_price: Cents::from_whole(100),
        currency: "KES".to_string(),
        checkout_state: CheckoutState::Payment,
        settlement: SettlementStatus::Unpaid,
        created_at: Utc.with_ymd_and_hms(2024, 6, 12, 10, 0, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 6, 12, 10, 0, 0).unwrap(),
    }
}

pub fn seeded_payment(state: PaymentState) -> Payment {
    Payment {
        id: 1,
        order_id: OrderId::from("W100".to_string()),
        amount: Cents::from_whole(100),
        response_code: None,
        state,
        created_at: Utc.with_ymd_and_hms(2024, 6, 12, 10, 0, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 6, 12, 10, 5, 0).unwrap(),
    }
}

pub fn test_server_config(skip_signature_check: bool) -> ServerConfig {
    let ipay = IpayConfig {
        vendor_id: "demo".to_string(),
        hash_key: Secret::from("demo-secret-key".to_string()),
        callback_url: "https://shop.test/ipay/callback".to_string(),
        return_url: "https://shop.test/orders/thanks".to_string(),
        ..IpayConfig::default()
    };
    ServerConfig {
        skip_signature_check,
        ipay,
        overpayment_policy: OverpaymentPolicy::Reject,
        ..ServerConfig::default()
    }
}
