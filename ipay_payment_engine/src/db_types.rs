use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use ipg_common::Cents;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Invalid value for {0}: {1}")]
pub struct ConversionError(pub &'static str, pub String);

//--------------------------------------        OrderId        -------------------------------------------------------
/// The merchant's externally visible order reference number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct OrderId(pub String);

impl FromStr for OrderId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------    CheckoutState      -------------------------------------------------------
/// The order's position in the checkout flow. The sequence is strictly ordered and callback
/// processing only ever moves an order forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum CheckoutState {
    Address,
    Delivery,
    Payment,
    Confirm,
    Complete,
}

impl CheckoutState {
    /// The next step in the checkout sequence, or `None` once the order is complete.
    pub fn next(&self) -> Option<CheckoutState> {
        use CheckoutState::*;
        match self {
            Address => Some(Delivery),
            Delivery => Some(Payment),
            Payment => Some(Confirm),
            Confirm => Some(Complete),
            Complete => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, CheckoutState::Complete)
    }
}

impl Display for CheckoutState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CheckoutState::Address => "Address",
            CheckoutState::Delivery => "Delivery",
            CheckoutState::Payment => "Payment",
            CheckoutState::Confirm => "Confirm",
            CheckoutState::Complete => "Complete",
        };
        f.write_str(s)
    }
}

impl FromStr for CheckoutState {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Address" => Ok(Self::Address),
            "Delivery" => Ok(Self::Delivery),
            "Payment" => Ok(Self::Payment),
            "Confirm" => Ok(Self::Confirm),
            "Complete" => Ok(Self::Complete),
            s => Err(ConversionError("checkout state", s.to_string())),
        }
    }
}

//--------------------------------------   SettlementStatus    -------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum SettlementStatus {
    Unpaid,
    Paid,
}

impl Display for SettlementStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettlementStatus::Unpaid => write!(f, "Unpaid"),
            SettlementStatus::Paid => write!(f, "Paid"),
        }
    }
}

//--------------------------------------     PaymentState      -------------------------------------------------------
/// The payment lifecycle: `Checkout → Processing → {Completed, Failed, Void}`. The three terminal
/// states admit no further transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum PaymentState {
    /// The payment has been created but the customer has not been sent to the gateway yet.
    Checkout,
    /// The gateway has acknowledged the transaction and reported it as pending.
    Processing,
    /// The gateway confirmed settlement and the amount was sufficient.
    Completed,
    Failed,
    /// Cancelled by the merchant before settlement.
    Void,
}

impl PaymentState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentState::Completed | PaymentState::Failed | PaymentState::Void)
    }
}

impl Display for PaymentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentState::Checkout => "Checkout",
            PaymentState::Processing => "Processing",
            PaymentState::Completed => "Completed",
            PaymentState::Failed => "Failed",
            PaymentState::Void => "Void",
        };
        f.write_str(s)
    }
}

impl FromStr for PaymentState {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Checkout" => Ok(Self::Checkout),
            "Processing" => Ok(Self::Processing),
            "Completed" => Ok(Self::Completed),
            "Failed" => Ok(Self::Failed),
            "Void" => Ok(Self::Void),
            s => Err(ConversionError("payment state", s.to_string())),
        }
    }
}

//--------------------------------------        Order          -------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub order_id: OrderId,
    /// The customer's email address, also used as one half of the guest status-poll credential.
    pub email: String,
    /// The guest access token issued at checkout. Compared with constant-time equality.
    pub access_token: String,
    pub total_price: Cents,
    pub currency: String,
    pub checkout_state: CheckoutState,
    pub settlement: SettlementStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn is_paid(&self) -> bool {
        self.settlement == SettlementStatus::Paid
    }
}

//--------------------------------------       NewOrder        -------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_id: OrderId,
    pub email: String,
    pub access_token: String,
    pub total_price: Cents,
    pub currency: String,
}

impl NewOrder {
    pub fn new(order_id: OrderId, email: String, access_token: String, total_price: Cents) -> Self {
        Self { order_id, email, access_token, total_price, currency: ipg_common::KES_CURRENCY_CODE.to_string() }
    }
}

//--------------------------------------       Payment         -------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Payment {
    pub id: i64,
    pub order_id: OrderId,
    pub amount: Cents,
    /// The gateway's transaction id, recorded when the gateway first reports the transaction.
    /// Once set it is never overwritten.
    pub response_code: Option<String>,
    pub state: PaymentState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------      NewPayment       -------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub order_id: OrderId,
    pub amount: Cents,
}

impl NewPayment {
    pub fn new(order_id: OrderId, amount: Cents) -> Self {
        Self { order_id, amount }
    }
}

//--------------------------------------    PaymentSource      -------------------------------------------------------
/// The normalized customer phone number bound to a payment. Created lazily when a payment of the
/// iPay type is first initiated and removed together with its payment.
#[derive(Debug, Clone, FromRow)]
pub struct PaymentSource {
    pub id: i64,
    pub payment_id: i64,
    pub phone: String,
    pub created_at: DateTime<Utc>,
}
