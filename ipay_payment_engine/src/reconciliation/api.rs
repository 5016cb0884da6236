use std::{collections::HashMap, fmt::Debug, sync::Arc};

use ipg_common::Cents;
use log::*;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::{
    amount::{validate_amount, AmountOutcome},
    db_types::{NewOrder, NewPayment, Order, OrderId, Payment, PaymentState},
    events::{EventProducers, OrderPaidEvent, PaymentFlaggedEvent},
    helpers::{normalize_phone, PhoneNumberError, SignatureError},
    ipay::{build_initiation, GatewayCallback, OverpaymentPolicy, SignedRequest},
    reconciliation::{FailureReason, ReconciliationConfig, ReconciliationResult, StatusPollResult},
    status_codes::CanonicalStatus,
    traits::{PaymentGatewayDatabase, PaymentGatewayError},
};

#[derive(Debug, Error)]
pub enum ReconciliationError {
    #[error(transparent)]
    Database(#[from] PaymentGatewayError),
    #[error(transparent)]
    InvalidPhone(#[from] PhoneNumberError),
    #[error(transparent)]
    Signature(#[from] SignatureError),
    #[error("No payment exists for order {0}")]
    NoPaymentForOrder(OrderId),
}

/// `ReconciliationApi` drives the payment state machine in response to gateway callbacks and
/// merchant actions.
///
/// The read-check-transition sequence for a single payment is serialized behind a per-payment
/// async mutex, so two concurrent callbacks for the same transaction cannot both observe "not
/// yet Completed". Cross-payment races on the same order are caught by the settlement guard in
/// [`PaymentGatewayDatabase::mark_order_paid`].
pub struct ReconciliationApi<B> {
    db: B,
    config: ReconciliationConfig,
    producers: EventProducers,
    locks: Arc<Mutex<HashMap<i64, Arc<Mutex<()>>>>>,
}

impl<B> Debug for ReconciliationApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReconciliationApi")
    }
}

// Clones share the lock map. Every handle over the same store must serialize on the same
// per-payment locks, so hand workers clones of one api rather than fresh instances.
impl<B: Clone> Clone for ReconciliationApi<B> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            config: self.config.clone(),
            producers: self.producers.clone(),
            locks: Arc::clone(&self.locks),
        }
    }
}

impl<B> ReconciliationApi<B> {
    pub fn new(db: B, config: ReconciliationConfig, producers: EventProducers) -> Self {
        Self { db, config, producers, locks: Arc::new(Mutex::new(HashMap::new())) }
    }

    pub fn config(&self) -> &ReconciliationConfig {
        &self.config
    }

    // The map only ever grows by payments actually touched, so no eviction is needed.
    async fn payment_lock(&self, payment_id: i64) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        Arc::clone(locks.entry(payment_id).or_default())
    }
}

impl<B> ReconciliationApi<B>
where B: PaymentGatewayDatabase
{
    /// Reconcile a verified gateway callback against the stored payment and order state.
    ///
    /// Signature verification happens before this call; by this point the callback is trusted.
    /// The engine never retries on its own. A database error surfaces to the caller, and the
    /// gateway redelivers the callback.
    pub async fn reconcile(&self, callback: &GatewayCallback) -> Result<ReconciliationResult, ReconciliationError> {
        let order = self
            .db
            .fetch_order_by_order_id(&callback.order_ref)
            .await?
            .ok_or_else(|| PaymentGatewayError::OrderNotFound(callback.order_ref.clone()))?;
        let payment = self.locate_payment(&order, callback).await?;
        let lock = self.payment_lock(payment.id).await;
        let _guard = lock.lock().await;
        // Re-read under the lock; a concurrent delivery may have won the race to this point.
        let payment = self
            .db
            .fetch_payment(payment.id)
            .await?
            .ok_or(PaymentGatewayError::PaymentNotFound(payment.id))?;
        if payment.state == PaymentState::Completed {
            debug!("🧾️ Replayed callback for completed payment {}: {callback}", payment.id);
            return Ok(ReconciliationResult::Duplicate { payment });
        }
        trace!("🧾️ Reconciling {callback} against payment {} [{}]", payment.id, payment.state);
        let result = match callback.status {
            CanonicalStatus::Duplicate => {
                debug!("🧾️ Gateway flagged a duplicate transaction for payment {}", payment.id);
                ReconciliationResult::Duplicate { payment }
            },
            CanonicalStatus::Pending => {
                let payment = self.record_response_code(payment, callback).await?;
                let payment = if payment.state == PaymentState::Checkout {
                    self.db.update_payment_state(payment.id, PaymentState::Processing).await?
                } else {
                    payment
                };
                ReconciliationResult::Processing { payment }
            },
            CanonicalStatus::Failed => self.fail_payment(payment, FailureReason::GatewayFailure).await?,
            CanonicalStatus::InsufficientAmount => {
                self.fail_payment(payment, FailureReason::InsufficientAmount).await?
            },
            CanonicalStatus::Overpaid => {
                let payment = self.record_response_code(payment, callback).await?;
                self.apply_overpayment_policy(order, payment).await?
            },
            CanonicalStatus::Unknown => {
                warn!("🧾️ Unrecognized status token '{}' for payment {}", callback.raw_status, payment.id);
                self.flag_payment(&payment, format!("unrecognized gateway status token '{}'", callback.raw_status))
                    .await;
                self.fail_payment(payment, FailureReason::UnknownStatus).await?
            },
            CanonicalStatus::Success => self.reconcile_success(order, payment, callback).await?,
        };
        info!("🧾️ Reconciliation outcome: {result}");
        Ok(result)
    }

    async fn reconcile_success(
        &self,
        order: Order,
        payment: Payment,
        callback: &GatewayCallback,
    ) -> Result<ReconciliationResult, ReconciliationError> {
        if payment.state.is_terminal() {
            // Completed was handled above, so this payment has failed or been voided. A success
            // report for it cannot be honoured automatically.
            warn!("🧾️ Success callback for payment {} in terminal state {}", payment.id, payment.state);
            self.flag_payment(&payment, format!("gateway reported success for a {} payment", payment.state)).await;
            return Ok(ReconciliationResult::Failed { payment, reason: FailureReason::GatewayFailure });
        }
        let payment = self.record_response_code(payment, callback).await?;
        match self.amount_outcome(&order, &payment, callback) {
            AmountOutcome::Sufficient => self.complete_payment(order, payment).await,
            AmountOutcome::Insufficient => {
                Ok(self.fail_payment(payment, FailureReason::InsufficientAmount).await?)
            },
            AmountOutcome::Over => self.apply_overpayment_policy(order, payment).await,
        }
    }

    /// A gateway-reported success only counts if the settled amount covers the payment in the
    /// order's currency. A missing or unparseable amount downgrades to Insufficient.
    fn amount_outcome(&self, order: &Order, payment: &Payment, callback: &GatewayCallback) -> AmountOutcome {
        let paid = match callback.paid_amount.as_deref().map(str::parse::<Cents>) {
            Some(Ok(amount)) => amount,
            Some(Err(e)) => {
                warn!("🧾️ Unparseable settled amount in {callback}: {e}");
                return AmountOutcome::Insufficient;
            },
            None => {
                warn!("🧾️ Success callback without a settled amount: {callback}");
                return AmountOutcome::Insufficient;
            },
        };
        let paid_currency = callback.currency.as_deref().unwrap_or(&order.currency);
        validate_amount(paid, paid_currency, payment.amount, &order.currency)
    }

    async fn complete_payment(
        &self,
        order: Order,
        payment: Payment,
    ) -> Result<ReconciliationResult, ReconciliationError> {
        if order.is_paid() {
            // A different payment has already settled this order. At most one payment per order
            // may ever reach Completed.
            debug!("🧾️ Order {} is already settled; payment {} left untouched", order.order_id, payment.id);
            return Ok(ReconciliationResult::Duplicate { payment });
        }
        let payment = self.db.update_payment_state(payment.id, PaymentState::Completed).await?;
        let order = match self.db.mark_order_paid(&order.order_id).await {
            Ok(order) => order,
            Err(PaymentGatewayError::OrderAlreadyPaid(oid)) => {
                // A different payment settled this order first. Leave the order alone and hand
                // the completed payment to an operator.
                warn!("🧾️ Payment {} completed against already-settled order {oid}", payment.id);
                self.flag_payment(&payment, "payment completed for an already-settled order").await;
                return Ok(ReconciliationResult::Duplicate { payment });
            },
            Err(e) => return Err(e.into()),
        };
        let order = self.advance_to_complete(order).await?;
        self.call_order_paid_hook(&order).await;
        Ok(ReconciliationResult::Completed { order, payment })
    }

    /// Walk the order forward one checkout step at a time. If an advancement step is rejected,
    /// stop advancing but leave the payment completed; settlement already happened.
    async fn advance_to_complete(&self, mut order: Order) -> Result<Order, ReconciliationError> {
        while !order.checkout_state.is_complete() {
            match self.db.advance_order(&order.order_id).await {
                Ok(advanced) => order = advanced,
                Err(PaymentGatewayError::OrderAdvanceRejected(oid)) => {
                    warn!("🧾️ Order {oid} stopped advancing at {}", order.checkout_state);
                    break;
                },
                Err(e) => return Err(e.into()),
            }
        }
        Ok(order)
    }

    async fn apply_overpayment_policy(
        &self,
        order: Order,
        payment: Payment,
    ) -> Result<ReconciliationResult, ReconciliationError> {
        match self.config.overpayment_policy {
            OverpaymentPolicy::AcceptAndFlag => {
                info!("🧾️ Accepting overpayment on payment {} for refund follow-up", payment.id);
                let result = self.complete_payment(order, payment).await?;
                if let ReconciliationResult::Completed { payment, .. } = &result {
                    self.flag_payment(payment, "overpayment accepted; refund the difference").await;
                }
                Ok(result)
            },
            OverpaymentPolicy::Reject => Ok(self.fail_payment(payment, FailureReason::Overpayment).await?),
        }
    }

    /// Mark the payment failed. Idempotent when the payment has already failed; a voided payment
    /// is left untouched.
    async fn fail_payment(
        &self,
        payment: Payment,
        reason: FailureReason,
    ) -> Result<ReconciliationResult, PaymentGatewayError> {
        let payment = match payment.state {
            PaymentState::Checkout | PaymentState::Processing => {
                self.db.update_payment_state(payment.id, PaymentState::Failed).await?
            },
            _ => payment,
        };
        Ok(ReconciliationResult::Failed { payment, reason })
    }

    async fn record_response_code(
        &self,
        payment: Payment,
        callback: &GatewayCallback,
    ) -> Result<Payment, PaymentGatewayError> {
        match callback.transaction_id.as_deref() {
            Some(txid) => self.db.set_response_code(payment.id, txid).await,
            None => Ok(payment),
        }
    }

    /// Find the payment a callback refers to: by gateway transaction id when we have seen it
    /// before, otherwise the most recent payment for the order.
    async fn locate_payment(
        &self,
        order: &Order,
        callback: &GatewayCallback,
    ) -> Result<Payment, ReconciliationError> {
        if let Some(txid) = callback.transaction_id.as_deref() {
            if let Some(payment) = self.db.fetch_payment_by_response_code(txid).await? {
                return Ok(payment);
            }
        }
        self.db
            .fetch_latest_payment_for_order(&order.order_id)
            .await?
            .ok_or_else(|| ReconciliationError::NoPaymentForOrder(order.order_id.clone()))
    }

    /// Create (or reuse) the order and payment for a checkout, and build the signed
    /// hosted-payment-page request for it. The customer's phone number is normalized and stored
    /// as the payment source.
    pub async fn initiate_payment(
        &self,
        new_order: NewOrder,
        phone: &str,
    ) -> Result<(Order, Payment, SignedRequest), ReconciliationError> {
        let phone = normalize_phone(phone)?;
        let (order, created) = self.db.insert_order(new_order).await?;
        if created {
            debug!("💳️ Created order {} for initiation", order.order_id);
        }
        if order.is_paid() {
            return Err(PaymentGatewayError::OrderAlreadyPaid(order.order_id).into());
        }
        let payment = match self.db.fetch_latest_payment_for_order(&order.order_id).await? {
            Some(p) if !p.state.is_terminal() => p,
            _ => self.db.insert_payment(NewPayment::new(order.order_id.clone(), order.total_price)).await?,
        };
        self.db.upsert_payment_source(payment.id, &phone).await?;
        let request = build_initiation(&order, &phone, &self.config.ipay)?;
        debug!("💳️ Initiation request built for order {} (payment {})", order.order_id, payment.id);
        Ok((order, payment, request))
    }

    /// Void a payment that has not reached a terminal state. The gateway-side cancellation call
    /// is the caller's responsibility; this only records the merchant's intent.
    pub async fn cancel_payment(&self, payment_id: i64) -> Result<Payment, ReconciliationError> {
        let lock = self.payment_lock(payment_id).await;
        let _guard = lock.lock().await;
        let payment = self.db.update_payment_state(payment_id, PaymentState::Void).await?;
        info!("💳️ Payment {payment_id} voided");
        Ok(payment)
    }

    pub async fn fetch_payment(&self, payment_id: i64) -> Result<Option<Payment>, ReconciliationError> {
        Ok(self.db.fetch_payment(payment_id).await?)
    }

    pub async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, ReconciliationError> {
        Ok(self.db.fetch_order_by_order_id(order_id).await?)
    }

    /// Committed order and payment state for a status poll. Never blocks on an in-flight
    /// reconciliation beyond the backend's own transaction.
    pub async fn poll_status(&self, order_id: &OrderId) -> Result<StatusPollResult, ReconciliationError> {
        let order = self
            .db
            .fetch_order_by_order_id(order_id)
            .await?
            .ok_or_else(|| PaymentGatewayError::OrderNotFound(order_id.clone()))?;
        let payment = self.db.fetch_latest_payment_for_order(&order.order_id).await?;
        Ok(StatusPollResult { order, payment })
    }

    async fn call_order_paid_hook(&self, order: &Order) {
        for producer in &self.producers.order_paid_producer {
            producer.publish_event(OrderPaidEvent::new(order.clone())).await;
        }
    }

    async fn flag_payment(&self, payment: &Payment, reason: impl Into<String>) {
        let event = PaymentFlaggedEvent::new(payment.clone(), reason);
        for producer in &self.producers.payment_flagged_producer {
            producer.publish_event(event.clone()).await;
        }
    }
}
