//! Request handler definitions
//!
//! Define each route and its handler here. Handlers that are more than a line or two MUST go
//! into a separate module. Keep this module neat and tidy 🙏
//!
//! Handlers are async and must never block the worker thread; anything slow (database calls,
//! gateway requests) is awaited.

use std::collections::HashMap;

use actix_web::{get, web, HttpResponse, Responder};
use ipay_payment_engine::{
    db_types::OrderId,
    ipay::GatewayCallback,
    traits::PaymentGatewayDatabase,
    ReconciliationApi,
};
use log::*;

use crate::{
    config::ServerConfig,
    data_objects::{
        callback_http_status,
        CallbackResponse,
        CancelResponse,
        InitiateRequest,
        InitiateResponse,
        StatusQueryParams,
        StatusResponse,
    },
    errors::ServerError,
    helpers::guest_credentials_match,
    integrations::{IpayClient, IpayClientError},
};

// Actix-web cannot handle generics in handlers, so routes are implemented manually using the
// `route!` macro.
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------  Callback  ----------------------------------------------------
route!(ipay_callback => Post "/ipay/callback" impl PaymentGatewayDatabase);
/// Route handler for gateway outcome callbacks delivered as a form POST.
///
/// The callback is authenticated against the merchant's shared secret before anything else
/// happens; an invalid or missing signature is a 401 and the payload is never acted on. Verified
/// callbacks are handed to the reconciliation engine, and its outcome decides both the response
/// body and the HTTP status.
pub async fn ipay_callback<B: PaymentGatewayDatabase>(
    form: web::Form<HashMap<String, String>>,
    api: web::Data<ReconciliationApi<B>>,
    config: web::Data<ServerConfig>,
) -> Result<HttpResponse, ServerError> {
    handle_callback(form.into_inner(), api.get_ref(), config.get_ref()).await
}

route!(ipay_callback_redirect => Get "/ipay/callback" impl PaymentGatewayDatabase);
/// Same as [`ipay_callback`], for gateway configurations that deliver the callback as a browser
/// redirect with query parameters.
pub async fn ipay_callback_redirect<B: PaymentGatewayDatabase>(
    query: web::Query<HashMap<String, String>>,
    api: web::Data<ReconciliationApi<B>>,
    config: web::Data<ServerConfig>,
) -> Result<HttpResponse, ServerError> {
    handle_callback(query.into_inner(), api.get_ref(), config.get_ref()).await
}

async fn handle_callback<B: PaymentGatewayDatabase>(
    fields: HashMap<String, String>,
    api: &ReconciliationApi<B>,
    config: &ServerConfig,
) -> Result<HttpResponse, ServerError> {
    let callback = GatewayCallback::try_from_fields(fields).map_err(|e| {
        debug!("💻️ Malformed callback payload. {e}");
        ServerError::InvalidRequestBody(e.to_string())
    })?;
    if config.skip_signature_check && !config.ipay.live_mode {
        warn!("🚨️ Accepting callback without signature verification (sandbox opt-in): {callback}");
    } else if !callback.verify(config.ipay.hash_key.reveal()) {
        warn!("💻️ Rejected callback with a missing or invalid signature: {callback}");
        return Err(ServerError::InvalidSignature);
    }
    debug!("💻️ Verified callback received: {callback}");
    let result = api.reconcile(&callback).await?;
    let status = callback_http_status(&result);
    Ok(HttpResponse::build(status).json(CallbackResponse::from(&result)))
}

//----------------------------------------------   Status  ----------------------------------------------------
route!(order_status => Get "/ipay/status/{order_id}" impl PaymentGatewayDatabase);
/// Route handler for guest status polls from the storefront's order page.
///
/// The caller must present the order's guest access token *and* the order email as query
/// parameters; both are checked in constant time. Reads committed state only.
pub async fn order_status<B: PaymentGatewayDatabase>(
    path: web::Path<String>,
    query: web::Query<StatusQueryParams>,
    api: web::Data<ReconciliationApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = OrderId::from(path.into_inner());
    trace!("💻️ Status poll for order {order_id}");
    let poll = api.poll_status(&order_id).await?;
    if !guest_credentials_match(&poll.order, &query.token, &query.email) {
        debug!("💻️ Status poll for order {order_id} rejected: credentials do not match");
        return Err(ServerError::InvalidCredentials);
    }
    Ok(HttpResponse::Ok().json(StatusResponse::from(&poll)))
}

//----------------------------------------------  Initiate  ----------------------------------------------------
route!(initiate_payment => Post "/ipay/initiate" impl PaymentGatewayDatabase);
/// Route handler for starting a payment.
///
/// Creates (or reuses) the order and an open payment for it, and returns the signed field set
/// the storefront posts to the gateway's hosted payment page. Idempotent per order.
pub async fn initiate_payment<B: PaymentGatewayDatabase>(
    body: web::Json<InitiateRequest>,
    api: web::Data<ReconciliationApi<B>>,
    config: web::Data<ServerConfig>,
) -> Result<HttpResponse, ServerError> {
    let new_order = body.to_new_order()?;
    let (order, payment, request) = api.initiate_payment(new_order, &body.phone).await?;
    debug!("💻️ Initiation prepared for order {} (payment {})", order.order_id, payment.id);
    let response = InitiateResponse::new(&request, &payment, &config.ipay.payment_endpoint, &config.ipay.return_url);
    Ok(HttpResponse::Ok().json(response))
}

//----------------------------------------------   Cancel  ----------------------------------------------------
route!(cancel_payment => Post "/ipay/cancel/{payment_id}" impl PaymentGatewayDatabase);
/// Route handler for voiding a payment before settlement.
///
/// If the gateway has already assigned the payment a transaction id, the cancellation is relayed
/// there first; a network failure aborts the whole operation with a 503 and no local state
/// change, because the gateway-side outcome is inconclusive and the caller should retry.
pub async fn cancel_payment<B: PaymentGatewayDatabase>(
    path: web::Path<i64>,
    api: web::Data<ReconciliationApi<B>>,
    client: web::Data<IpayClient>,
) -> Result<HttpResponse, ServerError> {
    let payment_id = path.into_inner();
    let payment = api
        .fetch_payment(payment_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Payment {payment_id}")))?;
    let gateway_notified = match payment.response_code.as_deref() {
        Some(txid) => {
            client.cancel(txid).await.map_err(|e| match e {
                IpayClientError::Network(msg) => {
                    warn!("💻️ Could not relay cancellation of payment {payment_id}: {msg}");
                    ServerError::DownstreamUnavailable(msg)
                },
                other => ServerError::BackendError(other.to_string()),
            })?;
            true
        },
        // the gateway never saw this payment, so there is nothing to relay
        None => false,
    };
    let payment = api.cancel_payment(payment_id).await?;
    info!("💻️ Payment {payment_id} cancelled (gateway notified: {gateway_notified})");
    Ok(HttpResponse::Ok().json(CancelResponse::new(&payment, gateway_notified)))
}
