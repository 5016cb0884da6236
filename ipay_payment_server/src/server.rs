use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use ipay_payment_engine::{
    events::{EventHandlers, EventHooks, EventProducers},
    ReconciliationApi,
    SqliteDatabase,
};
use log::*;

use crate::{
    config::ServerConfig,
    errors::ServerError,
    integrations::IpayClient,
    routes::{
        health,
        CancelPaymentRoute,
        InitiatePaymentRoute,
        IpayCallbackRedirectRoute,
        IpayCallbackRoute,
        OrderStatusRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let handlers = EventHandlers::new(128, default_hooks());
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let srv = create_server_instance(config, db, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

/// The stock event hooks just log. Deployments that want to push settlement notifications
/// somewhere (fulfilment, chat ops) replace these with their own [`EventHooks`].
fn default_hooks() -> EventHooks {
    let mut hooks = EventHooks::default();
    hooks.on_order_paid(|event| {
        Box::pin(async move {
            info!("🔔 Order {} has been paid in full", event.order.order_id);
        })
    });
    hooks.on_payment_flagged(|event| {
        Box::pin(async move {
            warn!("🔔 Payment {} flagged for review: {}", event.payment.id, event.reason);
        })
    });
    hooks
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let client = IpayClient::new(config.ipay.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let host = config.host.clone();
    let port = config.port;
    // One api for all workers. Its per-payment lock map only serializes callbacks that go
    // through the same instance, so it must be built outside the factory closure.
    let api = ReconciliationApi::new(db, config.reconciliation_config(), producers);
    let srv = HttpServer::new(move || {
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("ipg::access_log"))
            .app_data(web::Data::new(api.clone()))
            .app_data(web::Data::new(client.clone()))
            .app_data(web::Data::new(config.clone()))
            .service(health)
            .service(IpayCallbackRoute::<SqliteDatabase>::new())
            .service(IpayCallbackRedirectRoute::<SqliteDatabase>::new())
            .service(OrderStatusRoute::<SqliteDatabase>::new())
            .service(InitiatePaymentRoute::<SqliteDatabase>::new())
            .service(CancelPaymentRoute::<SqliteDatabase>::new())
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    Ok(srv)
}
