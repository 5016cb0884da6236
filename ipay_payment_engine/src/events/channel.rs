//! Stateless pub-sub event plumbing.
//!
//! Components subscribe to reconciliation events and react to them without any access to engine
//! internals; a handler receives the event value and nothing else. Handlers run as spawned tasks,
//! so a slow webhook or mail hook never blocks callback processing.

use std::{future::Future, pin::Pin, sync::Arc};

use log::*;
use tokio::{sync::mpsc, task::JoinSet};

pub type Handler<E> = Arc<dyn Fn(E) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

pub struct EventHandler<E: Send + Sync + 'static> {
    listener: mpsc::Receiver<E>,
    sender: mpsc::Sender<E>,
    handler: Handler<E>,
}

impl<E: Send + Sync + 'static> EventHandler<E> {
    pub fn new(buffer_size: usize, handler: Handler<E>) -> Self {
        let (sender, listener) = mpsc::channel(buffer_size);
        Self { listener, sender, handler }
    }

    pub fn subscribe(&self) -> EventProducer<E> {
        EventProducer::new(self.sender.clone())
    }

    /// Run the dispatch loop until every producer has been dropped, then wait for in-flight
    /// handler tasks to finish.
    pub async fn start_handler(mut self) {
        debug!("🔔 Starting event handler");
        // Drop the internal sender so the loop ends once the last subscriber goes away.
        drop(self.sender);
        let mut tasks = JoinSet::new();
        while let Some(event) = self.listener.recv().await {
            trace!("🔔 Dispatching event");
            let handler = Arc::clone(&self.handler);
            tasks.spawn(async move {
                (handler)(event).await;
            });
        }
        while let Some(result) = tasks.join_next().await {
            if let Err(e) = result {
                warn!("🔔 Event handler task panicked: {e}");
            }
        }
        debug!("🔔 Event handler has shut down");
    }
}

#[derive(Clone)]
pub struct EventProducer<E: Send + Sync> {
    sender: mpsc::Sender<E>,
}

impl<E: Send + Sync> EventProducer<E> {
    pub fn new(sender: mpsc::Sender<E>) -> Self {
        Self { sender }
    }

    pub async fn publish_event(&self, event: E) {
        if let Err(e) = self.sender.send(event).await {
            error!("🔔 Failed to publish event: {e}");
        }
    }
}
