//! Fan-out trade publisher
//!
//! Producers call [`TradePublisher::publish_trade`] from their own task; the
//! trade is handed synchronously to every subscriber registered at call time.
//! The subscriber list is copy-on-write: subscribe/unsubscribe swap in a new
//! list, and a publish in flight keeps iterating the list it started with.

use crate::exchanges::{MetricsError, MetricsResult, Trade};
use parking_lot::RwLock;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::warn;

/// Consumer of published trades
pub trait TradeSubscriber: Send + Sync {
    fn on_trade(&self, trade: &Trade) -> MetricsResult<()>;

    fn name(&self) -> &str {
        "subscriber"
    }
}

/// Handle returned by `subscribe`, used to unsubscribe later
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

/// One subscriber that failed to take a trade
#[derive(Debug)]
pub struct DeliveryFailure {
    pub subscriber: SubscriberId,
    pub error: MetricsError,
}

/// Outcome of a single publish
#[derive(Debug, Default)]
pub struct PublishReport {
    pub delivered: usize,
    pub failures: Vec<DeliveryFailure>,
}

impl PublishReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

type SubscriberList = Arc<Vec<(SubscriberId, Arc<dyn TradeSubscriber>)>>;

pub struct TradePublisher {
    subscribers: RwLock<SubscriberList>,
    next_id: AtomicU64,
}

impl TradePublisher {
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(Arc::new(Vec::new())),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a subscriber; it receives every trade published after this returns
    pub fn subscribe(&self, subscriber: Arc<dyn TradeSubscriber>) -> SubscriberId {
        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut guard = self.subscribers.write();
        let mut next = Vec::with_capacity(guard.len() + 1);
        next.extend(guard.iter().cloned());
        next.push((id, subscriber));
        *guard = Arc::new(next);
        id
    }

    /// Remove a subscriber. Publishes that start after this returns will not
    /// reach it; one already iterating may still deliver its current trade.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let mut guard = self.subscribers.write();
        if !guard.iter().any(|(existing, _)| *existing == id) {
            return false;
        }
        let next: Vec<_> = guard.iter().filter(|(existing, _)| *existing != id).cloned().collect();
        *guard = Arc::new(next);
        true
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Deliver `trade` to every current subscriber in subscription order.
    ///
    /// A subscriber that returns an error or panics is recorded in the report
    /// and delivery carries on with the rest.
    pub fn publish_trade(&self, trade: &Trade) -> PublishReport {
        let subscribers = self.subscribers.read().clone();
        let mut report = PublishReport::default();

        for (id, subscriber) in subscribers.iter() {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| subscriber.on_trade(trade)));
            let error = match outcome {
                Ok(Ok(())) => {
                    report.delivered += 1;
                    continue;
                }
                Ok(Err(e)) => e,
                Err(payload) => MetricsError::SubscriberPanic {
                    subscriber: subscriber.name().to_string(),
                    message: panic_message(payload.as_ref()),
                },
            };

            warn!(
                subscriber = subscriber.name(),
                trade_id = %trade.id(),
                error = %error,
                "Trade delivery failed"
            );
            report.failures.push(DeliveryFailure {
                subscriber: *id,
                error,
            });
        }

        report
    }
}

impl Default for TradePublisher {
    fn default() -> Self {
        Self::new()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
