//! Synchronous in-memory publish/subscribe bus for orchestration messages.
//!
//! One bus is created per audit session and handed explicitly to the
//! coordinator, every worker reporter and any observers. There is no queue:
//! `publish` calls each subscriber in subscription order before returning.
//!
//! ## Example
//!
//! ```
//! use pageaudit::bus::{CorrelationId, EventBus, MessagePayload, OrchestrationMessage};
//! use std::sync::{Arc, Mutex};
//!
//! let bus = EventBus::new();
//! let seen = Arc::new(Mutex::new(Vec::new()));
//!
//! let sink = Arc::clone(&seen);
//! let subscription = bus.subscribe(move |msg| {
//!     sink.lock().unwrap().push(msg.progress());
//!     Ok(())
//! });
//!
//! bus.publish(OrchestrationMessage::new(
//!     "seo",
//!     CorrelationId::from("seo-1"),
//!     MessagePayload::ProgressUpdate { progress: 30, message: String::new() },
//! ));
//!
//! subscription.unsubscribe();
//! assert_eq!(*seen.lock().unwrap(), vec![Some(30)]);
//! ```

pub mod message;
pub mod request;

pub use message::{COORDINATOR_ID, CorrelationId, MessageKind, MessagePayload, OrchestrationMessage};
pub use request::{RequestBroker, serve_questions, serve_run_questions};

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::util::panic_message;

type Callback = Arc<dyn Fn(&OrchestrationMessage) -> anyhow::Result<()> + Send + Sync>;

struct Subscriber {
    id: u64,
    callback: Callback,
}

#[derive(Default)]
struct BusInner {
    subscribers: Mutex<Vec<Subscriber>>,
    next_subscriber: AtomicU64,
    next_correlation: AtomicU64,
}

impl BusInner {
    fn subscribers(&self) -> MutexGuard<'_, Vec<Subscriber>> {
        // Callbacks never run under this lock, so a poisoned guard still
        // holds a consistent list.
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn remove(&self, id: u64) -> bool {
        let mut subscribers = self.subscribers();
        let before = subscribers.len();
        subscribers.retain(|s| s.id != id);
        subscribers.len() != before
    }
}

/// Handle to a shared event bus. Cloning is cheap and clones share subscribers.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

impl EventBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback and return the capability that removes it.
    ///
    /// A callback returning `Err` or panicking is logged and skipped; it never
    /// prevents delivery to the remaining subscribers.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&OrchestrationMessage) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let id = self.inner.next_subscriber.fetch_add(1, Ordering::Relaxed);
        self.inner.subscribers().push(Subscriber {
            id,
            callback: Arc::new(callback),
        });
        Subscription {
            id,
            bus: Arc::downgrade(&self.inner),
        }
    }

    /// Deliver a message to every current subscriber, in subscription order.
    ///
    /// Returns the number of subscribers that handled the message without
    /// error. The subscriber list is snapshotted first, so callbacks may
    /// subscribe, unsubscribe, clear or publish re-entrantly.
    pub fn publish(&self, message: OrchestrationMessage) -> usize {
        let snapshot: Vec<(u64, Callback)> = self
            .inner
            .subscribers()
            .iter()
            .map(|s| (s.id, Arc::clone(&s.callback)))
            .collect();

        let mut delivered = 0;
        for (id, callback) in snapshot {
            match catch_unwind(AssertUnwindSafe(|| callback(&message))) {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(e)) => {
                    tracing::warn!(
                        subscriber = id,
                        kind = %message.kind(),
                        worker = %message.worker_id,
                        "subscriber failed: {:#}",
                        e
                    );
                }
                Err(payload) => {
                    tracing::warn!(
                        subscriber = id,
                        kind = %message.kind(),
                        worker = %message.worker_id,
                        "subscriber panicked: {}",
                        panic_message(payload.as_ref())
                    );
                }
            }
        }
        delivered
    }

    /// Remove every subscriber. Call at the end of a session.
    pub fn clear(&self) {
        self.inner.subscribers().clear();
    }

    /// Number of currently registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers().len()
    }

    /// Next correlation id for a message published on behalf of `worker_id`.
    pub fn next_correlation_id(&self, worker_id: &str) -> CorrelationId {
        let sequence = self.inner.next_correlation.fetch_add(1, Ordering::Relaxed);
        CorrelationId::generate(worker_id, sequence)
    }

    /// Non-owning handle, for subscribers that need to publish back into the
    /// bus without keeping it alive.
    pub fn downgrade(&self) -> WeakEventBus {
        WeakEventBus {
            inner: Arc::downgrade(&self.inner),
        }
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Weak counterpart of [`EventBus`].
#[derive(Clone)]
pub struct WeakEventBus {
    inner: Weak<BusInner>,
}

impl WeakEventBus {
    pub fn upgrade(&self) -> Option<EventBus> {
        self.inner.upgrade().map(|inner| EventBus { inner })
    }
}

/// Capability returned by [`EventBus::subscribe`].
///
/// Dropping it does not unsubscribe; call [`Subscription::unsubscribe`].
pub struct Subscription {
    id: u64,
    bus: Weak<BusInner>,
}

impl Subscription {
    /// Remove the callback. Returns `false` if it was already removed
    /// (by an earlier call or by [`EventBus::clear`]) or the bus is gone.
    pub fn unsubscribe(&self) -> bool {
        self.bus.upgrade().is_some_and(|bus| bus.remove(self.id))
    }

    /// Whether the callback is still registered.
    pub fn is_active(&self) -> bool {
        self.bus
            .upgrade()
            .is_some_and(|bus| bus.subscribers().iter().any(|s| s.id == self.id))
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
