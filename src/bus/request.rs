//! Question/response over the event bus.
//!
//! A [`RequestBroker`] keeps a map of pending questions keyed by correlation
//! id. `ask` registers the pending entry, publishes the QUESTION and waits for
//! the RESPONSE carrying the same correlation id, bounded by a mandatory
//! timeout. Responders are installed with [`serve_questions`], or with
//! [`serve_run_questions`] when several runs share one bus.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::oneshot;
use uuid::Uuid;

use super::{CorrelationId, EventBus, MessagePayload, OrchestrationMessage, Subscription};
use crate::errors::RequestError;

type PendingMap = HashMap<CorrelationId, oneshot::Sender<String>>;

fn lock(pending: &Mutex<PendingMap>) -> MutexGuard<'_, PendingMap> {
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Routes RESPONSE messages back to the `ask` call waiting for them.
///
/// The broker unsubscribes from the bus when dropped; any question still
/// pending at that point resolves with [`RequestError::Closed`].
pub struct RequestBroker {
    bus: EventBus,
    pending: Arc<Mutex<PendingMap>>,
    subscription: Subscription,
    run_id: Option<Uuid>,
}

impl RequestBroker {
    /// Subscribe a new broker to `bus`.
    pub fn attach(bus: &EventBus) -> Self {
        let pending: Arc<Mutex<PendingMap>> = Arc::new(Mutex::new(HashMap::new()));
        let routes = Arc::clone(&pending);

        let subscription = bus.subscribe(move |msg| {
            if let MessagePayload::Response { answer } = &msg.payload
                && let Some(tx) = lock(&routes).remove(&msg.correlation_id)
            {
                // The asker may already have timed out; nothing to do then.
                let _ = tx.send(answer.clone());
            }
            Ok(())
        });

        Self {
            bus: bus.clone(),
            pending,
            subscription,
            run_id: None,
        }
    }

    /// Stamp every question with `run_id`, so only that run's responders
    /// answer it.
    pub fn scoped_to(mut self, run_id: Uuid) -> Self {
        self.run_id = Some(run_id);
        self
    }

    /// Publish a QUESTION from `worker_id` and wait for its RESPONSE.
    pub async fn ask(
        &self,
        worker_id: &str,
        topic: &str,
        body: &str,
        timeout: Duration,
    ) -> Result<String, RequestError> {
        let correlation_id = self.bus.next_correlation_id(worker_id);
        let (tx, rx) = oneshot::channel();

        // Register before publishing: responders answer synchronously inside
        // `publish`.
        lock(&self.pending).insert(correlation_id.clone(), tx);

        self.bus.publish(OrchestrationMessage::new(
            worker_id,
            correlation_id.clone(),
            MessagePayload::Question {
                topic: topic.to_string(),
                body: body.to_string(),
            },
        )
        .in_run(self.run_id));

        let outcome = tokio::time::timeout(timeout, rx).await;
        lock(&self.pending).remove(&correlation_id);

        match outcome {
            Ok(Ok(answer)) => Ok(answer),
            Ok(Err(_)) => Err(RequestError::Closed { correlation_id }),
            Err(_) => {
                tracing::debug!(%correlation_id, topic, "question timed out");
                Err(RequestError::TimedOut {
                    correlation_id,
                    timeout,
                })
            }
        }
    }

    /// Number of questions still waiting for a response.
    pub fn pending_count(&self) -> usize {
        lock(&self.pending).len()
    }
}

impl Drop for RequestBroker {
    fn drop(&mut self) {
        self.subscription.unsubscribe();
        lock(&self.pending).clear();
    }
}

/// Answer QUESTION messages on `bus` with `handler`.
///
/// For each question, `handler(topic, body)` returning `Some(answer)`
/// publishes a RESPONSE from `responder_id` with the question's correlation
/// id; `None` leaves the question to other responders. The responder holds
/// only a weak reference to the bus.
pub fn serve_questions<F>(bus: &EventBus, responder_id: &str, handler: F) -> Subscription
where
    F: Fn(&str, &str) -> Option<String> + Send + Sync + 'static,
{
    serve_run_questions(bus, responder_id, None, handler)
}

/// Like [`serve_questions`], but only answers questions asked within
/// `run_id`. Responses carry the question's run id.
pub fn serve_run_questions<F>(
    bus: &EventBus,
    responder_id: &str,
    run_id: Option<Uuid>,
    handler: F,
) -> Subscription
where
    F: Fn(&str, &str) -> Option<String> + Send + Sync + 'static,
{
    let weak = bus.downgrade();
    let responder_id = responder_id.to_string();

    bus.subscribe(move |msg| {
        let MessagePayload::Question { topic, body } = &msg.payload else {
            return Ok(());
        };
        if !msg.belongs_to(run_id) {
            return Ok(());
        }
        if let Some(answer) = handler(topic, body)
            && let Some(bus) = weak.upgrade()
        {
            bus.publish(
                OrchestrationMessage::new(
                    responder_id.as_str(),
                    msg.correlation_id.clone(),
                    MessagePayload::Response { answer },
                )
                .in_run(msg.run_id),
            );
        }
        Ok(())
    })
}
