//! In-process event bus with wildcard topic routing.
//!
//! Every distinct topic gets its own dispatch worker fed by an unbounded
//! queue, so messages on one topic are delivered in publish order while
//! different topics are dispatched concurrently. A message is handed to
//! every matching subscription, in registration order, before the next
//! message on the same topic is looked at.
//!
//! Publishing never blocks: it enqueues and returns. Workers retired by a
//! disconnect finish their queues before a reconnect starts new ones.

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};

use tokio::runtime::Handle;
use tokio::sync::{Notify, mpsc};
use tokio::task::JoinHandle;

use homebus_domain::endpoint::{Endpoint, Scheme};
use homebus_domain::error::{ConnectionError, DecodeError, HubError};
use homebus_domain::message::{Message, Origin};
use homebus_domain::payload::Payload;
use homebus_domain::time::{Timestamp, now};
use homebus_domain::topic::{Topic, TopicPattern};

use crate::ports::EventPublisher;

/// Callback invoked for every message matching a subscription.
pub type Handler = Arc<dyn Fn(&Message) + Send + Sync>;

/// Identifies one subscription, returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sub#{}", self.0)
    }
}

/// An established connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub endpoint: Endpoint,
    pub connected_at: Timestamp,
}

enum State {
    Disconnected,
    Connected {
        connection: Connection,
        runtime: Handle,
    },
}

struct Subscription {
    id: SubscriptionId,
    pattern: TopicPattern,
    handler: Handler,
}

struct Worker {
    queue: mpsc::UnboundedSender<Arc<Message>>,
    task: JoinHandle<()>,
}

struct Inner {
    state: Mutex<State>,
    subscriptions: RwLock<Vec<Subscription>>,
    workers: Mutex<HashMap<Topic, Worker>>,
    retired: Mutex<Vec<JoinHandle<()>>>,
    next_id: AtomicU64,
    pending: AtomicUsize,
    idle: Notify,
}

/// Topic-based publish/subscribe bus, cheap to clone.
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<Inner>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    /// Create a disconnected bus.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State::Disconnected),
                subscriptions: RwLock::new(Vec::new()),
                workers: Mutex::new(HashMap::new()),
                retired: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(1),
                pending: AtomicUsize::new(0),
                idle: Notify::new(),
            }),
        }
    }

    /// Connect to `endpoint`.
    ///
    /// Only in-process (`memory://`) endpoints are served by this bus;
    /// remote brokers are reached through a bridge adapter. Connecting again
    /// to the same endpoint returns the existing connection. After a
    /// disconnect, waits for the previous workers to drain so per-topic order
    /// holds across the reconnect.
    ///
    /// Must be called from within a tokio runtime; dispatch workers are
    /// spawned on it.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::UnsupportedScheme`] for non-memory
    /// endpoints and [`ConnectionError::AlreadyConnected`] when connected
    /// elsewhere. The bus stays as it was on error.
    pub async fn connect(&self, endpoint: &Endpoint) -> Result<Connection, ConnectionError> {
        if endpoint.scheme() != Scheme::Memory {
            return Err(ConnectionError::UnsupportedScheme(
                endpoint.scheme().as_str().to_string(),
            ));
        }
        self.inner.drain_retired().await;
        let mut state = self.inner.lock_state();
        if let State::Connected { connection, .. } = &*state {
            if &connection.endpoint == endpoint {
                return Ok(connection.clone());
            }
            return Err(ConnectionError::AlreadyConnected {
                current: connection.endpoint.to_string(),
            });
        }
        let connection = Connection {
            endpoint: endpoint.clone(),
            connected_at: now(),
        };
        *state = State::Connected {
            connection: connection.clone(),
            runtime: Handle::current(),
        };
        tracing::info!(%endpoint, "event bus connected");
        Ok(connection)
    }

    /// Return to the disconnected state.
    ///
    /// Messages already queued are still delivered. Idempotent.
    pub fn disconnect(&self) {
        let mut state = self.inner.lock_state();
        if let State::Connected { connection, .. } = &*state {
            tracing::info!(endpoint = %connection.endpoint, "event bus disconnected");
        }
        *state = State::Disconnected;
        drop(state);
        // Dropping the senders lets each worker drain its queue and exit.
        let workers: Vec<Worker> = self
            .inner
            .workers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain()
            .map(|(_, worker)| worker)
            .collect();
        self.inner
            .retired
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(workers.into_iter().map(|worker| worker.task));
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        matches!(*self.inner.lock_state(), State::Connected { .. })
    }

    /// The current connection, if any.
    #[must_use]
    pub fn connection(&self) -> Option<Connection> {
        match &*self.inner.lock_state() {
            State::Connected { connection, .. } => Some(connection.clone()),
            State::Disconnected => None,
        }
    }

    /// Publish raw bytes on `topic`.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::NotConnected`] unless connected.
    pub fn publish(
        &self,
        topic: impl Into<Topic>,
        payload: impl Into<Vec<u8>>,
    ) -> Result<(), ConnectionError> {
        self.dispatch(Message::new(topic, payload))
    }

    /// Publish bytes received from a remote broker.
    ///
    /// The message is marked [`Origin::Remote`] so bridges do not forward
    /// it back.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::NotConnected`] unless connected.
    pub fn inject(
        &self,
        topic: impl Into<Topic>,
        payload: impl Into<Vec<u8>>,
    ) -> Result<(), ConnectionError> {
        self.dispatch(Message::new(topic, payload).with_origin(Origin::Remote))
    }

    /// Encode `payload` and publish it on its fixed topic.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Connection`] unless connected.
    pub fn publish_payload(&self, payload: &Payload) -> Result<(), HubError> {
        let body = payload.encode().map_err(DecodeError::from)?;
        self.publish(payload.topic(), body)?;
        Ok(())
    }

    /// Register `handler` for every topic matching `pattern`.
    pub fn subscribe<F>(&self, pattern: impl Into<TopicPattern>, handler: F) -> SubscriptionId
    where
        F: Fn(&Message) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let pattern = pattern.into();
        tracing::debug!(%id, %pattern, "subscription added");
        self.inner
            .subscriptions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Subscription {
                id,
                pattern,
                handler: Arc::new(handler),
            });
        id
    }

    /// Remove exactly one subscription.
    ///
    /// Returns `false` if it was already removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscriptions = self
            .inner
            .subscriptions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = subscriptions.len();
        subscriptions.retain(|s| s.id != id);
        let removed = subscriptions.len() != before;
        if removed {
            tracing::debug!(%id, "subscription removed");
        }
        removed
    }

    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.inner
            .subscriptions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Wait until every queued message has been delivered, including
    /// messages published by handlers while this call waits.
    pub async fn flush(&self) {
        loop {
            let mut notified = std::pin::pin!(self.inner.idle.notified());
            notified.as_mut().enable();
            if self.inner.pending.load(Ordering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }

    fn dispatch(&self, message: Message) -> Result<(), ConnectionError> {
        let runtime = match &*self.inner.lock_state() {
            State::Connected { runtime, .. } => runtime.clone(),
            State::Disconnected => return Err(ConnectionError::NotConnected),
        };
        let message = Arc::new(message);
        self.inner.pending.fetch_add(1, Ordering::SeqCst);

        let mut workers = self
            .inner
            .workers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let message = match workers.get(message.topic()) {
            Some(worker) => match worker.queue.send(message) {
                Ok(()) => return Ok(()),
                Err(mpsc::error::SendError(message)) => message,
            },
            None => message,
        };

        let (queue, rx) = mpsc::unbounded_channel();
        let topic = message.topic().clone();
        tracing::trace!(%topic, "starting dispatch worker");
        // The receiver is alive: the send cannot fail.
        let _ = queue.send(message);
        let task = runtime.spawn(run_worker(Arc::downgrade(&self.inner), rx));
        workers.insert(topic, Worker { queue, task });
        Ok(())
    }
}

impl Inner {
    fn lock_state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn drain_retired(&self) {
        let retired = std::mem::take(
            &mut *self.retired.lock().unwrap_or_else(PoisonError::into_inner),
        );
        for task in retired {
            if let Err(err) = task.await {
                tracing::warn!(%err, "dispatch worker ended abnormally");
            }
        }
    }

    fn deliver(&self, message: &Message) {
        let handlers: Vec<Handler> = self
            .subscriptions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|s| s.pattern.matches(message.topic().as_str()))
            .map(|s| Arc::clone(&s.handler))
            .collect();

        for handler in handlers {
            if catch_unwind(AssertUnwindSafe(|| handler(message))).is_err() {
                tracing::error!(topic = %message.topic(), "subscriber panicked while handling message");
            }
        }
    }

    fn complete(&self) {
        if self.pending.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.idle.notify_waiters();
        }
    }
}

async fn run_worker(inner: Weak<Inner>, mut rx: mpsc::UnboundedReceiver<Arc<Message>>) {
    while let Some(message) = rx.recv().await {
        let Some(inner) = inner.upgrade() else {
            break;
        };
        inner.deliver(&message);
        inner.complete();
    }
}

impl EventPublisher for EventBus {
    fn publish(&self, payload: &Payload) -> Result<(), HubError> {
        self.publish_payload(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use homebus_domain::payload::LightPayload;
    use homebus_domain::topic::topics;

    type Received = Arc<Mutex<Vec<(String, Vec<u8>)>>>;

    async fn connected_bus() -> EventBus {
        let bus = EventBus::new();
        bus.connect(&Endpoint::memory("test")).await.unwrap();
        bus
    }

    fn recorder(bus: &EventBus, pattern: &str) -> (SubscriptionId, Received) {
        let received: Received = Arc::default();
        let sink = Arc::clone(&received);
        let id = bus.subscribe(pattern, move |message: &Message| {
            sink.lock()
                .unwrap()
                .push((message.topic().to_string(), message.payload().to_vec()));
        });
        (id, received)
    }

    #[tokio::test]
    async fn should_deliver_identical_bytes_exactly_once() {
        let bus = connected_bus().await;
        let (_, received) = recorder(&bus, "home/light");

        bus.publish("home/light", br#"{"light": true}"#.to_vec())
            .unwrap();
        bus.flush().await;

        let received = received.lock().unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].1, br#"{"light": true}"#.to_vec());
    }

    #[tokio::test]
    async fn should_route_prefix_wildcard_to_matching_topics_only() {
        let bus = connected_bus().await;
        let (_, received) = recorder(&bus, "home/energy/#");

        bus.publish(topics::ENERGY_CURRENT, b"{}".to_vec()).unwrap();
        bus.publish(topics::ENERGY_HISTORY, b"[]".to_vec()).unwrap();
        bus.publish(topics::SECURITY_MOTION, b"{}".to_vec()).unwrap();
        bus.flush().await;

        let mut topics: Vec<_> = received
            .lock()
            .unwrap()
            .iter()
            .map(|(t, _)| t.clone())
            .collect();
        topics.sort();
        assert_eq!(topics, vec!["home/energy/current", "home/energy/history"]);
    }

    #[tokio::test]
    async fn should_fail_with_not_connected_before_connect() {
        let bus = EventBus::new();
        let result = bus.publish("home/light", b"{}".to_vec());
        assert!(matches!(result, Err(ConnectionError::NotConnected)));
    }

    #[tokio::test]
    async fn should_reconnect_idempotently_to_same_endpoint() {
        let bus = connected_bus().await;
        let first = bus.connection().unwrap();
        let again = bus.connect(&Endpoint::memory("test")).await.unwrap();
        assert_eq!(first, again);
    }

    #[tokio::test]
    async fn should_reject_other_endpoint_while_connected() {
        let bus = connected_bus().await;
        let result = bus.connect(&Endpoint::memory("other")).await;
        assert!(matches!(result, Err(ConnectionError::AlreadyConnected { .. })));
        assert_eq!(
            bus.connection().unwrap().endpoint,
            Endpoint::memory("test")
        );
    }

    #[tokio::test]
    async fn should_reject_remote_scheme_and_stay_disconnected() {
        let bus = EventBus::new();
        let endpoint: Endpoint = "mqtt://localhost:1883".parse().unwrap();
        let result = bus.connect(&endpoint).await;
        assert!(matches!(result, Err(ConnectionError::UnsupportedScheme(_))));
        assert!(!bus.is_connected());
    }

    #[tokio::test]
    async fn should_invoke_overlapping_subscriptions_in_registration_order() {
        let bus = connected_bus().await;
        let order = Arc::new(Mutex::new(Vec::new()));
        for (label, pattern) in [("exact", "home/light"), ("hash", "home/#"), ("plus", "home/+")] {
            let order = Arc::clone(&order);
            bus.subscribe(pattern, move |_: &Message| order.lock().unwrap().push(label));
        }

        bus.publish("home/light", b"{}".to_vec()).unwrap();
        bus.flush().await;

        assert_eq!(*order.lock().unwrap(), vec!["exact", "hash", "plus"]);
    }

    #[tokio::test]
    async fn should_stop_delivering_after_unsubscribe() {
        let bus = connected_bus().await;
        let (id, received) = recorder(&bus, "home/#");

        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.publish("home/light", b"{}".to_vec()).unwrap();
        bus.flush().await;

        assert!(received.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_keep_fifo_order_per_topic() {
        let bus = connected_bus().await;
        let (_, received) = recorder(&bus, "home/temperature");

        for i in 0..20 {
            bus.publish("home/temperature", format!("{i}").into_bytes())
                .unwrap();
        }
        bus.flush().await;

        let bodies: Vec<_> = received
            .lock()
            .unwrap()
            .iter()
            .map(|(_, b)| String::from_utf8(b.clone()).unwrap())
            .collect();
        let expected: Vec<_> = (0..20).map(|i| i.to_string()).collect();
        assert_eq!(bodies, expected);
    }

    #[tokio::test]
    async fn should_flush_messages_published_by_handlers() {
        let bus = connected_bus().await;
        let republisher = bus.clone();
        bus.subscribe("home/motion", move |_: &Message| {
            republisher
                .publish("home/security/alarm", br#"{"triggered":true}"#.to_vec())
                .unwrap();
        });
        let (_, received) = recorder(&bus, "home/security/alarm");

        bus.publish("home/motion", br#"{"motion":true}"#.to_vec())
            .unwrap();
        bus.flush().await;

        assert_eq!(received.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn should_survive_panicking_subscriber() {
        let bus = connected_bus().await;
        bus.subscribe("home/light", |_: &Message| panic!("boom"));
        let (_, received) = recorder(&bus, "home/light");

        bus.publish("home/light", b"1".to_vec()).unwrap();
        bus.publish("home/light", b"2".to_vec()).unwrap();
        bus.flush().await;

        assert_eq!(received.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn should_deliver_queued_messages_after_disconnect() {
        let bus = connected_bus().await;
        let (_, received) = recorder(&bus, "home/light");

        bus.publish("home/light", b"{}".to_vec()).unwrap();
        bus.disconnect();
        bus.disconnect();
        bus.flush().await;

        assert_eq!(received.lock().unwrap().len(), 1);
        assert!(matches!(
            bus.publish("home/light", b"{}".to_vec()),
            Err(ConnectionError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn should_keep_fifo_order_across_reconnect() {
        let bus = connected_bus().await;
        let (_, received) = recorder(&bus, "home/temperature");

        for i in 0..300 {
            bus.publish("home/temperature", format!("{i}").into_bytes())
                .unwrap();
        }
        bus.disconnect();
        bus.connect(&Endpoint::memory("test")).await.unwrap();
        for i in 300..600 {
            bus.publish("home/temperature", format!("{i}").into_bytes())
                .unwrap();
        }
        bus.flush().await;

        let bodies: Vec<_> = received
            .lock()
            .unwrap()
            .iter()
            .map(|(_, b)| String::from_utf8(b.clone()).unwrap())
            .collect();
        let expected: Vec<_> = (0..600).map(|i| i.to_string()).collect();
        assert_eq!(bodies, expected);
    }

    #[tokio::test]
    async fn should_mark_injected_messages_as_remote() {
        let bus = connected_bus().await;
        let origins = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&origins);
        bus.subscribe("home/#", move |m: &Message| sink.lock().unwrap().push(m.origin()));

        bus.inject("home/light", b"{}".to_vec()).unwrap();
        bus.publish_payload(&Payload::Light(LightPayload { light: Some(true) }))
            .unwrap();
        bus.flush().await;

        let mut origins = origins.lock().unwrap().clone();
        origins.sort_by_key(|o| *o == Origin::Local);
        assert_eq!(origins, vec![Origin::Remote, Origin::Local]);
    }
}
