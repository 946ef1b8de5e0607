//! # homebus-adapter-mqtt
//!
//! MQTT bridge — mirrors the local event bus to an external broker.
//!
//! ## Responsibilities
//! - Connect to an MQTT broker and subscribe to `<base>/#`
//! - Inject broker messages into the local bus with [`Origin::Remote`]
//! - Forward locally published `home/#` messages to the broker (QoS 1)
//! - Drop the broker's copy of messages this bridge just forwarded
//!
//! ## Dependency rule
//! Same as other adapters: depends on `homebus-app` and `homebus-domain`.

pub mod config;
pub mod error;
pub mod mapping;

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use homebus_app::event_bus::{EventBus, SubscriptionId};
use homebus_domain::message::{Message, Origin};
use homebus_domain::topic::topics;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use tokio::task::JoinHandle;

pub use config::MqttConfig;
pub use error::MqttError;
pub use mapping::{EchoFilter, TopicMap};

/// Requests buffered between the client handle and the event loop.
const REQUEST_CAPACITY: usize = 64;

/// Forwarded messages remembered for echo suppression.
const ECHO_WINDOW: usize = 64;

/// Pause after a failed poll before the event loop reconnects.
const RETRY_DELAY: Duration = Duration::from_secs(1);

/// A running bridge between the local bus and one broker.
pub struct MqttBridge {
    bus: EventBus,
    client: AsyncClient,
    subscription: Mutex<Option<SubscriptionId>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl MqttBridge {
    /// Connect to the broker and start mirroring.
    ///
    /// # Errors
    ///
    /// Returns [`MqttError::InvalidConfig`] for unusable settings,
    /// [`MqttError::Connection`] if the broker refuses or cannot be reached,
    /// and [`MqttError::ConnectTimeout`] if it does not answer in time.
    pub async fn start(bus: EventBus, config: &MqttConfig) -> Result<Self, MqttError> {
        config.validate()?;
        let mut options =
            MqttOptions::new(&config.client_id, &config.broker_host, config.broker_port);
        options.set_keep_alive(config.keep_alive());

        let (client, mut eventloop) = AsyncClient::new(options, REQUEST_CAPACITY);
        wait_for_connack(&mut eventloop, config.connect_timeout()).await?;
        tracing::info!(
            host = %config.broker_host,
            port = config.broker_port,
            "connected to MQTT broker"
        );

        let map = TopicMap::new(&config.base_topic);
        client
            .subscribe(map.broker_filter(), QoS::AtLeastOnce)
            .await
            .map_err(MqttError::Client)?;

        let echoes = Arc::new(EchoFilter::new(ECHO_WINDOW));
        let subscription = bus.subscribe(
            topics::HOME_ALL,
            forward_local(client.clone(), map.clone(), Arc::clone(&echoes)),
        );
        let task = tokio::spawn(pump(eventloop, client.clone(), bus.clone(), map, echoes));

        Ok(Self {
            bus,
            client,
            subscription: Mutex::new(Some(subscription)),
            task: Mutex::new(Some(task)),
        })
    }

    /// Stop mirroring and disconnect from the broker. Idempotent.
    pub fn stop(&self) {
        if let Some(id) = self
            .subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            self.bus.unsubscribe(id);
        }
        let task = self
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            if let Err(err) = self.client.try_disconnect() {
                tracing::debug!(%err, "MQTT disconnect request not sent");
            }
            task.abort();
            tracing::info!("MQTT bridge stopped");
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }
}

impl Drop for MqttBridge {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn wait_for_connack(eventloop: &mut EventLoop, timeout: Duration) -> Result<(), MqttError> {
    let handshake = async {
        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(_))) => return Ok(()),
                Ok(_) => {}
                Err(err) => return Err(MqttError::Connection(err)),
            }
        }
    };
    tokio::time::timeout(timeout, handshake)
        .await
        .map_err(|_| MqttError::ConnectTimeout(timeout))?
}

/// Bus handler that publishes local messages to the broker without blocking.
fn forward_local(
    client: AsyncClient,
    map: TopicMap,
    echoes: Arc<EchoFilter>,
) -> impl Fn(&Message) + Send + Sync + 'static {
    move |message: &Message| {
        if message.origin() == Origin::Remote {
            return;
        }
        let Some(topic) = map.to_broker(message.topic().as_str()) else {
            return;
        };
        echoes.remember(&topic, message.payload());
        if let Err(err) =
            client.try_publish(topic.as_str(), QoS::AtLeastOnce, false, message.payload())
        {
            echoes.take(&topic, message.payload());
            tracing::warn!(%err, %topic, "failed to forward message to MQTT broker");
        }
    }
}

/// Drive the event loop, injecting broker messages into the bus.
async fn pump(
    mut eventloop: EventLoop,
    client: AsyncClient,
    bus: EventBus,
    map: TopicMap,
    echoes: Arc<EchoFilter>,
) {
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                if echoes.take(&publish.topic, &publish.payload) {
                    continue;
                }
                let Some(topic) = map.to_local(&publish.topic) else {
                    tracing::debug!(topic = %publish.topic, "ignoring broker topic outside base");
                    continue;
                };
                if let Err(err) = bus.inject(topic.as_str(), publish.payload.to_vec()) {
                    tracing::warn!(%err, %topic, "failed to inject broker message");
                }
            }
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                tracing::info!("reconnected to MQTT broker");
                if let Err(err) = client.try_subscribe(map.broker_filter(), QoS::AtLeastOnce) {
                    tracing::warn!(%err, "failed to resubscribe after reconnect");
                }
            }
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(%err, "MQTT connection error");
                tokio::time::sleep(RETRY_DELAY).await;
            }
        }
    }
}
