//! State store — latest value per channel, derived from bus traffic.
//!
//! The store subscribes to `home/#` when built. Each message is decoded into
//! its typed payload and merged into the matching channel; undecodable
//! messages are logged and dropped. Observers are then notified
//! synchronously, still inside the dispatch of that message.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};

use homebus_domain::alarm::AlarmState;
use homebus_domain::channel::{Channel, ChannelState, HomeSnapshot, MotionState};
use homebus_domain::energy::{EnergyHistory, EnergyState};
use homebus_domain::message::{Message, Origin};
use homebus_domain::payload::Payload;
use homebus_domain::session::Session;
use homebus_domain::time::Timestamp;
use homebus_domain::topic::topics;
use homebus_domain::weather::CurrentWeather;

use crate::event_bus::{EventBus, SubscriptionId};

/// A channel change, as handed to observers.
#[derive(Debug, Clone)]
pub struct StateUpdate {
    pub channel: Channel,
    /// The decoded payload that caused the change.
    pub payload: Payload,
    /// Channel value after the merge.
    pub state: ChannelState,
    pub received_at: Timestamp,
    pub origin: Origin,
}

/// Identifies one observer, returned by [`StateStore::observe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

type Observer = Arc<dyn Fn(&StateUpdate) + Send + Sync>;

struct Inner {
    channels: HashMap<Channel, Mutex<ChannelState>>,
    observers: RwLock<Vec<(ObserverId, Observer)>>,
    next_observer: AtomicU64,
}

/// Holds the latest state of every channel.
pub struct StateStore {
    inner: Arc<Inner>,
    session: Session,
    bus: EventBus,
    subscription: SubscriptionId,
}

impl StateStore {
    /// Build a store seeded from `session` and subscribe it to `bus`.
    #[must_use]
    pub fn new(bus: &EventBus, session: Session) -> Self {
        let channels = Channel::ALL
            .into_iter()
            .map(|channel| (channel, Mutex::new(ChannelState::initial(channel, &session))))
            .collect();
        let inner = Arc::new(Inner {
            channels,
            observers: RwLock::new(Vec::new()),
            next_observer: AtomicU64::new(1),
        });

        let weak: Weak<Inner> = Arc::downgrade(&inner);
        let subscription = bus.subscribe(topics::HOME_ALL, move |message: &Message| {
            if let Some(inner) = weak.upgrade() {
                inner.handle(message);
            }
        });

        Self {
            inner,
            session,
            bus: bus.clone(),
            subscription,
        }
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Copy of the current value of `channel`.
    #[must_use]
    pub fn snapshot(&self, channel: Channel) -> ChannelState {
        self.inner.read(channel)
    }

    /// Copy of every channel.
    #[must_use]
    pub fn home(&self) -> HomeSnapshot {
        let mut home = HomeSnapshot::initial(&self.session);
        for channel in Channel::ALL {
            home.set(self.snapshot(channel));
        }
        home
    }

    /// Register a change observer, called in registration order.
    pub fn observe<F>(&self, observer: F) -> ObserverId
    where
        F: Fn(&StateUpdate) + Send + Sync + 'static,
    {
        let id = ObserverId(self.inner.next_observer.fetch_add(1, Ordering::Relaxed));
        self.inner
            .observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(observer)));
        id
    }

    /// Remove an observer; `false` if it was already removed.
    pub fn unobserve(&self, id: ObserverId) -> bool {
        let mut observers = self
            .inner
            .observers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = observers.len();
        observers.retain(|(observer, _)| *observer != id);
        observers.len() != before
    }

    /// Latest weather reading, `None` before the first one.
    #[must_use]
    pub fn weather(&self) -> Option<CurrentWeather> {
        match self.snapshot(Channel::Weather) {
            ChannelState::Weather(weather) => weather,
            _ => None,
        }
    }

    #[must_use]
    pub fn alarm(&self) -> AlarmState {
        match self.snapshot(Channel::Alarm) {
            ChannelState::Alarm(alarm) => alarm,
            _ => AlarmState::default(),
        }
    }

    /// `true` when the light is on.
    #[must_use]
    pub fn light(&self) -> bool {
        matches!(self.snapshot(Channel::Light), ChannelState::Light(true))
    }

    /// Thermostat reading, °C.
    #[must_use]
    pub fn temperature(&self) -> f64 {
        match self.snapshot(Channel::Temperature) {
            ChannelState::Temperature(celsius) => celsius,
            _ => f64::from(self.session.default_temperature),
        }
    }

    #[must_use]
    pub fn camera_on(&self) -> bool {
        matches!(self.snapshot(Channel::Camera), ChannelState::Camera(true))
    }

    #[must_use]
    pub fn motion(&self) -> MotionState {
        match self.snapshot(Channel::Motion) {
            ChannelState::Motion(motion) => motion,
            _ => MotionState::default(),
        }
    }

    #[must_use]
    pub fn energy(&self) -> EnergyState {
        match self.snapshot(Channel::Energy) {
            ChannelState::Energy(energy) => energy,
            _ => EnergyState::default(),
        }
    }

    #[must_use]
    pub fn energy_history(&self) -> EnergyHistory {
        match self.snapshot(Channel::EnergyHistory) {
            ChannelState::EnergyHistory(history) => history,
            _ => EnergyHistory::default(),
        }
    }

    /// Progress (0–100) towards the session's savings goal.
    #[must_use]
    pub fn savings_progress(&self) -> u8 {
        self.energy_history()
            .savings_progress(self.session.energy_savings_goal)
    }

    /// Weather location currently followed.
    #[must_use]
    pub fn location(&self) -> String {
        match self.snapshot(Channel::Location) {
            ChannelState::Location(location) => location,
            _ => self.session.weather_location.clone(),
        }
    }
}

impl Drop for StateStore {
    fn drop(&mut self) {
        self.bus.unsubscribe(self.subscription);
    }
}

impl Inner {
    fn read(&self, channel: Channel) -> ChannelState {
        match self.channels.get(&channel) {
            Some(slot) => slot.lock().unwrap_or_else(PoisonError::into_inner).clone(),
            None => ChannelState::initial(channel, &Session::default()),
        }
    }

    fn handle(&self, message: &Message) {
        let payload = match message.decode() {
            Ok(payload) => payload,
            Err(err) => {
                tracing::warn!(%err, topic = %message.topic(), "dropping undecodable message");
                return;
            }
        };
        let Some(channel) = Channel::of(&payload) else {
            tracing::trace!(topic = %message.topic(), "no channel for topic");
            return;
        };
        let Some(slot) = self.channels.get(&channel) else {
            return;
        };

        let state = {
            let mut state = slot.lock().unwrap_or_else(PoisonError::into_inner);
            if !state.apply(&payload, message.received_at()) {
                return;
            }
            state.clone()
        };
        tracing::debug!(%channel, topic = %message.topic(), "channel updated");

        let update = StateUpdate {
            channel,
            payload,
            state,
            received_at: message.received_at(),
            origin: message.origin(),
        };
        let observers: Vec<Observer> = self
            .observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect();
        for observer in observers {
            observer(&update);
        }
    }
}
