//! Automation engine — fires weather rules through the bus.
//!
//! Evaluation runs whenever a new weather reading lands in the state store
//! and on every tick of the periodic timer. Each enabled rule whose
//! condition and schedule hold publishes its command once per evaluation;
//! rules are read fresh from the engine's own list every time, so edits
//! apply to the very next evaluation.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use homebus_domain::automation::{AUTOMATION_LOG_CAPACITY, AutomationLogEntry, AutomationRule};
use homebus_domain::bounded_log::BoundedLog;
use homebus_domain::channel::ChannelState;
use homebus_domain::error::{HubError, NotFoundError};
use homebus_domain::id::RuleId;
use homebus_domain::time::{WallClock, now};
use homebus_domain::weather::CurrentWeather;

use crate::ports::{Clock, EventPublisher};
use crate::state_store::{ObserverId, StateStore, StateUpdate};
use crate::ticker::Ticker;

struct Inner<P, C> {
    publisher: P,
    clock: C,
    store: Arc<StateStore>,
    rules: Mutex<Vec<AutomationRule>>,
    log: Mutex<BoundedLog<AutomationLogEntry>>,
}

/// Reactive rule engine driven by weather updates and a periodic tick.
pub struct AutomationEngine<P, C> {
    inner: Arc<Inner<P, C>>,
    observer: ObserverId,
    ticker: Mutex<Option<Ticker>>,
}

impl<P, C> AutomationEngine<P, C>
where
    P: EventPublisher + Send + Sync + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Create an engine with no rules, watching `store` for weather.
    pub fn new(publisher: P, clock: C, store: Arc<StateStore>) -> Self {
        let inner = Arc::new(Inner {
            publisher,
            clock,
            store: Arc::clone(&store),
            rules: Mutex::new(Vec::new()),
            log: Mutex::new(BoundedLog::new(AUTOMATION_LOG_CAPACITY)),
        });
        let weak: Weak<Inner<P, C>> = Arc::downgrade(&inner);
        let observer = store.observe(move |update: &StateUpdate| {
            let ChannelState::Weather(Some(weather)) = &update.state else {
                return;
            };
            if let Some(inner) = weak.upgrade() {
                let at = inner.clock.now();
                inner.evaluate_with(weather, at);
            }
        });
        Self {
            inner,
            observer,
            ticker: Mutex::new(None),
        }
    }

    /// Add a rule at the end of the list.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Validation`] if the rule is invalid.
    pub fn add(&self, rule: AutomationRule) -> Result<RuleId, HubError> {
        rule.validate()?;
        let id = rule.id;
        tracing::info!(%id, name = %rule.name, "automation added");
        self.inner.rules().push(rule);
        Ok(id)
    }

    /// Flip a rule's `enabled` flag, returning the new value.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::NotFound`] for an unknown id.
    pub fn toggle(&self, id: RuleId) -> Result<bool, HubError> {
        let mut rules = self.inner.rules();
        let rule = rules
            .iter_mut()
            .find(|rule| rule.id == id)
            .ok_or_else(|| not_found(id))?;
        rule.enabled = !rule.enabled;
        tracing::info!(%id, enabled = rule.enabled, "automation toggled");
        Ok(rule.enabled)
    }

    /// Remove a rule, returning it.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::NotFound`] for an unknown id.
    pub fn delete(&self, id: RuleId) -> Result<AutomationRule, HubError> {
        let mut rules = self.inner.rules();
        let index = rules
            .iter()
            .position(|rule| rule.id == id)
            .ok_or_else(|| not_found(id))?;
        tracing::info!(%id, "automation deleted");
        Ok(rules.remove(index))
    }

    /// Copy of the rules, in insertion order.
    #[must_use]
    pub fn rules(&self) -> Vec<AutomationRule> {
        self.inner.rules().clone()
    }

    /// Recent firings, newest first.
    #[must_use]
    pub fn log(&self) -> Vec<AutomationLogEntry> {
        self.inner
            .log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .to_vec()
    }

    /// Evaluate every rule now, returning the ids of those that fired.
    pub fn evaluate(&self) -> Vec<RuleId> {
        self.evaluate_at(self.inner.clock.now())
    }

    /// Evaluate every rule as if the local time were `at`.
    ///
    /// Nothing fires before the first weather reading.
    pub fn evaluate_at(&self, at: WallClock) -> Vec<RuleId> {
        match self.inner.store.weather() {
            Some(weather) => self.inner.evaluate_with(&weather, at),
            None => Vec::new(),
        }
    }

    /// Start the periodic evaluation. No-op when already running.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn start(&self, period: Duration) {
        let mut ticker = self.ticker.lock().unwrap_or_else(PoisonError::into_inner);
        if ticker.as_ref().is_some_and(Ticker::is_running) {
            return;
        }
        let weak = Arc::downgrade(&self.inner);
        *ticker = Some(Ticker::spawn(period, move || {
            if let Some(inner) = weak.upgrade()
                && let Some(weather) = inner.store.weather()
            {
                let at = inner.clock.now();
                inner.evaluate_with(&weather, at);
            }
        }));
        tracing::debug!(?period, "automation tick started");
    }

    /// Stop the periodic evaluation. Idempotent.
    pub fn stop(&self) {
        if let Some(mut ticker) = self
            .ticker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            ticker.stop();
            tracing::debug!("automation tick stopped");
        }
    }
}

impl<P, C> Drop for AutomationEngine<P, C> {
    fn drop(&mut self) {
        self.inner.store.unobserve(self.observer);
    }
}

impl<P: EventPublisher, C> Inner<P, C> {
    fn rules(&self) -> MutexGuard<'_, Vec<AutomationRule>> {
        self.rules.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn evaluate_with(&self, weather: &CurrentWeather, at: WallClock) -> Vec<RuleId> {
        let mut fired = Vec::new();
        let mut rules = self.rules();
        for rule in rules.iter_mut() {
            if !rule.should_fire(weather, at.time()) {
                continue;
            }
            if let Err(err) = self.publisher.publish(&rule.action.command()) {
                tracing::warn!(%err, rule = %rule.name, "failed to publish automation command");
                continue;
            }
            let timestamp = now();
            rule.last_fired = Some(timestamp);
            tracing::info!(rule = %rule.name, action = %rule.action, "automation fired");
            self.log
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(AutomationLogEntry::fired(rule, timestamp));
            fired.push(rule.id);
        }
        fired
    }
}

fn not_found(id: RuleId) -> HubError {
    NotFoundError {
        entity: "Automation",
        id: id.to_string(),
    }
    .into()
}
