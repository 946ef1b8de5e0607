//! # homebus-adapter-virtual
//!
//! Sensor simulator that feeds the bus with synthetic readings so the hub
//! can run without hardware.
//!
//! ## Provided feeds
//!
//! | Generator | Topics | Default period | Behaviour |
//! |-----------|--------|----------------|-----------|
//! | temperature | `home/temperature` | 5 s | 20–25 °C, +2 in the evening |
//! | motion | `home/motion` | 5 s | presence with configurable odds |
//! | energy | `home/energy/current`, `home/energy/history` | 5 s | draw biased by time of day, history backfilled then rolled each minute |
//! | weather | `home/weather/current`, `home/weather/forecast` | 60 s | 0–35 °C with a five-day forecast |
//!
//! ## Dependency rule
//!
//! Depends on `homebus-app` (port traits, ticker) and `homebus-domain` only.

pub mod config;
pub mod generators;

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use homebus_app::ports::{Clock, EventPublisher};
use homebus_app::ticker::Ticker;
use rand::SeedableRng;
use rand::rngs::StdRng;

pub use config::{GeneratorConfig, InvalidSimulatorConfig, SimulatorConfig};
pub use generators::{Generator, GeneratorKind};

/// Drives the generators on independent timers and publishes their output.
pub struct SensorSimulator<P, C> {
    publisher: P,
    clock: C,
    config: SimulatorConfig,
    running: Mutex<HashMap<GeneratorKind, Ticker>>,
}

impl<P, C> SensorSimulator<P, C>
where
    P: EventPublisher + Clone + Send + Sync + 'static,
    C: Clock + Clone + Send + Sync + 'static,
{
    #[must_use]
    pub fn new(publisher: P, clock: C, config: SimulatorConfig) -> Self {
        Self {
            publisher,
            clock,
            config,
            running: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Start every enabled generator that is not already running.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn start(&self) {
        let mut running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        for (index, kind) in GeneratorKind::ALL.into_iter().enumerate() {
            if !self.config.is_enabled(kind) || running.contains_key(&kind) {
                continue;
            }
            let ticker = self.spawn(kind, index as u64);
            running.insert(kind, ticker);
        }
        tracing::info!(generators = running.len(), "sensor simulator started");
    }

    fn spawn(&self, kind: GeneratorKind, stream: u64) -> Ticker {
        let period = self.config.period(kind);
        let mut generator = Generator::new(kind, self.config.motion_probability);
        let mut rng = self.config.seed.map_or_else(StdRng::from_entropy, |seed| {
            StdRng::seed_from_u64(seed.wrapping_add(stream))
        });
        let publisher = self.publisher.clone();
        let clock = self.clock.clone();

        tracing::debug!(generator = %kind, ?period, "starting generator");
        let tick = move || {
            for payload in generator.tick(&mut rng, clock.now()) {
                if let Err(err) = publisher.publish(&payload) {
                    tracing::warn!(
                        %err,
                        generator = %kind,
                        topic = payload.topic(),
                        "failed to publish simulated reading"
                    );
                }
            }
        };
        if kind.fires_on_start() {
            Ticker::spawn_immediate(period, tick)
        } else {
            Ticker::spawn(period, tick)
        }
    }

    /// Stop one generator. Returns `false` if it was not running.
    pub fn stop_generator(&self, kind: GeneratorKind) -> bool {
        let ticker = self
            .running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&kind);
        ticker.is_some_and(|mut ticker| {
            ticker.stop();
            tracing::debug!(generator = %kind, "generator stopped");
            true
        })
    }

    /// Stop every generator. Idempotent.
    pub fn stop(&self) {
        let stopped: Vec<_> = self
            .running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain()
            .collect();
        if !stopped.is_empty() {
            tracing::info!(generators = stopped.len(), "sensor simulator stopped");
        }
        for (_, mut ticker) in stopped {
            ticker.stop();
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        !self
            .running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }

    /// Generators currently running, in no particular order.
    #[must_use]
    pub fn running(&self) -> Vec<GeneratorKind> {
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect()
    }
}
