//! # homebusd — homebus daemon
//!
//! Composition root that wires the event bus, the components and the
//! adapters together and runs until interrupted.
//!
//! ## Responsibilities
//! - Load configuration (config file, env vars)
//! - Install the tracing subscriber
//! - Connect the event bus and build the state store
//! - Construct the command service (alarm, camera, automation engine)
//! - Start the sensor simulator and the optional MQTT bridge
//! - Handle graceful shutdown (Ctrl-C)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;

use std::sync::Arc;

use anyhow::Context;
use homebus_adapter_mqtt::MqttBridge;
use homebus_adapter_virtual::SensorSimulator;
use homebus_app::commands::CommandService;
use homebus_app::event_bus::EventBus;
use homebus_app::ports::SystemClock;
use homebus_app::state_store::StateStore;
use homebus_domain::automation::stock_rules;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .init();

    // Event bus
    let bus = EventBus::new();
    bus.connect(&config.endpoint()?)
        .await
        .context("failed to connect event bus")?;

    // Components
    let store = Arc::new(StateStore::new(&bus, config.session.clone()));
    let commands = CommandService::new(bus.clone(), SystemClock, Arc::clone(&store));
    if config.automation.seed_defaults {
        for rule in stock_rules() {
            commands.add_automation(rule)?;
        }
    }
    commands.engine().start(config.automation.tick());

    // Adapters
    let simulator = SensorSimulator::new(bus.clone(), SystemClock, config.simulator.clone());
    simulator.start();

    let bridge = if config.mqtt.enabled {
        match MqttBridge::start(bus.clone(), &config.mqtt).await {
            Ok(bridge) => Some(bridge),
            Err(err) => {
                tracing::warn!(error = %err, "MQTT bridge unavailable, running local only");
                None
            }
        }
    } else {
        None
    };

    tracing::info!(
        user = %store.session().username,
        automations = commands.automations().len(),
        "homebusd running"
    );
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;

    tracing::info!("shutting down");
    simulator.stop();
    commands.engine().stop();
    if let Some(bridge) = bridge {
        bridge.stop();
    }
    bus.flush().await;
    bus.disconnect();

    let home = commands.home();
    tracing::info!(
        alarm = %home.alarm.phase(),
        temperature = home.temperature,
        "final state"
    );
    Ok(())
}
