//! End-to-end tests for the full homebusd stack.
//!
//! Each test wires the real in-memory bus, state store and command service
//! the same way the daemon does and drives them through published messages.

use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use homebus_adapter_virtual::{SensorSimulator, SimulatorConfig};
use homebus_app::commands::CommandService;
use homebus_app::event_bus::EventBus;
use homebus_app::ports::{FixedClock, SystemClock};
use homebus_app::state_store::StateStore;
use homebus_domain::activity::ActivityKind;
use homebus_domain::alarm::AlarmPhase;
use homebus_domain::automation::stock_rules;
use homebus_domain::endpoint::Endpoint;
use homebus_domain::message::Message;
use homebus_domain::session::Session;

async fn connected_bus() -> EventBus {
    let bus = EventBus::new();
    bus.connect(&Endpoint::memory("e2e"))
        .await
        .expect("memory bus should connect");
    bus
}

fn record(bus: &EventBus, pattern: &str) -> Arc<Mutex<Vec<Message>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    bus.subscribe(pattern, move |msg: &Message| {
        sink.lock().unwrap().push(msg.clone());
    });
    seen
}

// ---------------------------------------------------------------------------
// State store
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_update_temperature_from_published_reading() {
    let bus = connected_bus().await;
    let store = StateStore::new(&bus, Session::default());
    assert!((store.temperature() - 22.0).abs() < f64::EPSILON);

    bus.publish("home/temperature", r#"{"temperature": 26}"#)
        .unwrap();
    bus.flush().await;

    assert!((store.temperature() - 26.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn should_keep_state_when_message_is_malformed() {
    let bus = connected_bus().await;
    let store = StateStore::new(&bus, Session::default());

    bus.publish("home/light", "not json").unwrap();
    bus.publish("home/temperature", r#"{"temperature": "warm"}"#)
        .unwrap();
    bus.flush().await;

    assert!(!store.light());
    assert!((store.temperature() - 22.0).abs() < f64::EPSILON);
}

// ---------------------------------------------------------------------------
// Security
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_trigger_alarm_once_when_door_opens_while_armed() {
    let bus = connected_bus().await;
    let store = Arc::new(StateStore::new(&bus, Session::default()));
    let commands = CommandService::new(bus.clone(), SystemClock, Arc::clone(&store));
    let alarm_messages = record(&bus, "home/security/alarm");

    assert_eq!(commands.arm_alarm().unwrap(), AlarmPhase::Armed);
    bus.publish(
        "home/security/door",
        r#"{"action": "opened", "location": "Front Door"}"#,
    )
    .unwrap();
    bus.flush().await;

    let triggered: Vec<_> = alarm_messages
        .lock()
        .unwrap()
        .iter()
        .filter_map(|m| serde_json::from_slice::<serde_json::Value>(m.payload()).ok())
        .filter(|v| v["triggered"] == serde_json::json!(true))
        .collect();
    assert_eq!(triggered.len(), 1);
    assert_eq!(commands.alarm().phase(), AlarmPhase::Triggered);

    let log = commands.activity_log();
    let doors: Vec<_> = log.iter().filter(|e| e.kind == ActivityKind::Door).collect();
    assert_eq!(doors.len(), 1);
    assert_eq!(doors[0].message, "Door opened at Front Door");
    assert_eq!(
        log.iter().filter(|e| e.kind == ActivityKind::Alarm).count(),
        1
    );
}

#[tokio::test]
async fn should_ignore_motion_while_disarmed() {
    let bus = connected_bus().await;
    let store = Arc::new(StateStore::new(&bus, Session::default()));
    let commands = CommandService::new(bus.clone(), SystemClock, Arc::clone(&store));

    bus.publish(
        "home/security/motion",
        r#"{"detected": true, "location": "Garage"}"#,
    )
    .unwrap();
    bus.flush().await;

    assert_eq!(commands.alarm().phase(), AlarmPhase::Disarmed);
    let log = commands.activity_log();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].kind, ActivityKind::Motion);
}

// ---------------------------------------------------------------------------
// Automation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_turn_lights_on_when_weather_turns_cloudy() {
    let bus = connected_bus().await;
    let store = Arc::new(StateStore::new(&bus, Session::default()));
    let commands = CommandService::new(bus.clone(), SystemClock, Arc::clone(&store));
    for rule in stock_rules() {
        commands.add_automation(rule).unwrap();
    }

    bus.publish(
        "home/weather/current",
        r#"{"temp": 15, "condition": "cloudy", "humidity": 80, "windSpeed": 5}"#,
    )
    .unwrap();
    bus.flush().await;

    assert!(store.light());
    let log = commands.automation_log();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].message, "Triggered: Turn on lights when cloudy");
}

// ---------------------------------------------------------------------------
// Routing with the simulator
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn should_route_simulated_energy_to_wildcard_subscribers_only() {
    let bus = connected_bus().await;
    let store = StateStore::new(&bus, Session::default());
    let energy = record(&bus, "home/energy/#");
    let security = record(&bus, "home/security/#");
    let clock = Arc::new(FixedClock::new(
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap(),
    ));
    let simulator = SensorSimulator::new(
        bus.clone(),
        clock,
        SimulatorConfig {
            seed: Some(3),
            ..SimulatorConfig::default()
        },
    );

    simulator.start();
    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    bus.flush().await;
    simulator.stop();

    let topics: Vec<String> = energy
        .lock()
        .unwrap()
        .iter()
        .map(|m| m.topic().to_string())
        .collect();
    assert!(topics.contains(&"home/energy/current".to_string()));
    assert!(topics.contains(&"home/energy/history".to_string()));
    assert!(security.lock().unwrap().is_empty());
    assert_eq!(store.energy_history().samples().len(), 24);
    assert!(store.energy().watts >= 200.0);
    assert!(store.weather().is_some());
}
