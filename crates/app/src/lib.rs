//! # homebus-app
//!
//! Application layer — in-process infrastructure, use-cases and **port
//! definitions** (traits).
//!
//! ## Responsibilities
//! - Provide the in-process **event bus** with wildcard routing
//! - Keep the latest value of every channel in the **state store**
//! - Run the **alarm state machine** and **camera control**
//! - Evaluate weather **automation rules** on updates and on a periodic tick
//! - Expose the dashboard's write path as the **command service**
//! - Define **port traits** adapters consume or implement:
//!   - `EventPublisher` — publish typed payloads
//!   - `Clock` — local wall-clock time
//!
//! ## Dependency rule
//! Depends on `homebus-domain` only (plus `tokio` for tasks and timers).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod automation_engine;
pub mod commands;
pub mod event_bus;
pub mod ports;
pub mod security;
pub mod state_store;
pub mod ticker;
