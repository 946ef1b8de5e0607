//! # homebus-domain
//!
//! Pure domain model for the homebus event hub.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Topics** and wildcard **patterns** used for bus routing
//! - Define **Messages** and the typed **Payload** union decoded per topic
//! - Define **Channels** (logical state slots) and how payloads update them
//! - Define the **Alarm** state machine transitions
//! - Define **Automation rules** (weather condition → device command)
//! - Bounded activity / automation logs and the user **Session**
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.

pub mod error;
pub mod id;
pub mod time;

pub mod activity;
pub mod alarm;
pub mod automation;
pub mod bounded_log;
pub mod camera;
pub mod channel;
pub mod endpoint;
pub mod energy;
pub mod message;
pub mod payload;
pub mod session;
pub mod topic;
pub mod weather;
