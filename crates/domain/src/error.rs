//! Common error types used across the workspace.
//!
//! Each failure family has its own typed error; [`HubError`] aggregates them
//! via `#[from]` so callers can use `?` across layers.

/// Top-level error for homebus operations.
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    #[error("connection error")]
    Connection(#[from] ConnectionError),

    #[error("decode error")]
    Decode(#[from] DecodeError),

    #[error("invalid transition")]
    InvalidTransition(#[from] TransitionError),

    #[error("validation error")]
    Validation(#[from] ValidationError),

    #[error("not found")]
    NotFound(#[from] NotFoundError),
}

/// The transport is unavailable or was never connected.
///
/// Never fatal; the caller may retry.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("bus is not connected")]
    NotConnected,

    #[error("malformed endpoint `{0}`, expected `scheme://authority`")]
    InvalidEndpoint(String),

    #[error("unsupported endpoint scheme `{0}`")]
    UnsupportedScheme(String),

    #[error("already connected to {current}")]
    AlreadyConnected { current: String },

    #[error("transport unavailable")]
    Unavailable(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// A message payload could not be decoded.
///
/// The message is dropped and channel state stays unchanged.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("payload is not valid JSON")]
    Json(#[from] serde_json::Error),

    #[error("payload on {topic} must be a JSON {expected}")]
    Shape {
        topic: String,
        expected: &'static str,
    },
}

/// A state-machine transition that is not allowed from the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("cannot disarm while the alarm is triggered, reset it first")]
    DisarmWhileTriggered,

    #[error("cannot trigger a disarmed alarm")]
    TriggerWhileDisarmed,

    #[error("alarm is not triggered")]
    NotTriggered,

    #[error("camera is turned off")]
    CameraOff,
}

/// Input rejected before any mutation took place.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("location must not be empty")]
    EmptyLocation,

    #[error("schedule `{0}` must be `immediate` or `HH:MM`")]
    InvalidSchedule(String),

    #[error("temperature {value} is outside {min}..={max}")]
    TemperatureOutOfRange { value: i32, min: i32, max: i32 },

    #[error("scheduled time is in the past")]
    ScheduleInPast,
}

/// A looked-up object does not exist.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}
