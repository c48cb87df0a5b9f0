//! Shared command payloads and the error taxonomy for the wander behavior.
//!
//! Every actuator family (motor, led, speech) has its own topic on the
//! message bus; the types here define the exact wire shape of the commands
//! published on those topics. The subsystems on the other end of the bus
//! parse these payloads, so the JSON field names and tag values are a
//! protocol contract, not an implementation detail.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Travel direction for a [`MotorCommand::Drive`] intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Forward,
    Reverse,
}

/// Commands understood by the motor subsystem.
///
/// Serializes as a compact tagged object, e.g.
/// `{"command":"drive","speed":1.0,"direction":"forward"}` or
/// `{"command":"stop"}`. `Stop` carries no fields so it can always be
/// published, including from cleanup paths with no prior state. `TurnLeft`
/// is the only rotational intent: turns are open-loop and the rotational
/// sense is fixed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum MotorCommand {
    Drive { speed: f32, direction: Direction },
    Stop,
    TurnLeft { speed: f32 },
}

/// Commands understood by the led subsystem.
///
/// `name` identifies the physical indicator (e.g. `"red"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum LedCommand {
    TurnOn { name: String },
    TurnOff { name: String },
}

/// Errors spanning sensor acquisition, bus payloads, and configuration.
#[derive(Error, Debug)]
pub enum WanderError {
    /// No sonar measurement arrived within the read budget. Fatal to the
    /// current run: the loop cannot drive blind.
    #[error("no sonar measurement within {0:?}")]
    SensorTimeout(Duration),

    /// A bus payload could not be encoded or decoded.
    #[error("malformed payload on {topic}: {details}")]
    Payload { topic: String, details: String },

    /// The bus rejected a publish. Primitives never swallow this; it
    /// propagates to the wander loop and routes through cleanup.
    #[error("bus publish failed on {topic}: {details}")]
    Bus { topic: String, details: String },

    /// Configuration could not be loaded or parsed.
    #[error("configuration error: {0}")]
    Config(String),
}
