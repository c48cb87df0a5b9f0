//! `wander-behavior` – the obstacle-avoidance behavior core.
//!
//! Three layers, leaves first:
//!
//! - [`sonar`] – bounded-wait acquisition of the latest distance
//!   measurement over a persistent bus subscription.
//! - [`actions`] – fire-and-wait actuator primitives (drive, stop, turn,
//!   speak, led) with fixed settle delays.
//! - [`wander_loop`] – the reactive state machine that alternates between
//!   reading distance and sequencing actions, and owns cleanup framing.

pub mod actions;
pub mod sonar;
pub mod wander_loop;

pub use actions::{ActionSequencer, SettleTiming};
pub use sonar::SonarReader;
pub use wander_loop::{WanderConfig, WanderLoop, WanderState};
