//! `wander-bus` – the publish/subscribe transport seam.
//!
//! The wander behavior never touches hardware directly; every sensor
//! reading and actuator command crosses a topic on this bus. The crate
//! defines the fixed [`Topic`] set and an in-process [`MessageBus`] that
//! carries string payloads over per-topic broadcast channels.

pub mod bus;

pub use bus::{MessageBus, Subscription, Topic};
