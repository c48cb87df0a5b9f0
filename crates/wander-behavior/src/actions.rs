//! [`ActionSequencer`] – fire-and-wait actuator primitives.
//!
//! Each primitive publishes one fully formed command on the correct
//! topic. Publishing is non-blocking with respect to the bus; some
//! primitives then hold a fixed wall-clock settle delay so the physical
//! action registers before the next command goes out. There is no motion
//! feedback at this layer: the settle durations stand in for it and are
//! kept explicit and configurable.
//!
//! All primitives are idempotent at the protocol level. Publishing
//! `stop` twice is harmless, and publishing `drive` while already
//! driving simply re-asserts the intent.

use std::time::Duration;

use tracing::debug;
use wander_bus::{MessageBus, Topic};
use wander_types::{Direction, LedCommand, MotorCommand, WanderError};

/// Fixed settle delays, one per timed primitive.
///
/// Defaults: 1 s for speech, 2 s for the open-loop turn, 1 s after the
/// turn's stop.
#[derive(Debug, Clone, Copy)]
pub struct SettleTiming {
    /// Wait after publishing a phrase, so speech finishes before motion.
    pub speech: Duration,
    /// How long the timed turn runs before the unconditional stop.
    pub turn: Duration,
    /// Wait after the turn's stop, letting the chassis come to rest.
    pub post_turn: Duration,
}

impl Default for SettleTiming {
    fn default() -> Self {
        Self {
            speech: Duration::from_secs(1),
            turn: Duration::from_secs(2),
            post_turn: Duration::from_secs(1),
        }
    }
}

impl SettleTiming {
    /// All delays zeroed. For tests that exercise ordering, not timing.
    pub fn immediate() -> Self {
        Self {
            speech: Duration::ZERO,
            turn: Duration::ZERO,
            post_turn: Duration::ZERO,
        }
    }
}

/// Publishes actuator commands on the bus.
///
/// Holds a bus handle and nothing else; every primitive is safe to call
/// in any order, including repeatedly and from cleanup paths.
pub struct ActionSequencer {
    bus: MessageBus,
    timing: SettleTiming,
}

impl ActionSequencer {
    /// Sequencer with the default settle delays.
    pub fn new(bus: MessageBus) -> Self {
        Self::with_timing(bus, SettleTiming::default())
    }

    /// Sequencer with explicit settle delays.
    pub fn with_timing(bus: MessageBus, timing: SettleTiming) -> Self {
        Self { bus, timing }
    }

    /// Assert a forward drive intent. Non-blocking; no settle delay.
    pub async fn drive(&self, speed: f32) -> Result<(), WanderError> {
        debug!(speed, "drive");
        self.publish_motor(&MotorCommand::Drive {
            speed,
            direction: Direction::Forward,
        })
    }

    /// Stop all motors.
    ///
    /// Always safe to call, any number of times, with no prior state.
    /// This is the primitive every cleanup path relies on.
    pub async fn stop_motors(&self) -> Result<(), WanderError> {
        debug!("stop motors");
        self.publish_motor(&MotorCommand::Stop)
    }

    /// Scripted open-loop turn: publish the turn intent, let it run for
    /// the turn settle, then stop unconditionally and wait the post-turn
    /// settle. Once started the turn always runs its full duration; there
    /// is no mid-primitive cancellation.
    pub async fn turn_left(&self, speed: f32) -> Result<(), WanderError> {
        debug!(speed, "timed left turn");
        self.publish_motor(&MotorCommand::TurnLeft { speed })?;
        tokio::time::sleep(self.timing.turn).await;
        self.stop_motors().await?;
        tokio::time::sleep(self.timing.post_turn).await;
        Ok(())
    }

    /// Publish a phrase for the speech subsystem, then wait the speech
    /// settle so the robot is not talking over its own motion.
    pub async fn speak(&self, phrase: &str) -> Result<(), WanderError> {
        debug!(phrase, "speak");
        self.bus.publish(Topic::SpeechCommand, phrase)?;
        tokio::time::sleep(self.timing.speech).await;
        Ok(())
    }

    /// Turn the named indicator on.
    pub async fn led_on(&self, name: &str) -> Result<(), WanderError> {
        self.publish_led(&LedCommand::TurnOn {
            name: name.to_string(),
        })
    }

    /// Turn the named indicator off.
    pub async fn led_off(&self, name: &str) -> Result<(), WanderError> {
        self.publish_led(&LedCommand::TurnOff {
            name: name.to_string(),
        })
    }

    fn publish_motor(&self, cmd: &MotorCommand) -> Result<(), WanderError> {
        let payload = encode(Topic::MotorCommand, cmd)?;
        self.bus.publish(Topic::MotorCommand, payload)?;
        Ok(())
    }

    fn publish_led(&self, cmd: &LedCommand) -> Result<(), WanderError> {
        let payload = encode(Topic::LedCommand, cmd)?;
        self.bus.publish(Topic::LedCommand, payload)?;
        Ok(())
    }
}

fn encode<T: serde::Serialize>(topic: Topic, cmd: &T) -> Result<String, WanderError> {
    serde_json::to_string(cmd).map_err(|e| WanderError::Payload {
        topic: topic.as_str().to_string(),
        details: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wander_bus::Subscription;

    fn sequencer_with_taps() -> (ActionSequencer, Subscription, Subscription, Subscription) {
        let bus = MessageBus::default();
        let motor = bus.subscribe(Topic::MotorCommand);
        let led = bus.subscribe(Topic::LedCommand);
        let speech = bus.subscribe(Topic::SpeechCommand);
        let seq = ActionSequencer::with_timing(bus, SettleTiming::immediate());
        (seq, motor, led, speech)
    }

    #[tokio::test]
    async fn drive_publishes_forward_intent() {
        let (seq, mut motor, _led, _speech) = sequencer_with_taps();
        seq.drive(1.0).await.unwrap();
        assert_eq!(
            motor.try_recv().as_deref(),
            Some(r#"{"command":"drive","speed":1.0,"direction":"forward"}"#)
        );
    }

    #[tokio::test]
    async fn stop_motors_is_idempotent() {
        let (seq, mut motor, _led, _speech) = sequencer_with_taps();
        seq.stop_motors().await.unwrap();
        seq.stop_motors().await.unwrap();
        seq.stop_motors().await.unwrap();

        // Three identical stop payloads; repeating adds no new intent.
        for _ in 0..3 {
            assert_eq!(motor.try_recv().as_deref(), Some(r#"{"command":"stop"}"#));
        }
        assert!(motor.try_recv().is_none());
    }

    #[tokio::test]
    async fn stop_motors_needs_no_prior_state() {
        let bus = MessageBus::default();
        let mut motor = bus.subscribe(Topic::MotorCommand);
        let seq = ActionSequencer::with_timing(bus, SettleTiming::immediate());

        // First command ever issued on this sequencer.
        seq.stop_motors().await.unwrap();
        assert_eq!(motor.try_recv().as_deref(), Some(r#"{"command":"stop"}"#));
    }

    #[tokio::test]
    async fn turn_left_always_ends_with_stop() {
        let (seq, mut motor, _led, _speech) = sequencer_with_taps();
        seq.turn_left(1.0).await.unwrap();

        assert_eq!(
            motor.try_recv().as_deref(),
            Some(r#"{"command":"turn_left","speed":1.0}"#)
        );
        assert_eq!(motor.try_recv().as_deref(), Some(r#"{"command":"stop"}"#));
        assert!(motor.try_recv().is_none());
    }

    #[tokio::test]
    async fn speak_publishes_plain_phrase() {
        let (seq, _motor, _led, mut speech) = sequencer_with_taps();
        seq.speak("Can't go that way!").await.unwrap();
        // Phrases travel as-is, not JSON-wrapped.
        assert_eq!(speech.try_recv().as_deref(), Some("Can't go that way!"));
    }

    #[tokio::test]
    async fn led_commands_carry_the_indicator_name() {
        let (seq, _motor, mut led, _speech) = sequencer_with_taps();
        seq.led_on("red").await.unwrap();
        seq.led_off("red").await.unwrap();

        assert_eq!(
            led.try_recv().as_deref(),
            Some(r#"{"command":"turn_on","name":"red"}"#)
        );
        assert_eq!(
            led.try_recv().as_deref(),
            Some(r#"{"command":"turn_off","name":"red"}"#)
        );
    }

    #[tokio::test]
    async fn primitives_succeed_with_no_subscribers() {
        // Fire-and-forget: an empty bus must not fail any primitive.
        let seq = ActionSequencer::with_timing(MessageBus::default(), SettleTiming::immediate());
        seq.drive(1.0).await.unwrap();
        seq.stop_motors().await.unwrap();
        seq.turn_left(1.0).await.unwrap();
        seq.speak("hello").await.unwrap();
        seq.led_on("red").await.unwrap();
        seq.led_off("red").await.unwrap();
    }
}
