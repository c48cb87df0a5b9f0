//! Topic-based publish/subscribe message bus.
//!
//! Uses [`tokio::sync::broadcast`] channels under the hood so that every
//! subscriber receives every message without any single subscriber blocking
//! the others.
//!
//! # Topics
//!
//! Traffic is partitioned into four [`Topic`] lanes, one per subsystem:
//!
//! | Topic | Direction | Payload |
//! |---|---|---|
//! | [`Topic::SonarMeasurement`] | inbound | bare JSON number (distance) |
//! | [`Topic::MotorCommand`] | outbound | tagged motor command object |
//! | [`Topic::LedCommand`] | outbound | tagged led command object |
//! | [`Topic::SpeechCommand`] | outbound | plain phrase string |
//!
//! Messages are fire-and-forget: publishing to a topic nobody listens on
//! is a normal condition, not an error. The only ordering relied upon is
//! per-topic publish order, which the broadcast channel preserves.

use tokio::sync::broadcast;
use tracing::warn;
use wander_types::WanderError;

/// Default channel capacity (number of buffered messages before old ones
/// are dropped for slow subscribers).
const DEFAULT_CAPACITY: usize = 256;

/// The fixed set of logical channels used by the wander behavior.
///
/// Wire names are fixed at compile time and never computed dynamically;
/// they match the topic names the sonar, motor, led, and speech
/// subsystems already use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// Distance measurements published by the sonar subsystem.
    SonarMeasurement,
    /// Drive / stop / turn intents for the motor subsystem.
    MotorCommand,
    /// Indicator on/off commands for the led subsystem.
    LedCommand,
    /// Phrases for the speech subsystem to say aloud.
    SpeechCommand,
}

impl Topic {
    /// The topic's name on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::SonarMeasurement => "subsystem.sonar.measurement",
            Topic::MotorCommand => "subsystem.motor.command",
            Topic::LedCommand => "subsystem.led.command",
            Topic::SpeechCommand => "subsystem.speech.command",
        }
    }
}

/// Shared message bus. Clone it cheaply – all clones share the same
/// underlying broadcast channels.
///
/// This in-process implementation stands in for the external transport
/// the behavior assumes is already connected; the wander loop and its
/// tests only ever use the `publish` / `subscribe` pair, so swapping in
/// a networked client changes nothing above this seam.
#[derive(Clone, Debug)]
pub struct MessageBus {
    sonar_measurement: broadcast::Sender<String>,
    motor_command: broadcast::Sender<String>,
    led_command: broadcast::Sender<String>,
    speech_command: broadcast::Sender<String>,
}

impl MessageBus {
    /// Create a new bus with the given channel capacity.
    ///
    /// The `capacity` is applied to every topic channel independently.
    pub fn new(capacity: usize) -> Self {
        let (sonar_measurement, _) = broadcast::channel(capacity);
        let (motor_command, _) = broadcast::channel(capacity);
        let (led_command, _) = broadcast::channel(capacity);
        let (speech_command, _) = broadcast::channel(capacity);
        Self {
            sonar_measurement,
            motor_command,
            led_command,
            speech_command,
        }
    }

    /// Publish `payload` to the given [`Topic`] channel.
    ///
    /// Returns the number of active receivers that were handed the
    /// message. `Ok(0)` means nobody is currently listening on the topic,
    /// which is a normal fire-and-forget condition. The `Result` is the
    /// seam where a networked transport reports delivery failures as
    /// [`WanderError::Bus`].
    pub fn publish(
        &self,
        topic: Topic,
        payload: impl Into<String>,
    ) -> Result<usize, WanderError> {
        match self.topic_sender(topic).send(payload.into()) {
            Ok(n) => Ok(n),
            // broadcast::Sender::send only fails when no receiver exists.
            Err(broadcast::error::SendError(_)) => Ok(0),
        }
    }

    /// Subscribe to a specific [`Topic`] channel.
    ///
    /// The returned [`Subscription`] yields only messages published to
    /// that topic, in publish order.
    pub fn subscribe(&self, topic: Topic) -> Subscription {
        Subscription {
            topic,
            receiver: self.topic_sender(topic).subscribe(),
        }
    }

    fn topic_sender(&self, topic: Topic) -> &broadcast::Sender<String> {
        match topic {
            Topic::SonarMeasurement => &self.sonar_measurement,
            Topic::MotorCommand => &self.motor_command,
            Topic::LedCommand => &self.led_command,
            Topic::SpeechCommand => &self.speech_command,
        }
    }
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Subscription
// ---------------------------------------------------------------------------

/// A receiver bound to a single [`Topic`] channel.
///
/// Obtained via [`MessageBus::subscribe`]. Dropping the subscription
/// tears down the receiver; nothing is leaked.
pub struct Subscription {
    topic: Topic,
    receiver: broadcast::Receiver<String>,
}

impl Subscription {
    /// Wait for the next message on this topic.
    ///
    /// Returns `None` once the bus has shut down and no further messages
    /// will arrive. A lagged subscriber logs the drop count and keeps
    /// reading from the oldest retained message.
    pub async fn recv(&mut self) -> Option<String> {
        loop {
            match self.receiver.recv().await {
                Ok(payload) => return Some(payload),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(topic = self.topic.as_str(), lagged_by = n, "subscriber lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking poll for a pending message.
    ///
    /// Returns `None` when nothing is buffered (or the bus has closed).
    /// This is the primitive the bounded-wait sensor read is built on.
    pub fn try_recv(&mut self) -> Option<String> {
        loop {
            match self.receiver.try_recv() {
                Ok(payload) => return Some(payload),
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    warn!(topic = self.topic.as_str(), lagged_by = n, "subscriber lagged");
                    continue;
                }
                Err(broadcast::error::TryRecvError::Empty)
                | Err(broadcast::error::TryRecvError::Closed) => return None,
            }
        }
    }

    /// The [`Topic`] this subscription is bound to.
    pub fn topic(&self) -> Topic {
        self.topic
    }
}
