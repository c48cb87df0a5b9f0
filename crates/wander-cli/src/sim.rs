//! Simulated subsystems for running the behavior without hardware.
//!
//! Spawns a sonar task that publishes a deterministic approach/retreat
//! distance pattern, plus echo sinks that log every command received on
//! the actuator topics. Together they let the full wander loop run
//! headless in development and demos.

use std::time::Duration;

use tracing::info;
use wander_bus::{MessageBus, Subscription, Topic};

/// How often the simulated sonar publishes a measurement.
const SONAR_INTERVAL: Duration = Duration::from_millis(100);

/// Starting distance after each simulated turn-away.
const FAR_DISTANCE: f64 = 200.0;

/// How much closer the simulated wall gets per measurement.
const APPROACH_STEP: f64 = 15.0;

/// Below this the simulation assumes the robot has turned away.
const RESET_DISTANCE: f64 = 25.0;

/// Spawn the simulated sonar and one echo sink per actuator topic.
pub fn spawn_subsystems(bus: &MessageBus) {
    spawn_sonar(bus.clone());
    spawn_sink(bus.subscribe(Topic::MotorCommand));
    spawn_sink(bus.subscribe(Topic::LedCommand));
    spawn_sink(bus.subscribe(Topic::SpeechCommand));
}

/// Next measurement in the approach/retreat pattern.
fn next_distance(current: f64) -> f64 {
    let closer = current - APPROACH_STEP;
    if closer < RESET_DISTANCE {
        FAR_DISTANCE
    } else {
        closer
    }
}

fn spawn_sonar(bus: MessageBus) {
    tokio::spawn(async move {
        let mut distance = FAR_DISTANCE;
        loop {
            // Fire-and-forget; the reader may not be polling right now.
            let _ = bus.publish(Topic::SonarMeasurement, distance.to_string());
            distance = next_distance(distance);
            tokio::time::sleep(SONAR_INTERVAL).await;
        }
    });
}

fn spawn_sink(mut sub: Subscription) {
    tokio::spawn(async move {
        while let Some(payload) = sub.recv().await {
            info!(topic = sub.topic().as_str(), payload = %payload, "subsystem received command");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulated_wall_eventually_gets_close() {
        let mut distance = FAR_DISTANCE;
        let mut saw_obstacle = false;
        for _ in 0..50 {
            distance = next_distance(distance);
            if distance < 40.0 {
                saw_obstacle = true;
                break;
            }
        }
        assert!(saw_obstacle, "the pattern must dip below the threshold");
    }

    #[test]
    fn pattern_resets_after_the_turn_away() {
        // One step past the reset point jumps back to the far distance.
        let close = RESET_DISTANCE + APPROACH_STEP - 1.0;
        assert_eq!(next_distance(close), FAR_DISTANCE);
    }
}
