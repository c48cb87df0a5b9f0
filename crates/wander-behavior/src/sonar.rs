//! [`SonarReader`] – bounded-wait acquisition of distance measurements.
//!
//! The reader holds one persistent subscription to the sonar topic,
//! created before any motion command can be published so the very first
//! measurement cannot be missed. Each [`read_distance`] call returns the
//! newest measurement available within a wall-clock budget, or fails with
//! [`WanderError::SensorTimeout`] when the bus stays silent.
//!
//! No retry happens here; the one budget window is the only allowance and
//! retry policy belongs to the caller.
//!
//! [`read_distance`]: SonarReader::read_distance

use std::time::{Duration, Instant};

use tracing::{debug, error};
use wander_bus::{MessageBus, Subscription, Topic};
use wander_types::WanderError;

/// Interval between non-blocking polls while waiting for a measurement.
pub const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Default wall-clock budget for a single read.
pub const DEFAULT_READ_BUDGET: Duration = Duration::from_millis(500);

/// Reads distance measurements from the sonar topic.
///
/// Owns the subscription for its whole lifetime; dropping the reader
/// releases it. At most one read is in flight at a time (`&mut self`).
pub struct SonarReader {
    sub: Subscription,
}

impl SonarReader {
    /// Subscribe to the sonar topic.
    ///
    /// Call this before publishing anything that could trigger a
    /// measurement, so no message can slip past between motion start and
    /// the first read.
    pub fn attach(bus: &MessageBus) -> Self {
        Self {
            sub: bus.subscribe(Topic::SonarMeasurement),
        }
    }

    /// Return the newest distance measurement, waiting at most `budget`.
    ///
    /// Any backlog that accumulated since the previous read is drained
    /// first; the newest buffered measurement wins because every older
    /// one has been superseded. Only when nothing is buffered does the
    /// reader poll every [`POLL_INTERVAL`] until a message arrives or
    /// the budget is exhausted.
    ///
    /// # Errors
    ///
    /// - [`WanderError::SensorTimeout`] – no measurement within `budget`.
    /// - [`WanderError::Payload`] – the payload is not a bare JSON number.
    pub async fn read_distance(&mut self, budget: Duration) -> Result<f64, WanderError> {
        let mut newest = None;
        while let Some(payload) = self.sub.try_recv() {
            newest = Some(payload);
        }
        if let Some(payload) = newest {
            return self.parse(&payload);
        }

        let start = Instant::now();
        loop {
            if let Some(payload) = self.sub.try_recv() {
                return self.parse(&payload);
            }
            if start.elapsed() >= budget {
                error!(budget = ?budget, "unable to get sonar measurement");
                return Err(WanderError::SensorTimeout(budget));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    fn parse(&self, payload: &str) -> Result<f64, WanderError> {
        let distance: f64 =
            serde_json::from_str(payload).map_err(|e| WanderError::Payload {
                topic: self.sub.topic().as_str().to_string(),
                details: e.to_string(),
            })?;
        debug!(distance, "sonar measurement");
        Ok(distance)
    }
}
