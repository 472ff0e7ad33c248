//! The sample → encode → publish cycle.
//!
//! Pure cycle logic, separated from the async task driver so it can be
//! exercised with mock ports.  Failure containment lives here: a sensor
//! or transport error marks the cycle skipped and is reported through
//! the event sink, but state never leaks into the next cycle.

use log::warn;

use crate::app::events::AppEvent;
use crate::app::ports::{EventSink, SensorPort, TelemetryTransport};
use crate::config::SystemConfig;
use crate::error::{Error, TransportError};

use super::record::encode_record;
use super::QoS;

/// What a single cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// A record was published.
    Published,
    /// Sampling failed; nothing was published.
    SkippedSensor,
    /// Encoding or publishing failed; the record was discarded.
    SkippedPublish,
}

/// Runs the periodic telemetry cycle against injected ports.
pub struct TelemetryPublisher {
    topic: heapless::String<48>,
    qos: QoS,
    published: u64,
    skipped: u64,
}

impl TelemetryPublisher {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            topic: config.telemetry_topic.clone(),
            qos: config.telemetry_qos,
            published: 0,
            skipped: 0,
        }
    }

    /// Records successfully published since startup.
    pub fn published(&self) -> u64 {
        self.published
    }

    /// Cycles skipped due to a contained failure.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Run one cycle: sample, encode, publish.
    ///
    /// Every failure is contained here — the caller's loop keeps its
    /// fixed period regardless of the outcome.
    pub fn cycle<T: TelemetryTransport>(
        &mut self,
        sensors: &mut impl SensorPort,
        transport: &mut T,
        session: &mut T::Session,
        sink: &mut impl EventSink,
    ) -> CycleOutcome {
        let record = match sensors.sample() {
            Ok(r) => r,
            Err(e) => {
                warn!("Telemetry: sample failed ({e}), cycle skipped");
                self.skipped += 1;
                sink.emit(&AppEvent::CycleSkipped(Error::Sensor(e)));
                return CycleOutcome::SkippedSensor;
            }
        };

        let payload = match encode_record(&record) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Telemetry: encode failed ({e}), record discarded");
                self.skipped += 1;
                sink.emit(&AppEvent::CycleSkipped(Error::Transport(
                    TransportError::PublishFailed,
                )));
                return CycleOutcome::SkippedPublish;
            }
        };

        match transport.publish(session, self.topic.as_str(), &payload, self.qos) {
            Ok(()) => {
                self.published += 1;
                sink.emit(&AppEvent::Published {
                    bytes: payload.len(),
                });
                CycleOutcome::Published
            }
            Err(e) => {
                warn!("Telemetry: publish failed ({e}), record discarded");
                self.skipped += 1;
                sink.emit(&AppEvent::CycleSkipped(Error::Transport(e)));
                CycleOutcome::SkippedPublish
            }
        }
    }
}
