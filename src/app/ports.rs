//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ core (link / alarm / telemetry)
//! ```
//!
//! Driven adapters (sensors, alarm outputs, MQTT, Wi-Fi, event sinks)
//! implement these traits.  The core consumes them via generics, so it
//! never touches hardware directly and every subsystem runs against
//! mocks on the host.

use crate::error::{LinkError, SensorError, TransportError};
use crate::telemetry::record::SensorRecord;
use crate::telemetry::QoS;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: one fresh snapshot per telemetry cycle.
pub trait SensorPort {
    fn sample(&mut self) -> Result<SensorRecord, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Alarm output port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port for the four alarm outputs.
///
/// `set` applies all four levels in one call — callers never observe a
/// partially-updated output bank.  There is no error return: a hardware
/// fault is not observable at this layer.
pub trait AlarmOutputPort {
    fn set(&mut self, buzzer: bool, led_blue: bool, led_red: bool, led_green: bool);

    /// Force the safe state.
    fn all_off(&mut self) {
        self.set(false, false, false, false);
    }
}

// ───────────────────────────────────────────────────────────────
// Network port (driven adapter: domain → Wi-Fi driver)
// ───────────────────────────────────────────────────────────────

/// (Re)initiates link-layer association.  Completion and failure arrive
/// asynchronously as [`LinkEvent`](crate::link::LinkEvent)s.
pub trait NetworkPort {
    fn connect(&mut self) -> Result<(), LinkError>;
}

// ───────────────────────────────────────────────────────────────
// Telemetry transport (driven adapter: domain → broker)
// ───────────────────────────────────────────────────────────────

/// Publish channel to the telemetry broker.
///
/// The session handle is opaque to the core: created once the link is
/// ready, dropped on link loss, recreated on the next readiness signal.
pub trait TelemetryTransport {
    type Session;

    fn open(&mut self) -> Result<Self::Session, TransportError>;

    fn publish(
        &mut self,
        session: &mut Self::Session,
        topic: &str,
        payload: &[u8],
        qos: QoS,
    ) -> Result<(), TransportError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / observability)
// ───────────────────────────────────────────────────────────────

/// The core emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go (serial log today;
/// a diagnostics topic would implement the same trait).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
