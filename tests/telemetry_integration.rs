//! Integration tests: gate release → session open → periodic cycles.

use futures_lite::future::{block_on, poll_once};

use saturn_node::app::events::AppEvent;
use saturn_node::app::ports::{EventSink, SensorPort, TelemetryTransport};
use saturn_node::config::SystemConfig;
use saturn_node::error::{SensorError, TransportError};
use saturn_node::link::gate::SessionGate;
use saturn_node::telemetry::publisher::{CycleOutcome, TelemetryPublisher};
use saturn_node::telemetry::record::{Accel, SensorRecord};
use saturn_node::telemetry::QoS;

// ── Mock implementations ──────────────────────────────────────

struct CountingSink {
    published: u32,
    skipped: u32,
}

impl EventSink for CountingSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Published { .. } => self.published += 1,
            AppEvent::CycleSkipped(_) => self.skipped += 1,
            _ => {}
        }
    }
}

struct FlakySensor {
    calls: u32,
    fail_every: u32,
}

impl SensorPort for FlakySensor {
    fn sample(&mut self) -> Result<SensorRecord, SensorError> {
        self.calls += 1;
        if self.fail_every != 0 && self.calls % self.fail_every == 0 {
            return Err(SensorError::BusError);
        }
        Ok(SensorRecord {
            temperature_c: 24.0 + self.calls as f32 * 0.1,
            humidity_pct: 55.0,
            accel: Accel {
                x: 1.0,
                y: 1.0,
                z: 1.0,
            },
        })
    }
}

#[derive(Default)]
struct RecordingTransport {
    open_calls: u32,
    fail_opens_remaining: u32,
    published: Vec<(String, Vec<u8>, QoS)>,
}

struct OpenSession;

impl TelemetryTransport for RecordingTransport {
    type Session = OpenSession;

    fn open(&mut self) -> Result<OpenSession, TransportError> {
        self.open_calls += 1;
        if self.fail_opens_remaining > 0 {
            self.fail_opens_remaining -= 1;
            return Err(TransportError::OpenFailed);
        }
        Ok(OpenSession)
    }

    fn publish(
        &mut self,
        _session: &mut OpenSession,
        topic: &str,
        payload: &[u8],
        qos: QoS,
    ) -> Result<(), TransportError> {
        self.published.push((topic.into(), payload.to_vec(), qos));
        Ok(())
    }
}

// ── Session lifecycle gated on readiness ──────────────────────

#[test]
fn session_opens_only_after_the_gate_releases() {
    let gate = SessionGate::new();
    let mut transport = RecordingTransport::default();

    // The consumer blocks; nothing may be opened yet.
    assert_eq!(block_on(poll_once(gate.wait())), None);
    assert_eq!(transport.open_calls, 0);

    gate.signal();
    assert_eq!(block_on(poll_once(gate.wait())), Some(()));
    let session = transport.open().unwrap();
    assert_eq!(transport.open_calls, 1);
    drop(session);
}

#[test]
fn open_failure_is_retried_on_the_next_tick() {
    let mut transport = RecordingTransport::default();
    transport.fail_opens_remaining = 2;

    // The publish loop retries open once per period until it sticks.
    assert!(transport.open().is_err());
    assert!(transport.open().is_err());
    assert!(transport.open().is_ok());
    assert_eq!(transport.open_calls, 3);
}

// ── Periodic cycles with contained failures ───────────────────

#[test]
fn publish_count_equals_cycles_minus_failed_samples() {
    let config = SystemConfig::default();
    let mut publisher = TelemetryPublisher::new(&config);
    let mut sensors = FlakySensor {
        calls: 0,
        fail_every: 3,
    };
    let mut transport = RecordingTransport::default();
    let mut session = transport.open().unwrap();
    let mut sink = CountingSink {
        published: 0,
        skipped: 0,
    };

    const N: u32 = 12;
    let mut outcomes = Vec::new();
    for _ in 0..N {
        outcomes.push(publisher.cycle(&mut sensors, &mut transport, &mut session, &mut sink));
    }

    // Every third sample fails: 12 cycles, 4 failures.
    assert_eq!(publisher.published(), u64::from(N) - 4);
    assert_eq!(publisher.skipped(), 4);
    assert_eq!(sink.published, N - 4);
    assert_eq!(sink.skipped, 4);

    // No cycle blocks on a prior failure: outcomes interleave cleanly.
    assert_eq!(outcomes[1], CycleOutcome::Published);
    assert_eq!(outcomes[2], CycleOutcome::SkippedSensor);
    assert_eq!(outcomes[3], CycleOutcome::Published);
}

#[test]
fn published_payloads_carry_topic_qos_and_json_record() {
    let config = SystemConfig::default();
    let mut publisher = TelemetryPublisher::new(&config);
    let mut sensors = FlakySensor {
        calls: 0,
        fail_every: 0,
    };
    let mut transport = RecordingTransport::default();
    let mut session = transport.open().unwrap();
    let mut sink = CountingSink {
        published: 0,
        skipped: 0,
    };

    publisher.cycle(&mut sensors, &mut transport, &mut session, &mut sink);

    let (topic, payload, qos) = &transport.published[0];
    assert_eq!(topic, config.telemetry_topic.as_str());
    assert_eq!(*qos, config.telemetry_qos);

    let json: serde_json::Value = serde_json::from_slice(payload).unwrap();
    assert!(json["temp"].is_number());
    assert!(json["hum"].is_number());
    assert_eq!(json["acc"]["z"], 1.0);
}

// ── Reconnection round-trip: gate rules the session lifetime ──

#[test]
fn session_is_recreated_per_gate_signal() {
    let gate = SessionGate::new();
    let mut transport = RecordingTransport::default();

    gate.signal();
    assert_eq!(block_on(poll_once(gate.wait())), Some(()));
    let first = transport.open().unwrap();

    // Link loss: monitor rearms the gate; the task drops its session.
    gate.rearm();
    drop(first);
    assert_eq!(block_on(poll_once(gate.wait())), None);

    // Next establishment: a second, distinct session is opened.
    gate.signal();
    assert_eq!(block_on(poll_once(gate.wait())), Some(()));
    let _second = transport.open().unwrap();
    assert_eq!(transport.open_calls, 2);
}
