//! Saturn Node Firmware — Main Entry Point
//!
//! Hexagonal architecture with an event-driven control loop and a
//! gate-blocked telemetry task.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  WifiLink        MqttTransport     SensorHub     LogEventSink  │
//! │  (NetworkPort)   (TelemetryTransport) (SensorPort) (EventSink) │
//! │  AlarmOutputBank (AlarmOutputPort)  Esp32TimeAdapter           │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │  LinkMonitor · SessionGate · AlarmSequencer ·          │    │
//! │  │  TelemetryPublisher          (pure logic)              │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Button ISRs → event queue → main loop (50ms control tick)     │
//! │  Wi-Fi events → link channel → LinkMonitor → gate → telemetry  │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

// ── Module declarations ───────────────────────────────────────
pub mod config;
mod error;
mod events;
mod pins;

pub mod alarm;
pub mod link;
pub mod telemetry;

mod adapters;
pub mod app;
mod drivers;
mod sensors;

// ── Imports ───────────────────────────────────────────────────
use anyhow::Result;
use log::{info, warn};

use adapters::log_sink::LogEventSink;
use adapters::mqtt::MqttTransport;
use adapters::time::Esp32TimeAdapter;
use adapters::wifi::WifiLink;
use alarm::{AlarmSequencer, CancelOutcome, StartOutcome};
use app::events::AppEvent;
use app::ports::{AlarmOutputPort, EventSink};
use config::SystemConfig;
use drivers::alarm_out::AlarmOutputBank;
use drivers::watchdog::Watchdog;
use events::Event;
use link::LinkMonitor;
use sensors::SensorHub;

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Saturn node v{}                    ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Hardware peripherals ───────────────────────────────
    if let Err(e) = drivers::hw_init::init_peripherals() {
        // Peripheral init failure is critical — log and halt.
        // In production this triggers the watchdog reset after timeout.
        log::error!("HAL init failed: {} — halting", e);
        #[allow(clippy::empty_loop)]
        loop {}
    }
    if let Err(e) = drivers::hw_init::init_isr_service() {
        log::error!("ISR service init failed: {} — alarm buttons disabled", e);
    } else if let Err(rc) = drivers::buttons::register_isr_handlers() {
        log::error!("Button ISR registration failed (rc={}) — alarm buttons disabled", rc);
    }
    let watchdog = Watchdog::new();

    // ── 3. Configuration ──────────────────────────────────────
    // Credentials and broker address are compiled in (or defaulted);
    // provisioning and persistence live outside this firmware.
    let config = SystemConfig::default();

    let time = Esp32TimeAdapter::new();
    let mut sink = LogEventSink::new();

    // ── 4. Wi-Fi bring-up ─────────────────────────────────────
    // Association runs asynchronously from here on; progress arrives
    // as link events.
    let mut net = WifiLink::start(&config).map_err(|e| anyhow::anyhow!("wifi init: {e}"))?;

    // ── 5. Telemetry task ─────────────────────────────────────
    // Blocks on the session gate until the link monitor signals
    // readiness; all sampling and publishing happens on that thread.
    let transport = MqttTransport::new(&config);
    let sensors = SensorHub::new();
    let _telemetry = telemetry::task::spawn(config.clone(), transport, sensors);

    // ── 6. Core state machines ────────────────────────────────
    let mut monitor = LinkMonitor::new(&config);
    let mut sequencer = AlarmSequencer::new(&config);
    let mut outputs = AlarmOutputBank::new();

    drivers::hw_timer::start_control_timer(config.control_loop_interval_ms);
    info!("System ready. Entering control loop.");

    // ── 7. Control loop ───────────────────────────────────────
    loop {
        // Simulate the control tick timer via sleep on non-espidf
        // targets.  On real hardware the esp_timer callback pushes
        // ControlTick at the configured interval.
        #[cfg(not(target_os = "espidf"))]
        {
            std::thread::sleep(std::time::Duration::from_millis(u64::from(
                config.control_loop_interval_ms,
            )));
            events::push_event(Event::ControlTick);
        }

        let now_ms = time.uptime_ms();

        // Process all pending events.
        events::drain_events(|event| match event {
            Event::ControlTick => {
                // Advance the alarm run and apply all four output
                // levels in one call.
                let levels = sequencer.tick(config.control_loop_interval_ms);
                outputs.set(
                    levels.buzzer,
                    levels.led_blue,
                    levels.led_red,
                    levels.led_green,
                );
            }

            Event::AlarmStartRequest => match sequencer.start() {
                Ok(StartOutcome::Started) => sink.emit(&AppEvent::AlarmStarted),
                Ok(StartOutcome::AlreadyRunning) => {}
                Err(e) => warn!("Alarm: start rejected ({})", e),
            },

            Event::AlarmStopRequest => {
                if sequencer.cancel() == CancelOutcome::Cancelled {
                    sink.emit(&AppEvent::AlarmCancelled);
                }
            }
        });

        // Drain link events into the monitor, then let it issue any
        // due reconnect.
        while let Some(ev) = link::try_recv_link_event() {
            monitor.handle_event(ev, now_ms, &link::SESSION_GATE, &mut sink);
        }
        monitor.poll(now_ms, &mut net, &mut sink);

        // Feed watchdog on every iteration.
        watchdog.feed();
    }
}
