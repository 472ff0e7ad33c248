//! Async telemetry task — gate-blocked, timer-driven publish loop.
//!
//! Runs in a dedicated thread using `edge-executor` for cooperative
//! scheduling and `async-io-mini` for the reactor-driven period timer.
//! The loop suspends on the session gate until the link monitor signals
//! readiness; after that first unblock the cadence comes from the timer
//! alone — the gate is not consulted again until the link drops.
//!
//! ```text
//!  ┌───────────────────────────────────────────────────────────┐
//!  │  Telemetry Thread                                         │
//!  │  block_on(executor.run(..))                               │
//!  │   └─ publish_loop:                                        │
//!  │        SESSION_GATE.wait().await   ◀─ link monitor        │
//!  │        open session (retry per tick)                      │
//!  │        loop every 5s: sample → encode → publish           │
//!  │        link lost → drop session → back to wait()          │
//!  └───────────────────────────────────────────────────────────┘
//! ```

use core::time::Duration;

use log::{info, warn};

use crate::adapters::log_sink::LogEventSink;
use crate::app::events::AppEvent;
use crate::app::ports::{EventSink, SensorPort, TelemetryTransport};
use crate::config::SystemConfig;
use crate::drivers::task_pin;
use crate::link::{self, LinkState, SESSION_GATE};

use super::publisher::TelemetryPublisher;

/// Spawn the telemetry task in a dedicated thread pinned to Core 0
/// (PRO_CPU, co-located with lwIP for cache-local network I/O).
pub fn spawn<T, S>(
    config: SystemConfig,
    transport: T,
    sensors: S,
) -> std::thread::JoinHandle<()>
where
    T: TelemetryTransport + Send + 'static,
    S: SensorPort + Send + 'static,
{
    task_pin::spawn_on_core(task_pin::Core::Pro, 5, 12, "telemetry\0", move || {
        run_telemetry_loop(config, transport, sensors);
    })
}

fn run_telemetry_loop<T, S>(config: SystemConfig, transport: T, sensors: S)
where
    T: TelemetryTransport + Send + 'static,
    S: SensorPort + Send + 'static,
{
    let executor: edge_executor::LocalExecutor<'_, 2> = edge_executor::LocalExecutor::new();

    executor
        .spawn(publish_loop(config, transport, sensors))
        .detach();

    info!("Telemetry task started (gate-blocked)");

    // block_on drives the async-io-mini reactor (the period timer)
    // while the executor drives the publish loop.
    futures_lite::future::block_on(executor.run(core::future::pending::<()>()));
}

async fn publish_loop<T, S>(config: SystemConfig, mut transport: T, mut sensors: S)
where
    T: TelemetryTransport,
    S: SensorPort,
{
    let mut publisher = TelemetryPublisher::new(&config);
    let mut sink = LogEventSink::new();
    let interval = Duration::from_millis(u64::from(config.telemetry_interval_ms));

    loop {
        // Suspends until the link monitor arms the gate.  Released
        // exactly once per connection establishment.
        SESSION_GATE.wait().await;
        info!("Telemetry: link ready, starting session");

        let mut session: Option<T::Session> = None;

        while link::state() == LinkState::LinkReady {
            if session.is_none() {
                match transport.open() {
                    Ok(s) => {
                        session = Some(s);
                        sink.emit(&AppEvent::SessionOpened);
                    }
                    Err(e) => {
                        warn!("Telemetry: session open failed ({e}), retrying next tick");
                    }
                }
            }

            if let Some(s) = session.as_mut() {
                let _ = publisher.cycle(&mut sensors, &mut transport, s, &mut sink);
            }

            async_io_mini::Timer::after(interval).await;
        }

        if session.take().is_some() {
            sink.emit(&AppEvent::SessionClosed);
        }
        info!(
            "Telemetry: link down, session torn down ({} published, {} skipped)",
            publisher.published(),
            publisher.skipped()
        );
    }
}
