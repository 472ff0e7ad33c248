//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).
//! A future diagnostics-topic adapter would implement the same trait.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::LinkStateChanged { from, to } => {
                info!("LINK  | {:?} -> {:?}", from, to);
            }
            AppEvent::SessionOpened => {
                info!("TELEM | session opened");
            }
            AppEvent::SessionClosed => {
                info!("TELEM | session closed");
            }
            AppEvent::Published { bytes } => {
                info!("TELEM | published {} bytes", bytes);
            }
            AppEvent::CycleSkipped(err) => {
                warn!("TELEM | cycle skipped: {}", err);
            }
            AppEvent::AlarmStarted => {
                info!("ALARM | run started");
            }
            AppEvent::AlarmCancelled => {
                info!("ALARM | run cancelled, outputs off");
            }
        }
    }
}
