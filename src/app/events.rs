//! Outbound application events.
//!
//! The core subsystems emit these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them — today they go to the serial log.

use crate::error::Error;
use crate::link::LinkState;

/// Structured events emitted by the core.
#[derive(Debug, Clone, Copy)]
pub enum AppEvent {
    /// The connectivity state machine took an edge.
    LinkStateChanged { from: LinkState, to: LinkState },

    /// A telemetry session was opened on the broker.
    SessionOpened,

    /// The telemetry session was torn down (link loss).
    SessionClosed,

    /// A sensor record went out.
    Published { bytes: usize },

    /// A telemetry cycle was skipped; the contained failure.
    CycleSkipped(Error),

    /// An alarm run started.
    AlarmStarted,

    /// An alarm run was cancelled and the outputs forced off.
    AlarmCancelled,
}
