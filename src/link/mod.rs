//! Wi-Fi connectivity state machine.
//!
//! The network stack delivers [`LinkEvent`]s from its callback context
//! into a bounded channel; the main loop drains them into the
//! [`LinkMonitor`], which owns the one process-wide [`LinkState`] and
//! drives the [`SessionGate`](gate::SessionGate).
//!
//! ```text
//!  Wi-Fi callbacks ──▶ LINK_EVENTS ──▶ LinkMonitor ──▶ SESSION_GATE ──▶ telemetry
//!  (push, no block)    (bounded)       (main loop)     (one waiter)
//! ```
//!
//! Address acquisition — not association — is the authoritative "ready"
//! signal: a session opened before DHCP completes cannot route traffic.
//! The gate is therefore armed on [`LinkEvent::AddressAcquired`] only.
//!
//! ## Reconnection policy
//!
//! On association failure or link loss the monitor retries with an
//! exponential backoff (2 s → 4 s → 8 s … capped at 60 s), reset once
//! the link becomes ready.

pub mod gate;

use core::sync::atomic::{AtomicU8, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::{debug, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::{EventSink, NetworkPort};
use crate::config::SystemConfig;
use gate::SessionGate;

// ───────────────────────────────────────────────────────────────
// Link state (process-wide singleton)
// ───────────────────────────────────────────────────────────────

/// Connectivity lifecycle.  Mutated only by the [`LinkMonitor`]; read
/// anywhere through [`state()`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LinkState {
    Idle = 0,
    Associating = 1,
    Associated = 2,
    LinkReady = 3,
    LinkLost = 4,
}

impl LinkState {
    fn from_repr(raw: u8) -> Self {
        match raw {
            0 => Self::Idle,
            1 => Self::Associating,
            2 => Self::Associated,
            3 => Self::LinkReady,
            4 => Self::LinkLost,
            _ => {
                debug_assert!(false, "invalid link state repr: {raw}");
                Self::Idle
            }
        }
    }
}

static LINK_STATE: AtomicU8 = AtomicU8::new(LinkState::Idle as u8);

/// The current link state, readable from any context.
pub fn state() -> LinkState {
    LinkState::from_repr(LINK_STATE.load(Ordering::Acquire))
}

// ───────────────────────────────────────────────────────────────
// Link events (network stack → monitor)
// ───────────────────────────────────────────────────────────────

/// Connectivity events delivered by the networking subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEvent {
    AssociationStarted,
    AssociationSucceeded,
    AssociationFailed,
    AddressAcquired,
    LinkLost,
}

/// Channel depth for pending link events.
const LINK_EVENT_DEPTH: usize = 8;

static LINK_EVENTS: Channel<CriticalSectionRawMutex, LinkEvent, LINK_EVENT_DEPTH> = Channel::new();

/// Push a link event from the network stack callback.
/// Non-blocking; returns `false` if the channel is full (event dropped).
pub fn push_link_event(event: LinkEvent) -> bool {
    LINK_EVENTS.try_send(event).is_ok()
}

/// Drain one pending link event (main loop consumer).
pub fn try_recv_link_event() -> Option<LinkEvent> {
    LINK_EVENTS.try_receive().ok()
}

/// The readiness gate between the monitor and the telemetry task.
pub static SESSION_GATE: SessionGate = SessionGate::new();

// ───────────────────────────────────────────────────────────────
// Monitor
// ───────────────────────────────────────────────────────────────

/// Drives [`LinkState`] from [`LinkEvent`]s and schedules reconnects.
///
/// Valid edges:
///
/// ```text
/// Idle ──started──▶ Associating ──succeeded──▶ Associated ──address──▶ LinkReady
///                      ▲    │ failed (backoff retry)                      │
///                      │    ▼                                             │ lost
///                      └─ Associating ◀──(reconnect issued)── LinkLost ◀──┘
/// ```
///
/// Any other event/state pair is logged and ignored.
pub struct LinkMonitor {
    state: LinkState,
    backoff_secs: u32,
    backoff_min_secs: u32,
    backoff_max_secs: u32,
    /// Uptime deadline (ms) for the next reconnect attempt, if one is due.
    reconnect_due_ms: Option<u64>,
}

impl LinkMonitor {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            state: LinkState::Idle,
            backoff_secs: config.reconnect_backoff_min_secs,
            backoff_min_secs: config.reconnect_backoff_min_secs,
            backoff_max_secs: config.reconnect_backoff_max_secs,
            reconnect_due_ms: None,
        }
    }

    /// The monitor's view of the link state (same value as [`state()`]).
    pub fn current(&self) -> LinkState {
        self.state
    }

    /// Apply one connectivity event.  `now_ms` is monotonic uptime.
    pub fn handle_event(
        &mut self,
        event: LinkEvent,
        now_ms: u64,
        gate: &SessionGate,
        sink: &mut impl EventSink,
    ) {
        match (self.state, event) {
            (LinkState::Idle, LinkEvent::AssociationStarted) => {
                self.transition(LinkState::Associating, sink);
            }

            (LinkState::Associating, LinkEvent::AssociationStarted) => {
                // Stack echo of a reconnect the monitor already issued.
                debug!("Link: association already in progress");
            }

            (LinkState::Associating, LinkEvent::AssociationSucceeded) => {
                self.transition(LinkState::Associated, sink);
            }

            (LinkState::Associating, LinkEvent::AssociationFailed) => {
                warn!(
                    "Link: association failed, retrying in {}s",
                    self.backoff_secs
                );
                self.schedule_reconnect(now_ms);
            }

            (LinkState::Associated, LinkEvent::AddressAcquired) => {
                self.backoff_secs = self.backoff_min_secs;
                // The LinkReady store must be visible before the gate
                // releases its waiter.
                self.transition(LinkState::LinkReady, sink);
                gate.signal();
                info!("Link: ready, session gate signaled");
            }

            (LinkState::LinkReady, LinkEvent::LinkLost) => {
                // Rearm before the reconnect is scheduled so a stale
                // signal can never release a future waiter early.
                gate.rearm();
                self.transition(LinkState::LinkLost, sink);
                self.reconnect_due_ms = Some(now_ms);
            }

            (state, event) => {
                warn!("Link: ignoring {:?} in {:?}", event, state);
            }
        }
    }

    /// Issue a due reconnect, if any.  Called every control tick.
    pub fn poll(&mut self, now_ms: u64, net: &mut impl NetworkPort, sink: &mut impl EventSink) {
        let Some(due_ms) = self.reconnect_due_ms else {
            return;
        };
        if now_ms < due_ms {
            return;
        }

        self.reconnect_due_ms = None;
        match net.connect() {
            Ok(()) => {
                info!("Link: reconnect issued");
                if self.state == LinkState::LinkLost {
                    self.transition(LinkState::Associating, sink);
                }
            }
            Err(e) => {
                warn!("Link: reconnect request failed ({e}), backing off");
                self.schedule_reconnect(now_ms);
            }
        }
    }

    // ── Internal ──────────────────────────────────────────────

    fn schedule_reconnect(&mut self, now_ms: u64) {
        self.reconnect_due_ms = Some(now_ms + u64::from(self.backoff_secs) * 1000);
        self.backoff_secs = (self.backoff_secs * 2).min(self.backoff_max_secs);
    }

    fn transition(&mut self, next: LinkState, sink: &mut impl EventSink) {
        let prev = self.state;
        self.state = next;
        LINK_STATE.store(next as u8, Ordering::Release);
        sink.emit(&AppEvent::LinkStateChanged {
            from: prev,
            to: next,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::events::AppEvent;
    use crate::error::LinkError;

    struct NullSink;
    impl EventSink for NullSink {
        fn emit(&mut self, _event: &AppEvent) {}
    }

    struct MockNet {
        connects: u32,
        fail: bool,
    }
    impl MockNet {
        fn new() -> Self {
            Self {
                connects: 0,
                fail: false,
            }
        }
    }
    impl NetworkPort for MockNet {
        fn connect(&mut self) -> Result<(), LinkError> {
            self.connects += 1;
            if self.fail {
                Err(LinkError::ConnectRequestFailed)
            } else {
                Ok(())
            }
        }
    }

    fn bring_up(monitor: &mut LinkMonitor, gate: &SessionGate, sink: &mut NullSink) {
        monitor.handle_event(LinkEvent::AssociationStarted, 0, gate, sink);
        monitor.handle_event(LinkEvent::AssociationSucceeded, 10, gate, sink);
        monitor.handle_event(LinkEvent::AddressAcquired, 20, gate, sink);
    }

    #[test]
    fn happy_path_reaches_link_ready_and_signals_gate() {
        let gate = SessionGate::new();
        let mut sink = NullSink;
        let mut monitor = LinkMonitor::new(&SystemConfig::default());

        bring_up(&mut monitor, &gate, &mut sink);
        assert_eq!(monitor.current(), LinkState::LinkReady);
        assert!(gate.is_signaled());
    }

    #[test]
    fn address_before_association_is_ignored() {
        let gate = SessionGate::new();
        let mut sink = NullSink;
        let mut monitor = LinkMonitor::new(&SystemConfig::default());

        monitor.handle_event(LinkEvent::AddressAcquired, 0, &gate, &mut sink);
        assert_eq!(monitor.current(), LinkState::Idle);
        assert!(!gate.is_signaled());
    }

    #[test]
    fn association_failure_schedules_backoff_retry() {
        let gate = SessionGate::new();
        let mut sink = NullSink;
        let mut net = MockNet::new();
        let mut monitor = LinkMonitor::new(&SystemConfig::default());

        monitor.handle_event(LinkEvent::AssociationStarted, 0, &gate, &mut sink);
        monitor.handle_event(LinkEvent::AssociationFailed, 100, &gate, &mut sink);
        assert_eq!(monitor.current(), LinkState::Associating);

        // Not yet due.
        monitor.poll(1_000, &mut net, &mut sink);
        assert_eq!(net.connects, 0);

        // First retry due after the 2s minimum backoff.
        monitor.poll(2_100, &mut net, &mut sink);
        assert_eq!(net.connects, 1);
    }

    #[test]
    fn backoff_doubles_up_to_the_ceiling() {
        let gate = SessionGate::new();
        let mut sink = NullSink;
        let config = SystemConfig::default();
        let mut monitor = LinkMonitor::new(&config);

        monitor.handle_event(LinkEvent::AssociationStarted, 0, &gate, &mut sink);
        let mut now = 0u64;
        for _ in 0..16 {
            monitor.handle_event(LinkEvent::AssociationFailed, now, &gate, &mut sink);
            now += 120_000;
        }
        assert_eq!(monitor.backoff_secs, config.reconnect_backoff_max_secs);
    }

    #[test]
    fn link_loss_rearms_gate_and_reconnects() {
        let gate = SessionGate::new();
        let mut sink = NullSink;
        let mut net = MockNet::new();
        let mut monitor = LinkMonitor::new(&SystemConfig::default());

        bring_up(&mut monitor, &gate, &mut sink);
        monitor.handle_event(LinkEvent::LinkLost, 1_000, &gate, &mut sink);

        assert_eq!(monitor.current(), LinkState::LinkLost);
        assert!(!gate.is_signaled());

        monitor.poll(1_000, &mut net, &mut sink);
        assert_eq!(net.connects, 1);
        assert_eq!(monitor.current(), LinkState::Associating);
    }

    #[test]
    fn failed_reconnect_request_backs_off_again() {
        let gate = SessionGate::new();
        let mut sink = NullSink;
        let mut net = MockNet::new();
        net.fail = true;
        let mut monitor = LinkMonitor::new(&SystemConfig::default());

        bring_up(&mut monitor, &gate, &mut sink);
        monitor.handle_event(LinkEvent::LinkLost, 0, &gate, &mut sink);

        monitor.poll(0, &mut net, &mut sink);
        assert_eq!(net.connects, 1);
        assert_eq!(monitor.current(), LinkState::LinkLost);

        // Second attempt only after the backoff window.
        monitor.poll(500, &mut net, &mut sink);
        assert_eq!(net.connects, 1);
        monitor.poll(2_500, &mut net, &mut sink);
        assert_eq!(net.connects, 2);
    }

    #[test]
    fn second_address_acquisition_signals_again_after_rearm() {
        let gate = SessionGate::new();
        let mut sink = NullSink;
        let mut monitor = LinkMonitor::new(&SystemConfig::default());

        bring_up(&mut monitor, &gate, &mut sink);
        monitor.handle_event(LinkEvent::LinkLost, 0, &gate, &mut sink);
        assert!(!gate.is_signaled());

        monitor.handle_event(LinkEvent::AssociationStarted, 10, &gate, &mut sink);
        monitor.handle_event(LinkEvent::AssociationSucceeded, 20, &gate, &mut sink);
        monitor.handle_event(LinkEvent::AddressAcquired, 30, &gate, &mut sink);
        assert_eq!(monitor.current(), LinkState::LinkReady);
        assert!(gate.is_signaled());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    struct NullSink;
    impl EventSink for NullSink {
        fn emit(&mut self, _event: &AppEvent) {}
    }

    fn arb_event() -> impl Strategy<Value = LinkEvent> {
        prop_oneof![
            Just(LinkEvent::AssociationStarted),
            Just(LinkEvent::AssociationSucceeded),
            Just(LinkEvent::AssociationFailed),
            Just(LinkEvent::AddressAcquired),
            Just(LinkEvent::LinkLost),
        ]
    }

    /// Every edge the monitor can take under any event sequence.
    fn edge_is_valid(from: LinkState, to: LinkState) -> bool {
        use LinkState::*;
        matches!(
            (from, to),
            (Idle, Associating)
                | (Associating, Associated)
                | (Associating, Associating)
                | (Associated, LinkReady)
                | (LinkReady, LinkLost)
                | (LinkLost, LinkLost)
        ) || from == to
    }

    proptest! {
        #[test]
        fn only_enumerated_edges_are_taken(events in proptest::collection::vec(arb_event(), 1..200)) {
            let gate = SessionGate::new();
            let mut sink = NullSink;
            let mut monitor = LinkMonitor::new(&SystemConfig::default());

            let mut now = 0u64;
            for event in events {
                let before = monitor.current();
                monitor.handle_event(event, now, &gate, &mut sink);
                let after = monitor.current();
                prop_assert!(
                    edge_is_valid(before, after),
                    "invalid edge {:?} -> {:?} on {:?}", before, after, event
                );
                now += 50;
            }
        }

        #[test]
        fn gate_is_signaled_iff_link_ready(events in proptest::collection::vec(arb_event(), 1..200)) {
            let gate = SessionGate::new();
            let mut sink = NullSink;
            let mut monitor = LinkMonitor::new(&SystemConfig::default());

            for (i, event) in events.into_iter().enumerate() {
                monitor.handle_event(event, i as u64 * 50, &gate, &mut sink);
                if monitor.current() == LinkState::LinkReady {
                    prop_assert!(gate.is_signaled());
                } else if monitor.current() == LinkState::LinkLost {
                    prop_assert!(!gate.is_signaled());
                }
            }
        }
    }
}
