//! Session gate — a single-consumer, re-armable readiness gate.
//!
//! The link monitor signals the gate exactly once per connection
//! establishment; the telemetry task blocks in `wait()` until then and
//! does not touch the gate again for that connection's lifetime.  On
//! link loss the monitor re-arms the gate so the next address
//! acquisition can release the next wait.
//!
//! ```text
//!   LinkMonitor ──signal()──▶ ┌─────────────┐ ──wait().await──▶ telemetry task
//!   LinkMonitor ──rearm()───▶ │ SessionGate │
//!                             └─────────────┘
//! ```
//!
//! ## Usage constraint
//!
//! At most one task may be blocked in `wait()` at a time.  The firmware
//! has exactly one consumer (the telemetry task); concurrent waiters are
//! not supported and the release order among them would be unspecified.

use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;

/// Single-slot synchronization object with states Unsignaled / Signaled.
///
/// - [`signal`](Self::signal) — Unsignaled→Signaled, releasing one pending
///   waiter; idempotent while already Signaled.
/// - [`wait`](Self::wait) — suspends until Signaled; returns immediately
///   if the gate is already Signaled.
/// - [`rearm`](Self::rearm) — Signaled→Unsignaled; no effect if already
///   Unsignaled.
pub struct SessionGate {
    /// Latch: true while the gate is Signaled.  The swap in `signal()`
    /// guarantees a single Unsignaled→Signaled transition releases a
    /// single waiter — double release requires an intervening `rearm()`.
    signaled: AtomicBool,
    inner: Signal<CriticalSectionRawMutex, ()>,
}

impl SessionGate {
    pub const fn new() -> Self {
        Self {
            signaled: AtomicBool::new(false),
            inner: Signal::new(),
        }
    }

    /// Move the gate to Signaled and release the pending waiter, if any.
    /// Calling this while already Signaled is a no-op.
    pub fn signal(&self) {
        if !self.signaled.swap(true, Ordering::AcqRel) {
            self.inner.signal(());
        }
    }

    /// Return the gate to Unsignaled so a future `signal()` can release
    /// the next waiter.  No effect while Unsignaled.
    pub fn rearm(&self) {
        self.signaled.store(false, Ordering::Release);
        self.inner.reset();
    }

    /// Suspend the calling task until the gate is Signaled.  Returns
    /// immediately if it already is.
    pub async fn wait(&self) {
        if self.signaled.load(Ordering::Acquire) {
            return;
        }
        // If signal() lands between the check above and this await, the
        // inner Signal already holds the token and resolves immediately.
        self.inner.wait().await;
    }

    /// Current gate state (diagnostics / tests).
    pub fn is_signaled(&self) -> bool {
        self.signaled.load(Ordering::Acquire)
    }
}

impl Default for SessionGate {
    fn default() -> Self {
        Self::new()
    }
}
