//! Unified error types for the Saturn node firmware.
//!
//! Follows embedded best practice: a single `Error` enum that every subsystem
//! can convert into, keeping the top-level control loop's error handling uniform.
//! All variants are `Copy` so they can be cheaply passed through the link
//! monitor and telemetry cycle without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A sensor could not be read or returned implausible data.
    Sensor(SensorError),
    /// Opening or publishing on the telemetry channel failed.
    Transport(TransportError),
    /// A connectivity operation failed.
    Link(LinkError),
    /// A fixed-capacity resource was exhausted.
    Capacity(CapacityError),
    /// Peripheral or runtime initialisation failed.
    Init(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Transport(e) => write!(f, "transport: {e}"),
            Self::Link(e) => write!(f, "link: {e}"),
            Self::Capacity(e) => write!(f, "capacity: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

/// Transient sampling failures.  Contained within the telemetry cycle that
/// observed them — the next cycle starts from a clean slate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// I2C transaction failed or timed out.
    BusError,
    /// Measurement frame failed its CRC check.
    CrcMismatch,
    /// Reading is outside the physically plausible range.
    OutOfRange,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BusError => write!(f, "I2C bus error"),
            Self::CrcMismatch => write!(f, "CRC mismatch"),
            Self::OutOfRange => write!(f, "reading out of range"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Transport errors
// ---------------------------------------------------------------------------

/// Telemetry channel failures.  Like sensor errors these never escape the
/// cycle that hit them; the record is dropped and the loop continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// Session could not be opened (broker unreachable, handshake failed).
    OpenFailed,
    /// Publish was rejected or the connection dropped mid-send.
    PublishFailed,
    /// No open session to publish on.
    NotConnected,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OpenFailed => write!(f, "session open failed"),
            Self::PublishFailed => write!(f, "publish failed"),
            Self::NotConnected => write!(f, "no open session"),
        }
    }
}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

// ---------------------------------------------------------------------------
// Link errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    /// The Wi-Fi driver rejected the (re)connect request.
    ConnectRequestFailed,
    /// Association with the access point failed; retried with backoff.
    AssociationFailed,
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectRequestFailed => write!(f, "connect request failed"),
            Self::AssociationFailed => write!(f, "association failed"),
        }
    }
}

impl From<LinkError> for Error {
    fn from(e: LinkError) -> Self {
        Self::Link(e)
    }
}

// ---------------------------------------------------------------------------
// Capacity errors
// ---------------------------------------------------------------------------

/// A fixed-capacity resource overflowed.  Surfaced to the caller that
/// requested the allocation; never retried internally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityError {
    /// The alarm pattern does not fit its fixed-capacity slot.
    AlarmPattern,
    /// The ISR event queue was full and an event was dropped.
    EventQueue,
}

impl fmt::Display for CapacityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlarmPattern => write!(f, "alarm pattern overflow"),
            Self::EventQueue => write!(f, "event queue full"),
        }
    }
}

impl From<CapacityError> for Error {
    fn from(e: CapacityError) -> Self {
        Self::Capacity(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
