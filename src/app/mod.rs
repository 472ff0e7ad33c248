//! Application boundary — port traits and domain events, zero I/O.
//!
//! The core subsystems (link monitor, alarm sequencer, telemetry
//! publisher) interact with hardware and the network only through the
//! **port traits** defined in [`ports`], keeping every one of them
//! testable without real peripherals.  Structured [`events`] flow the
//! other way, from the core out to whatever sink is wired in.

pub mod events;
pub mod ports;
