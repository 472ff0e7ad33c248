//! Periodic sensor telemetry over MQTT.
//!
//! The publisher task blocks on the session gate until the link is
//! ready, opens a session, then runs a fixed-period sample → encode →
//! publish cycle.  Every cycle is independent: a failed sample or
//! publish is logged and dropped, never retried, and never stalls the
//! loop (at-most-once delivery).

pub mod publisher;
pub mod record;
pub mod task;

use serde::{Deserialize, Serialize};

/// MQTT publish quality of service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum QoS {
    AtMostOnce = 0,
    AtLeastOnce = 1,
    ExactlyOnce = 2,
}
