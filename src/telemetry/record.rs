//! Sensor record and wire encoding.
//!
//! One record is built fresh per sampling cycle, encoded to JSON, and
//! forgotten after the publish attempt — only the freshest state matters.
//!
//! Wire shape (field names are part of the broker contract):
//!
//! ```json
//! {"temp": 23.4, "hum": 51.2, "acc": {"x": 1.0, "y": 1.0, "z": 1.0}}
//! ```

use serde::Serialize;

/// Accelerometer axes in g.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Accel {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// A point-in-time sensor snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SensorRecord {
    /// Ambient temperature in °C.
    #[serde(rename = "temp")]
    pub temperature_c: f32,
    /// Relative humidity in %.
    #[serde(rename = "hum")]
    pub humidity_pct: f32,
    #[serde(rename = "acc")]
    pub accel: Accel,
}

/// Encode a record to its JSON wire form.
///
/// Fails only on non-finite floats (JSON has no NaN/Inf); sensors
/// validate for finiteness, so a failure here is a publish failure
/// like any other and is contained in its cycle.
pub fn encode_record(record: &SensorRecord) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(record)
}
