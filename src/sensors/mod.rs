//! Sensor subsystem — individual drivers and the aggregating [`SensorHub`].
//!
//! The hub owns every sensor driver and produces one fresh
//! [`SensorRecord`] per telemetry cycle through the [`SensorPort`].

pub mod imu;
pub mod sht31;

use crate::app::ports::SensorPort;
use crate::error::SensorError;
use crate::telemetry::record::SensorRecord;

use imu::ImuSensor;
use sht31::Sht31Sensor;

/// Aggregates the SHT31 and IMU into one sampling port.
pub struct SensorHub {
    sht31: Sht31Sensor,
    imu: ImuSensor,
}

impl SensorHub {
    pub fn new() -> Self {
        Self {
            sht31: Sht31Sensor::new(),
            imu: ImuSensor::new(),
        }
    }
}

impl Default for SensorHub {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorPort for SensorHub {
    fn sample(&mut self) -> Result<SensorRecord, SensorError> {
        let (temperature_c, humidity_pct) = self.sht31.read()?;
        let accel = self.imu.read();

        Ok(SensorRecord {
            temperature_c,
            humidity_pct,
            accel,
        })
    }
}
