//! SHT31 temperature/humidity sensor (I2C, single-shot mode).
//!
//! Each sample issues a high-repeatability measurement command, waits
//! out the conversion, and reads a 6-byte frame: temperature word, CRC,
//! humidity word, CRC.  Conversion formulas and the CRC-8 (poly 0x31,
//! init 0xFF) come from the Sensirion datasheet.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: transacts on the I2C master bus initialised by hw_init.
//! On host/test: synthesizes frames from injectable atomics, so the
//! parse/CRC/conversion path is identical on both targets.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicBool, AtomicU16, Ordering};

use crate::error::SensorError;

#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;

/// Single-shot measurement, high repeatability, clock stretching disabled.
#[cfg(target_os = "espidf")]
const CMD_MEASURE_HIGHREP: [u8; 2] = [0x24, 0x00];

/// Worst-case high-repeatability conversion time.
#[cfg(target_os = "espidf")]
const MEASURE_DELAY_MS: u64 = 16;

// ── Simulation injection ──────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
static SIM_TEMP_RAW: AtomicU16 = AtomicU16::new(0x6666); // ≈25°C
#[cfg(not(target_os = "espidf"))]
static SIM_HUM_RAW: AtomicU16 = AtomicU16::new(0x8000); // ≈50%
#[cfg(not(target_os = "espidf"))]
static SIM_FAIL: AtomicBool = AtomicBool::new(false);

/// Inject a reading for host tests, in engineering units.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_reading(temperature_c: f32, humidity_pct: f32) {
    let t_raw = ((temperature_c + 45.0) / 175.0 * 65535.0) as u16;
    let h_raw = (humidity_pct / 100.0 * 65535.0) as u16;
    SIM_TEMP_RAW.store(t_raw, Ordering::Relaxed);
    SIM_HUM_RAW.store(h_raw, Ordering::Relaxed);
}

/// Make the next reads fail with a bus error (host tests).
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_fail(fail: bool) {
    SIM_FAIL.store(fail, Ordering::Relaxed);
}

/// Serialises tests that touch the process-wide sim state.
#[cfg(all(test, not(target_os = "espidf")))]
pub(crate) fn sim_test_guard() -> std::sync::MutexGuard<'static, ()> {
    static LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
    LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

// ── Driver ────────────────────────────────────────────────────

pub struct Sht31Sensor;

impl Sht31Sensor {
    pub fn new() -> Self {
        Self
    }

    /// One measurement: (temperature °C, relative humidity %).
    pub fn read(&mut self) -> Result<(f32, f32), SensorError> {
        let frame = self.read_frame()?;
        parse_frame(&frame)
    }

    #[cfg(target_os = "espidf")]
    fn read_frame(&mut self) -> Result<[u8; 6], SensorError> {
        hw_init::sht31_write(&CMD_MEASURE_HIGHREP).map_err(|_| SensorError::BusError)?;
        std::thread::sleep(std::time::Duration::from_millis(MEASURE_DELAY_MS));

        let mut frame = [0u8; 6];
        hw_init::sht31_read(&mut frame).map_err(|_| SensorError::BusError)?;
        Ok(frame)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_frame(&mut self) -> Result<[u8; 6], SensorError> {
        if SIM_FAIL.load(Ordering::Relaxed) {
            return Err(SensorError::BusError);
        }

        let t = SIM_TEMP_RAW.load(Ordering::Relaxed).to_be_bytes();
        let h = SIM_HUM_RAW.load(Ordering::Relaxed).to_be_bytes();
        Ok([t[0], t[1], crc8(&t), h[0], h[1], crc8(&h)])
    }
}

impl Default for Sht31Sensor {
    fn default() -> Self {
        Self::new()
    }
}

// ── Frame handling ────────────────────────────────────────────

fn parse_frame(frame: &[u8; 6]) -> Result<(f32, f32), SensorError> {
    if crc8(&frame[0..2]) != frame[2] || crc8(&frame[3..5]) != frame[5] {
        return Err(SensorError::CrcMismatch);
    }

    let t_raw = u16::from_be_bytes([frame[0], frame[1]]);
    let h_raw = u16::from_be_bytes([frame[3], frame[4]]);

    let temperature_c = -45.0 + 175.0 * f32::from(t_raw) / 65535.0;
    let humidity_pct = 100.0 * f32::from(h_raw) / 65535.0;

    if !temperature_c.is_finite() || !humidity_pct.is_finite() {
        return Err(SensorError::OutOfRange);
    }
    Ok((temperature_c, humidity_pct))
}

/// Sensirion CRC-8: polynomial 0x31, init 0xFF, MSB-first, no final XOR.
fn crc8(data: &[u8]) -> u8 {
    let mut crc: u8 = 0xFF;
    for &byte in data {
        crc ^= byte;
        for _ in 0..8 {
            crc = if crc & 0x80 != 0 {
                (crc << 1) ^ 0x31
            } else {
                crc << 1
            };
        }
    }
    crc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crc8_datasheet_vector() {
        // From the Sensirion SHT3x datasheet: 0xBEEF → 0x92.
        assert_eq!(crc8(&[0xBE, 0xEF]), 0x92);
    }

    #[test]
    fn conversion_covers_the_datasheet_range() {
        let frame = |t: u16, h: u16| {
            let tb = t.to_be_bytes();
            let hb = h.to_be_bytes();
            [tb[0], tb[1], crc8(&tb), hb[0], hb[1], crc8(&hb)]
        };

        let (t, h) = parse_frame(&frame(0, 0)).unwrap();
        assert!((t - -45.0).abs() < 0.01);
        assert!(h.abs() < 0.01);

        let (t, h) = parse_frame(&frame(0xFFFF, 0xFFFF)).unwrap();
        assert!((t - 130.0).abs() < 0.01);
        assert!((h - 100.0).abs() < 0.01);
    }

    #[test]
    fn corrupted_frame_is_rejected() {
        let tb = 0x6666u16.to_be_bytes();
        let hb = 0x8000u16.to_be_bytes();
        let mut frame = [tb[0], tb[1], crc8(&tb), hb[0], hb[1], crc8(&hb)];
        frame[2] ^= 0x01;
        assert_eq!(parse_frame(&frame), Err(SensorError::CrcMismatch));
    }

    #[test]
    fn sim_injection_roundtrip_and_failure() {
        let _guard = sim_test_guard();
        let mut sensor = Sht31Sensor::new();
        sim_set_fail(false);
        sim_set_reading(31.2, 64.5);
        let (t, h) = sensor.read().unwrap();
        assert!((t - 31.2).abs() < 0.05);
        assert!((h - 64.5).abs() < 0.05);

        sim_set_fail(true);
        assert_eq!(sensor.read(), Err(SensorError::BusError));
        sim_set_fail(false);
    }
}
