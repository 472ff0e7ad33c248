//! System configuration parameters
//!
//! All tunable parameters for the Saturn node.  Wi-Fi credentials and the
//! broker address can be overridden at build time via environment variables
//! (`SATURN_WIFI_SSID`, `SATURN_WIFI_PASS`, `SATURN_BROKER_URL`); credential
//! provisioning and persistence live outside this firmware.

use serde::{Deserialize, Serialize};

use crate::telemetry::QoS;

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Wi-Fi ---
    /// Station SSID (1-32 printable ASCII bytes).
    pub wifi_ssid: heapless::String<32>,
    /// WPA2 passphrase (8-64 bytes, empty for an open network).
    pub wifi_password: heapless::String<64>,
    /// Initial reconnect backoff after an association failure (seconds).
    pub reconnect_backoff_min_secs: u32,
    /// Backoff ceiling (seconds); doubling stops here.
    pub reconnect_backoff_max_secs: u32,

    // --- Telemetry ---
    /// MQTT broker URL.
    pub broker_url: heapless::String<64>,
    /// Topic sensor reports are published to.
    pub telemetry_topic: heapless::String<48>,
    /// Publish quality of service.
    pub telemetry_qos: QoS,
    /// Sampling/publish period (milliseconds).
    pub telemetry_interval_ms: u32,

    // --- Alarm pattern ---
    /// Short pulse duration (milliseconds).
    pub alarm_short_ms: u32,
    /// Long pulse duration (milliseconds).
    pub alarm_long_ms: u32,
    /// Rest between pattern repeats (milliseconds).
    pub alarm_rest_ms: u32,

    // --- Timing ---
    /// Control loop interval (milliseconds).  Must stay at or below the
    /// shortest alarm step so cancellation lands within one step.
    pub control_loop_interval_ms: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        let mut ssid = heapless::String::new();
        let _ = ssid.push_str(option_env!("SATURN_WIFI_SSID").unwrap_or("saturn-lab"));
        let mut pass = heapless::String::new();
        let _ = pass.push_str(option_env!("SATURN_WIFI_PASS").unwrap_or(""));
        let mut broker = heapless::String::new();
        let _ = broker.push_str(
            option_env!("SATURN_BROKER_URL").unwrap_or("mqtt://broker.saturn.local"),
        );
        let mut topic = heapless::String::new();
        let _ = topic.push_str("WES/Saturn/sensors");

        Self {
            wifi_ssid: ssid,
            wifi_password: pass,
            reconnect_backoff_min_secs: 2,
            reconnect_backoff_max_secs: 60,

            broker_url: broker,
            telemetry_topic: topic,
            telemetry_qos: QoS::AtLeastOnce,
            telemetry_interval_ms: 5000,

            alarm_short_ms: 100,
            alarm_long_ms: 300,
            alarm_rest_ms: 1000,

            control_loop_interval_ms: 50,
        }
    }
}
