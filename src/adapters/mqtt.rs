//! MQTT telemetry transport adapter.
//!
//! Implements [`TelemetryTransport`] over the ESP-IDF MQTT client.  The
//! session handle owns the client connection; dropping it (on link loss)
//! tears the connection down, and the next `open()` builds a fresh one.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `esp_idf_svc::mqtt::client::EspMqttClient`
//!   against the configured broker URL.
//! - **all other targets**: in-memory stub that counts publishes, for
//!   simulation runs.  Host tests use their own mock transports.

use log::info;

use crate::app::ports::TelemetryTransport;
use crate::config::SystemConfig;
use crate::error::TransportError;
use crate::telemetry::QoS;

// ───────────────────────────────────────────────────────────────
// Session handle
// ───────────────────────────────────────────────────────────────

/// An open publish channel to the broker.
pub struct MqttSession {
    #[cfg(target_os = "espidf")]
    client: esp_idf_svc::mqtt::client::EspMqttClient<'static>,
    #[cfg(not(target_os = "espidf"))]
    published: u32,
}

// ───────────────────────────────────────────────────────────────
// Transport
// ───────────────────────────────────────────────────────────────

pub struct MqttTransport {
    broker_url: heapless::String<64>,
}

impl MqttTransport {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            broker_url: config.broker_url.clone(),
        }
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_open(&mut self) -> Result<MqttSession, TransportError> {
        use esp_idf_svc::mqtt::client::{EspMqttClient, MqttClientConfiguration};

        let conf = MqttClientConfiguration {
            client_id: Some("saturn-node"),
            ..Default::default()
        };

        // Connection lifecycle events are only logged here; delivery
        // guarantees come from the per-publish QoS.
        let client = EspMqttClient::new_cb(self.broker_url.as_str(), &conf, |event| {
            log::debug!("MQTT event: {:?}", event.payload());
        })
        .map_err(|_| TransportError::OpenFailed)?;

        info!("MQTT: session opened ({})", self.broker_url);
        Ok(MqttSession { client })
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_open(&mut self) -> Result<MqttSession, TransportError> {
        info!("MQTT(sim): session opened ({})", self.broker_url);
        Ok(MqttSession { published: 0 })
    }

    #[cfg(target_os = "espidf")]
    fn platform_publish(
        session: &mut MqttSession,
        topic: &str,
        payload: &[u8],
        qos: QoS,
    ) -> Result<(), TransportError> {
        session
            .client
            .publish(topic, map_qos(qos), false, payload)
            .map(|_msg_id| ())
            .map_err(|_| TransportError::PublishFailed)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_publish(
        session: &mut MqttSession,
        topic: &str,
        payload: &[u8],
        _qos: QoS,
    ) -> Result<(), TransportError> {
        session.published += 1;
        info!(
            "MQTT(sim): publish #{} to '{}' ({} bytes)",
            session.published,
            topic,
            payload.len()
        );
        Ok(())
    }
}

#[cfg(target_os = "espidf")]
fn map_qos(qos: QoS) -> esp_idf_svc::mqtt::client::QoS {
    use esp_idf_svc::mqtt::client::QoS as EspQoS;
    match qos {
        QoS::AtMostOnce => EspQoS::AtMostOnce,
        QoS::AtLeastOnce => EspQoS::AtLeastOnce,
        QoS::ExactlyOnce => EspQoS::ExactlyOnce,
    }
}

// ───────────────────────────────────────────────────────────────
// TelemetryTransport
// ───────────────────────────────────────────────────────────────

impl TelemetryTransport for MqttTransport {
    type Session = MqttSession;

    fn open(&mut self) -> Result<MqttSession, TransportError> {
        self.platform_open()
    }

    fn publish(
        &mut self,
        session: &mut MqttSession,
        topic: &str,
        payload: &[u8],
        qos: QoS,
    ) -> Result<(), TransportError> {
        Self::platform_publish(session, topic, payload, qos)
    }
}
