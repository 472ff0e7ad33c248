//! WiFi station-mode adapter.
//!
//! Implements [`NetworkPort`] — the hexagonal boundary for (re)initiating
//! association — and feeds the link event channel from the ESP system
//! event loop so the [`LinkMonitor`](crate::link::LinkMonitor) sees the
//! five connectivity events it understands.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: real ESP-IDF WiFi STA driver plus event
//!   subscriptions mapping driver events onto [`LinkEvent`]s.
//! - **all other targets**: simulation stubs for host-side tests; link
//!   events are injected directly via [`crate::link::push_link_event`].
//!
//! ## Event mapping
//!
//! | Driver event        | Link event                              |
//! |---------------------|-----------------------------------------|
//! | `StaStarted`        | `AssociationStarted` (+ connect issued) |
//! | `StaConnected`      | `AssociationSucceeded`                  |
//! | `StaDisconnected`   | `AssociationFailed` or `LinkLost`¹      |
//! | `DhcpIpAssigned`    | `AddressAcquired`                       |
//!
//! ¹ The driver reports one disconnect event for both cases; the adapter
//!   disambiguates by the current link state.

use log::info;

use crate::app::ports::NetworkPort;
use crate::config::SystemConfig;
use crate::error::{LinkError, Result};

#[cfg(target_os = "espidf")]
use crate::error::Error;
#[cfg(target_os = "espidf")]
use crate::link::{self, LinkEvent, LinkState};

// ───────────────────────────────────────────────────────────────
// Adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiLink {
    #[cfg(target_os = "espidf")]
    _driver: Box<esp_idf_svc::wifi::EspWifi<'static>>,
    #[cfg(target_os = "espidf")]
    _wifi_sub: esp_idf_svc::eventloop::EspSubscription<'static, esp_idf_svc::eventloop::System>,
    #[cfg(target_os = "espidf")]
    _ip_sub: esp_idf_svc::eventloop::EspSubscription<'static, esp_idf_svc::eventloop::System>,

    /// Simulation: number of connect requests issued.
    #[cfg(not(target_os = "espidf"))]
    connect_requests: u32,
}

impl WifiLink {
    /// Bring the station interface up and start association.
    ///
    /// On ESP-IDF this takes the modem peripheral, system event loop and
    /// default NVS partition (the WiFi driver needs NVS for its RF
    /// calibration blob — nothing of ours is persisted there).
    #[cfg(target_os = "espidf")]
    pub fn start(config: &SystemConfig) -> Result<Self> {
        use esp_idf_hal::peripherals::Peripherals;
        use esp_idf_svc::eventloop::EspSystemEventLoop;
        use esp_idf_svc::netif::IpEvent;
        use esp_idf_svc::nvs::EspDefaultNvsPartition;
        use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration, EspWifi, WifiEvent};

        let peripherals =
            Peripherals::take().map_err(|_| Error::Init("peripherals already taken"))?;
        let sysloop =
            EspSystemEventLoop::take().map_err(|_| Error::Init("system event loop init failed"))?;
        let nvs =
            EspDefaultNvsPartition::take().map_err(|_| Error::Init("NVS partition init failed"))?;

        let mut driver = Box::new(
            EspWifi::new(peripherals.modem, sysloop.clone(), Some(nvs))
                .map_err(|_| Error::Init("WiFi driver init failed"))?,
        );

        let auth_method = if config.wifi_password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        driver
            .set_configuration(&Configuration::Client(ClientConfiguration {
                ssid: config.wifi_ssid.clone(),
                password: config.wifi_password.clone(),
                auth_method,
                ..Default::default()
            }))
            .map_err(|_| Error::Init("WiFi configuration rejected"))?;

        // Driver events → link events.  The callbacks run in the event
        // loop task: push only, never block.
        let wifi_sub = sysloop
            .subscribe::<WifiEvent, _>(|event| match event {
                WifiEvent::StaStarted => {
                    link::push_link_event(LinkEvent::AssociationStarted);
                    // Kick off the first association as soon as the
                    // interface is up.
                    unsafe {
                        esp_idf_svc::sys::esp_wifi_connect();
                    }
                }
                WifiEvent::StaConnected(_) => {
                    link::push_link_event(LinkEvent::AssociationSucceeded);
                }
                WifiEvent::StaDisconnected(_) => {
                    let ev = if link::state() == LinkState::LinkReady {
                        LinkEvent::LinkLost
                    } else {
                        LinkEvent::AssociationFailed
                    };
                    link::push_link_event(ev);
                }
                _ => {}
            })
            .map_err(|_| Error::Init("WiFi event subscription failed"))?;

        let ip_sub = sysloop
            .subscribe::<IpEvent, _>(|event| {
                if let IpEvent::DhcpIpAssigned(assignment) = event {
                    info!("WiFi: got IP {}", assignment.ip());
                    link::push_link_event(LinkEvent::AddressAcquired);
                }
            })
            .map_err(|_| Error::Init("IP event subscription failed"))?;

        driver
            .start()
            .map_err(|_| Error::Init("WiFi driver start failed"))?;
        info!("WiFi: station started (SSID='{}')", config.wifi_ssid);

        Ok(Self {
            _driver: driver,
            _wifi_sub: wifi_sub,
            _ip_sub: ip_sub,
        })
    }

    /// Simulation: no driver, link events are injected by the harness.
    #[cfg(not(target_os = "espidf"))]
    pub fn start(config: &SystemConfig) -> Result<Self> {
        info!("WiFi(sim): station started (SSID='{}')", config.wifi_ssid);
        Ok(Self {
            connect_requests: 0,
        })
    }

    /// Simulation: connect requests issued so far.
    #[cfg(not(target_os = "espidf"))]
    pub fn connect_requests(&self) -> u32 {
        self.connect_requests
    }
}

// ───────────────────────────────────────────────────────────────
// NetworkPort
// ───────────────────────────────────────────────────────────────

impl NetworkPort for WifiLink {
    #[cfg(target_os = "espidf")]
    fn connect(&mut self) -> core::result::Result<(), LinkError> {
        let rc = unsafe { esp_idf_svc::sys::esp_wifi_connect() };
        if rc == esp_idf_svc::sys::ESP_OK {
            Ok(())
        } else {
            log::warn!("WiFi: esp_wifi_connect failed (rc={rc})");
            Err(LinkError::ConnectRequestFailed)
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn connect(&mut self) -> core::result::Result<(), LinkError> {
        self.connect_requests += 1;
        info!("WiFi(sim): connect request #{}", self.connect_requests);
        Ok(())
    }
}
