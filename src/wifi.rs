use embassy_executor::Spawner;
use embassy_net::{
    Ipv4Address, Ipv4Cidr, Runner, Stack, StackResources, StaticConfigV4,
};
use embassy_time::{with_timeout, Duration, Timer};

use esp_hal::peripherals::{RADIO_CLK, WIFI};
use esp_hal::rng::Rng;
use esp_wifi::{
    wifi::{ClientConfiguration, Configuration, WifiController, WifiDevice, WifiEvent, WifiState},
    EspWifiController, EspWifiTimerSource,
};

use core::str::FromStr;
use heapless::String;
use log::info;
use static_cell::StaticCell;

use esp32_dht11_sensor::checks::HOSTNAME_MAX_LEN;
use esp32_dht11_sensor::config::CONFIG;
use esp32_dht11_sensor::constants::{
    NETWORK_READY_TIMEOUT_SECS, WIFI_CONNECT_TIMEOUT_SECS, WIFI_RECONNECT_DELAY_MS,
};
use esp32_dht11_sensor::network::IpSettings;

static WIFI_INIT: StaticCell<EspWifiController<'static>> = StaticCell::new();
static RESOURCES: StaticCell<StackResources<3>> = StaticCell::new();

pub struct Wifi {
    pub stack: Stack<'static>,
}

#[derive(Debug)]
pub enum Error {
    WifiInitFailed,
    HostnameTooLong,
    #[allow(dead_code)]
    InvalidIpSettings(esp32_dht11_sensor::network::Error),
    TaskSpawnFailed,
    NotReady,
}

impl Wifi {
    pub async fn new(
        wifi: WIFI<'static>,
        timer: impl EspWifiTimerSource + 'static,
        radio_clk: RADIO_CLK<'static>,
        mut rng: Rng,
        spawner: Spawner,
    ) -> Result<Self, Error> {
        let init = esp_wifi::init(timer, rng.clone(), radio_clk).map_err(|_| Error::WifiInitFailed)?;
        let init = WIFI_INIT.init(init);

        let (controller, interfaces) =
            esp_wifi::wifi::new(init, wifi).map_err(|_| Error::WifiInitFailed)?;

        let config = match CONFIG.ip_settings().map_err(Error::InvalidIpSettings)? {
            IpSettings::Dhcp => {
                let mut dhcp_config = embassy_net::DhcpConfig::default();
                dhcp_config.hostname = Some(
                    String::<HOSTNAME_MAX_LEN>::from_str(CONFIG.mqtt_client_id)
                        .map_err(|_| Error::HostnameTooLong)?,
                );
                embassy_net::Config::dhcpv4(dhcp_config)
            }
            IpSettings::Static(ip) => {
                info!(
                    "Using static address {}/{}",
                    Ipv4Address::from(ip.address),
                    ip.prefix_len
                );
                embassy_net::Config::ipv4_static(StaticConfigV4 {
                    address: Ipv4Cidr::new(Ipv4Address::from(ip.address), ip.prefix_len),
                    gateway: Some(Ipv4Address::from(ip.gateway)),
                    dns_servers: ip.dns.iter().map(|dns| Ipv4Address::from(*dns)).collect(),
                })
            }
        };

        let seed = (rng.random() as u64) << 32 | rng.random() as u64;

        let resources = RESOURCES.init(StackResources::new());
        let (stack, runner) = embassy_net::new(interfaces.sta, config, resources, seed);

        spawner
            .spawn(connection(controller))
            .map_err(|_| Error::TaskSpawnFailed)?;
        spawner
            .spawn(net_task(runner))
            .map_err(|_| Error::TaskSpawnFailed)?;

        Ok(Self { stack })
    }

    /// Waits for the link and an IPv4 configuration, bounded so a missing
    /// access point doesn't keep the node awake.
    pub async fn wait_ready(&self) -> Result<(), Error> {
        if self.stack.is_config_up() {
            return Ok(());
        }

        info!("Waiting for network stack to be ready...");
        let ready = async {
            self.stack.wait_link_up().await;
            self.stack.wait_config_up().await;
        };
        with_timeout(Duration::from_secs(NETWORK_READY_TIMEOUT_SECS), ready)
            .await
            .map_err(|_| Error::NotReady)?;

        if let Some(config) = self.stack.config_v4() {
            info!("Got IP: {}", config.address);
        }
        Ok(())
    }
}

#[embassy_executor::task]
async fn connection(mut controller: WifiController<'static>) {
    info!(
        "Start connection task, device capabilities: {:?}",
        controller.capabilities()
    );
    loop {
        if esp_wifi::wifi::wifi_state() == WifiState::StaConnected {
            // wait until we're no longer connected
            controller.wait_for_event(WifiEvent::StaDisconnected).await;
            Timer::after(Duration::from_millis(WIFI_RECONNECT_DELAY_MS)).await
        }

        if !matches!(controller.is_started(), Ok(true)) {
            let client_config = Configuration::Client(ClientConfiguration {
                ssid: CONFIG.wifi_ssid.into(),
                password: CONFIG.wifi_psk.into(),
                ..Default::default()
            });
            if let Err(e) = controller.set_configuration(&client_config) {
                log::error!("Failed to set WiFi config: {:?}. Retrying...", e);
                Timer::after(Duration::from_millis(WIFI_RECONNECT_DELAY_MS)).await;
                continue;
            }
            info!("Starting wifi");
            if let Err(e) = controller.start_async().await {
                log::error!("Failed to start WiFi: {:?}. Retrying...", e);
                Timer::after(Duration::from_millis(WIFI_RECONNECT_DELAY_MS)).await;
                continue;
            }
            info!("Wifi started!");
        }

        info!("About to connect to {:?}...", CONFIG.wifi_ssid);
        match with_timeout(
            Duration::from_secs(WIFI_CONNECT_TIMEOUT_SECS),
            controller.connect_async(),
        )
        .await
        {
            Ok(Ok(_)) => info!("Wifi connected!"),
            Ok(Err(e)) => {
                info!("Failed to connect to wifi: {e:?}");
                Timer::after(Duration::from_millis(WIFI_RECONNECT_DELAY_MS)).await
            }
            Err(_) => {
                info!("Wifi connection timed out");
                Timer::after(Duration::from_millis(WIFI_RECONNECT_DELAY_MS)).await
            }
        }
    }
}

#[embassy_executor::task]
async fn net_task(mut runner: Runner<'static, WifiDevice<'static>>) {
    runner.run().await
}
