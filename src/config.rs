use crate::calibration::{Calibration, Linear};
use crate::checks;
use crate::network::{self, IpSettings};

pub struct Config {
    // Wi-Fi SSID to connect to
    pub wifi_ssid: &'static str,

    // Wi-Fi pre-shared key (password)
    pub wifi_psk: &'static str,

    // Static IPv4 address, DHCP is used when absent or 0.0.0.0
    pub static_ip: Option<[u8; 4]>,

    // Gateway, required with a static address
    pub gateway: Option<[u8; 4]>,

    // Subnet mask, required with a static address
    pub subnet: Option<[u8; 4]>,

    // DNS servers used with a static address (optional)
    pub primary_dns: Option<[u8; 4]>,
    pub secondary_dns: Option<[u8; 4]>,

    // MQTT client ID (also used as DHCP hostname and payload tag)
    pub mqtt_client_id: &'static str,

    // MQTT broker hostname or IP address
    pub mqtt_hostname: &'static str,

    // MQTT port (usually 1883)
    pub mqtt_port: u16,

    // MQTT username for authentication
    pub mqtt_username: &'static str,

    // MQTT password for authentication
    pub mqtt_password: &'static str,

    // MQTT topic to publish sensor data to
    pub mqtt_sensor_topic: &'static str,

    // MQTT topic for connection reports
    pub mqtt_log_topic: &'static str,

    // MQTT topic carrying the online/offline status (last will)
    pub mqtt_will_topic: &'static str,

    // Number of MQTT connect attempts per cycle
    pub mqtt_max_attempt: u8,

    // Publish a connection report on the log topic after connecting
    pub log_mqtt_connect: bool,

    // Sleeping time between two measurements in seconds
    pub sleep_seconds: u16,

    // Deep sleep between measurements, otherwise wait with the radio up
    pub deep_sleep: bool,

    // Linear correction of the raw DHT11 readings
    pub temp_slope: f32,
    pub temp_shift: f32,
    pub humid_slope: f32,
    pub humid_shift: f32,

    // Number of DHT11 reads averaged per measurement
    pub n_reads: usize,
}

impl Config {
    /// Sleep interval in milliseconds, computed in 64 bits so long intervals don't wrap.
    pub const fn sleep_duration_ms(&self) -> u64 {
        self.sleep_seconds as u64 * 1000
    }

    pub const fn calibration(&self) -> Calibration {
        Calibration {
            temperature: Linear::new(self.temp_slope, self.temp_shift),
            humidity: Linear::new(self.humid_slope, self.humid_shift),
        }
    }

    pub fn ip_settings(&self) -> Result<IpSettings, network::Error> {
        IpSettings::from_parts(
            self.static_ip,
            self.gateway,
            self.subnet,
            self.primary_dns,
            self.secondary_dns,
        )
    }

    /// Same rules `build.rs` applies to `cfg.toml`.
    pub fn validate(&self) -> Result<(), checks::Error> {
        checks::reads(self.n_reads)?;
        checks::non_zero("mqtt_max_attempt", self.mqtt_max_attempt.into())?;
        checks::non_zero("sleep_seconds", self.sleep_seconds.into())?;
        checks::client_id(self.mqtt_client_id)?;
        checks::coefficients("temp", self.temp_slope, self.temp_shift)?;
        checks::coefficients("humid", self.humid_slope, self.humid_shift)?;
        checks::static_ip(self.static_ip, self.gateway, self.subnet)?;
        checks::topic("mqtt_sensor_topic", self.mqtt_sensor_topic)?;
        checks::topic("mqtt_log_topic", self.mqtt_log_topic)?;
        checks::topic("mqtt_will_topic", self.mqtt_will_topic)?;
        Ok(())
    }
}

// config values are generated at compile time
include!(concat!(env!("OUT_DIR"), "/config.rs"));

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Config {
        Config {
            wifi_ssid: "ssid",
            wifi_psk: "psk",
            static_ip: None,
            gateway: None,
            subnet: None,
            primary_dns: None,
            secondary_dns: None,
            mqtt_client_id: "home_sensor1_dht11",
            mqtt_hostname: "192.168.0.10",
            mqtt_port: 1883,
            mqtt_username: "user",
            mqtt_password: "password",
            mqtt_sensor_topic: "home/esp32_1/sensor",
            mqtt_log_topic: "home/esp32_1/log",
            mqtt_will_topic: "home/bedroom/esp32_1/will",
            mqtt_max_attempt: 10,
            log_mqtt_connect: false,
            sleep_seconds: 2,
            deep_sleep: true,
            temp_slope: 1.005,
            temp_shift: -1.746,
            humid_slope: 1.775,
            humid_shift: -38.07,
            n_reads: 3,
        }
    }

    #[test]
    fn sleep_duration_does_not_wrap() {
        let mut config = sample();
        assert_eq!(config.sleep_duration_ms(), 2_000);

        config.sleep_seconds = u16::MAX;
        assert_eq!(config.sleep_duration_ms(), 65_535_000);
    }

    #[test]
    fn calibration_uses_configured_coefficients() {
        let calibration = sample().calibration();
        assert_eq!(calibration.temperature, Linear::new(1.005, -1.746));
        assert_eq!(calibration.humidity, Linear::new(1.775, -38.07));
    }

    #[test]
    fn zero_address_means_dhcp() {
        let mut config = sample();
        config.static_ip = Some([0, 0, 0, 0]);
        assert_eq!(config.ip_settings().unwrap(), IpSettings::Dhcp);
    }

    #[test]
    fn generated_config_is_consistent() {
        assert_eq!(CONFIG.validate(), Ok(()));
        assert!(CONFIG.ip_settings().is_ok());
    }

    #[test]
    fn sample_config_is_valid() {
        assert_eq!(sample().validate(), Ok(()));
    }

    #[test]
    fn long_client_id_is_rejected() {
        let mut config = sample();
        config.mqtt_client_id = "a_client_id_longer_than_a_hostname";
        assert_eq!(config.validate(), Err(checks::Error::ClientId));

        config.mqtt_client_id = "sensor\",\"x\":\"1";
        assert_eq!(config.validate(), Err(checks::Error::ClientId));
    }

    #[test]
    fn too_many_reads_are_rejected() {
        let mut config = sample();
        config.n_reads = 17;
        assert_eq!(config.validate(), Err(checks::Error::TooManyReads));
        config.n_reads = 0;
        assert_eq!(config.validate(), Err(checks::Error::Zero("n_reads")));
    }

    #[test]
    fn zero_counts_are_rejected() {
        let mut config = sample();
        config.sleep_seconds = 0;
        assert_eq!(config.validate(), Err(checks::Error::Zero("sleep_seconds")));

        let mut config = sample();
        config.mqtt_max_attempt = 0;
        assert_eq!(
            config.validate(),
            Err(checks::Error::Zero("mqtt_max_attempt"))
        );
    }

    #[test]
    fn static_address_without_gateway_is_rejected() {
        let mut config = sample();
        config.static_ip = Some([192, 168, 0, 200]);
        config.subnet = Some([255, 255, 255, 0]);
        assert_eq!(config.validate(), Err(checks::Error::MissingGateway));
    }
}
