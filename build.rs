use std::{env, error::Error, fs, net::Ipv4Addr, path::Path};

use serde::Deserialize;

#[allow(dead_code)]
#[path = "src/checks.rs"]
mod checks;

const CONFIG_FILE: &str = "cfg.toml";
const EXAMPLE_CONFIG_FILE: &str = "cfg.toml.example";

#[derive(Deserialize)]
struct RawConfig {
    wifi_ssid: String,
    wifi_psk: String,

    #[serde(default)]
    static_ip: Option<Ipv4Addr>,
    #[serde(default)]
    gateway: Option<Ipv4Addr>,
    #[serde(default)]
    subnet: Option<Ipv4Addr>,
    #[serde(default)]
    primary_dns: Option<Ipv4Addr>,
    #[serde(default)]
    secondary_dns: Option<Ipv4Addr>,

    mqtt_client_id: String,
    mqtt_hostname: String,
    #[serde(default = "default_mqtt_port")]
    mqtt_port: u16,
    mqtt_username: String,
    mqtt_password: String,
    mqtt_sensor_topic: String,
    mqtt_log_topic: String,
    mqtt_will_topic: String,
    #[serde(default = "default_mqtt_max_attempt")]
    mqtt_max_attempt: u8,
    #[serde(default)]
    log_mqtt_connect: bool,

    sleep_seconds: u16,
    #[serde(default = "default_deep_sleep")]
    deep_sleep: bool,

    #[serde(default)]
    calibration: RawCalibration,
    #[serde(default = "default_n_reads")]
    n_reads: usize,
}

#[derive(Deserialize)]
struct RawCalibration {
    temp_slope: f32,
    temp_shift: f32,
    humid_slope: f32,
    humid_shift: f32,
}

impl Default for RawCalibration {
    fn default() -> Self {
        Self {
            temp_slope: 1.0,
            temp_shift: 0.0,
            humid_slope: 1.0,
            humid_shift: 0.0,
        }
    }
}

fn default_mqtt_port() -> u16 {
    1883
}

fn default_mqtt_max_attempt() -> u8 {
    10
}

fn default_deep_sleep() -> bool {
    true
}

fn default_n_reads() -> usize {
    3
}

fn validate(raw: &RawConfig) -> Result<(), checks::Error> {
    checks::reads(raw.n_reads)?;
    checks::non_zero("mqtt_max_attempt", raw.mqtt_max_attempt.into())?;
    checks::non_zero("sleep_seconds", raw.sleep_seconds.into())?;
    checks::client_id(&raw.mqtt_client_id)?;

    let c = &raw.calibration;
    checks::coefficients("temp", c.temp_slope, c.temp_shift)?;
    checks::coefficients("humid", c.humid_slope, c.humid_shift)?;

    checks::static_ip(octets(raw.static_ip), octets(raw.gateway), octets(raw.subnet))?;

    checks::topic("mqtt_sensor_topic", &raw.mqtt_sensor_topic)?;
    checks::topic("mqtt_log_topic", &raw.mqtt_log_topic)?;
    checks::topic("mqtt_will_topic", &raw.mqtt_will_topic)?;

    Ok(())
}

fn octets(ip: Option<Ipv4Addr>) -> Option<[u8; 4]> {
    ip.map(|ip| ip.octets())
}

fn main() -> Result<(), Box<dyn Error>> {
    // Tell Cargo to rerun if toml changes
    println!("cargo:rerun-if-changed={CONFIG_FILE}");
    println!("cargo:rerun-if-changed={EXAMPLE_CONFIG_FILE}");
    println!("cargo:rerun-if-changed=src/checks.rs");

    let source = if Path::new(CONFIG_FILE).exists() {
        CONFIG_FILE
    } else {
        println!("cargo:warning={CONFIG_FILE} not found, using {EXAMPLE_CONFIG_FILE}");
        EXAMPLE_CONFIG_FILE
    };

    // Read and parse
    let toml_str = fs::read_to_string(source)?;
    let raw: RawConfig = toml::from_str(&toml_str)?;
    validate(&raw).map_err(|e| format!("invalid {source}: {e}"))?;

    let cal = &raw.calibration;

    // Generate Rust code
    let code = format!(
        r#"
        pub const CONFIG: Config = Config {{
            wifi_ssid: {ssid:?},
            wifi_psk: {psk:?},
            static_ip: {ip:?},
            gateway: {gw:?},
            subnet: {sn:?},
            primary_dns: {dns1:?},
            secondary_dns: {dns2:?},
            mqtt_client_id: {mid:?},
            mqtt_hostname: {mh:?},
            mqtt_port: {mp},
            mqtt_username: {mu:?},
            mqtt_password: {mpw:?},
            mqtt_sensor_topic: {mst:?},
            mqtt_log_topic: {mlt:?},
            mqtt_will_topic: {mwt:?},
            mqtt_max_attempt: {mma},
            log_mqtt_connect: {lmc},
            sleep_seconds: {sleep},
            deep_sleep: {deep},
            temp_slope: {ts:?},
            temp_shift: {tsh:?},
            humid_slope: {hs:?},
            humid_shift: {hsh:?},
            n_reads: {nr},
        }};
    "#,
        ssid = raw.wifi_ssid,
        psk = raw.wifi_psk,
        ip = octets(raw.static_ip),
        gw = octets(raw.gateway),
        sn = octets(raw.subnet),
        dns1 = octets(raw.primary_dns),
        dns2 = octets(raw.secondary_dns),
        mid = raw.mqtt_client_id,
        mh = raw.mqtt_hostname,
        mp = raw.mqtt_port,
        mu = raw.mqtt_username,
        mpw = raw.mqtt_password,
        mst = raw.mqtt_sensor_topic,
        mlt = raw.mqtt_log_topic,
        mwt = raw.mqtt_will_topic,
        mma = raw.mqtt_max_attempt,
        lmc = raw.log_mqtt_connect,
        sleep = raw.sleep_seconds,
        deep = raw.deep_sleep,
        ts = cal.temp_slope,
        tsh = cal.temp_shift,
        hs = cal.humid_slope,
        hsh = cal.humid_shift,
        nr = raw.n_reads,
    );

    let out_dir = env::var("OUT_DIR")?;
    let dest_path = Path::new(&out_dir).join("config.rs");
    fs::write(dest_path, code)?;
    Ok(())
}
