use core::fmt::Write;
use heapless::String;

use crate::constants::PAYLOAD_CAPACITY;
use crate::dht11::Reading;
use crate::sampling::Summary;

/// Retained on the will topic once connected
pub const ONLINE: &str = "online";
/// Last will, published by the broker when the session drops
pub const OFFLINE: &str = "offline";

pub type Payload = String<PAYLOAD_CAPACITY>;

/// Formats a reading in the data format selected at build time.
pub fn format_reading(sensor: &str, reading: &Reading) -> Result<Payload, core::fmt::Error> {
    if cfg!(feature = "influx") {
        format_influx(sensor, reading)
    } else {
        format_json(sensor, reading)
    }
}

pub fn format_json(sensor: &str, reading: &Reading) -> Result<Payload, core::fmt::Error> {
    let mut payload = Payload::new();
    write!(
        payload,
        "{{\"sensor\":\"{}\",\"temperature\":{:.2},\"humidity\":{:.2}}}",
        sensor, reading.temperature, reading.humidity
    )?;
    Ok(payload)
}

pub fn format_influx(sensor: &str, reading: &Reading) -> Result<Payload, core::fmt::Error> {
    let mut payload = Payload::new();
    write!(
        payload,
        "dht11,sensor={} temperature={:.2},humidity={:.2}",
        sensor, reading.temperature, reading.humidity
    )?;
    Ok(payload)
}

/// Report published on the log topic after the broker accepted the connection.
pub fn format_connect_report(attempts: u8, summary: &Summary) -> Result<Payload, core::fmt::Error> {
    let mut payload = Payload::new();
    write!(
        payload,
        "{{\"event\":\"mqtt_connect\",\"attempts\":{},\"samples\":{},\"failed_samples\":{}}}",
        attempts, summary.valid, summary.failed
    )?;
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    const READING: Reading = Reading {
        temperature: 21.3,
        humidity: 40.25,
    };

    #[test]
    fn json_payload() {
        let payload = format_json("home_sensor1_dht11", &READING).unwrap();
        assert_eq!(
            payload.as_str(),
            r#"{"sensor":"home_sensor1_dht11","temperature":21.30,"humidity":40.25}"#
        );
    }

    #[test]
    fn influx_payload() {
        let payload = format_influx("home_sensor1_dht11", &READING).unwrap();
        assert_eq!(
            payload.as_str(),
            "dht11,sensor=home_sensor1_dht11 temperature=21.30,humidity=40.25"
        );
    }

    #[test]
    fn reading_uses_enabled_format() {
        let payload = format_reading("home_sensor1_dht11", &READING).unwrap();
        if cfg!(feature = "influx") {
            assert!(payload.starts_with("dht11,"));
        } else {
            assert!(payload.starts_with('{'));
        }
    }

    #[test]
    fn negative_temperature_keeps_sign() {
        let reading = Reading {
            temperature: -4.5,
            humidity: 80.0,
        };
        let payload = format_json("s", &reading).unwrap();
        assert_eq!(
            payload.as_str(),
            r#"{"sensor":"s","temperature":-4.50,"humidity":80.00}"#
        );
    }

    #[test]
    fn connect_report() {
        let summary = Summary {
            reading: READING,
            valid: 2,
            failed: 1,
        };
        let payload = format_connect_report(3, &summary).unwrap();
        assert_eq!(
            payload.as_str(),
            r#"{"event":"mqtt_connect","attempts":3,"samples":2,"failed_samples":1}"#
        );
    }

    #[test]
    fn oversized_sensor_name_is_an_error() {
        let name = "x".repeat(PAYLOAD_CAPACITY);
        assert!(format_json(&name, &READING).is_err());
    }
}
