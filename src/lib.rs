//! DHT11 temperature/humidity node publishing to MQTT.
//!
//! The library holds everything that doesn't touch the radio: build-time
//! configuration, the DHT11 driver, calibration, sampling, retry policy and
//! payload formatting. The firmware binary wires it to esp-hal, esp-wifi and
//! rust-mqtt.

#![cfg_attr(not(test), no_std)]

#[cfg(all(feature = "json", feature = "influx"))]
compile_error!("features `json` and `influx` are exclusive, build with `--no-default-features --features influx`");

pub mod calibration;
pub mod checks;
pub mod config;
pub mod constants;
pub mod dht11;
pub mod network;
pub mod payload;
pub mod retry;
pub mod sampling;
pub mod schedule;
