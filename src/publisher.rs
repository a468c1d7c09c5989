use embassy_time::{Duration, Timer};
use static_cell::StaticCell;

use esp32_dht11_sensor::config::CONFIG;
use esp32_dht11_sensor::constants::*;
use esp32_dht11_sensor::payload::{self, ONLINE};
use esp32_dht11_sensor::retry::Backoff;
use esp32_dht11_sensor::sampling::Summary;

use crate::mqtt::{self, Mqtt};
use crate::transport;
use crate::wifi::{self, Wifi};

static RX_BUF: StaticCell<[u8; RX_BUFFER_SIZE]> = StaticCell::new();
static TX_BUF: StaticCell<[u8; TX_BUFFER_SIZE]> = StaticCell::new();
static MQTT_RX_BUF: StaticCell<[u8; MQTT_RX_BUFFER_SIZE]> = StaticCell::new();
static MQTT_TX_BUF: StaticCell<[u8; MQTT_TX_BUFFER_SIZE]> = StaticCell::new();

#[derive(Debug)]
pub enum Error {
    #[allow(dead_code)]
    Network(wifi::Error),
    #[allow(dead_code)]
    Transport(transport::Error),
    #[allow(dead_code)]
    Mqtt(mqtt::Error),
    AttemptsExhausted,
    Format,
}

/// Publishes measurements, reconnecting to the broker on every call.
pub struct Publisher {
    wifi: Wifi,
    rx_buf: &'static mut [u8; RX_BUFFER_SIZE],
    tx_buf: &'static mut [u8; TX_BUFFER_SIZE],
    mqtt_rx_buf: &'static mut [u8; MQTT_RX_BUFFER_SIZE],
    mqtt_tx_buf: &'static mut [u8; MQTT_TX_BUFFER_SIZE],
}

impl Publisher {
    /// Can only be called once, the buffers are statically allocated.
    pub fn new(wifi: Wifi) -> Self {
        Self {
            wifi,
            rx_buf: RX_BUF.init([0; RX_BUFFER_SIZE]),
            tx_buf: TX_BUF.init([0; TX_BUFFER_SIZE]),
            mqtt_rx_buf: MQTT_RX_BUF.init([0; MQTT_RX_BUFFER_SIZE]),
            mqtt_tx_buf: MQTT_TX_BUF.init([0; MQTT_TX_BUFFER_SIZE]),
        }
    }

    pub async fn publish(&mut self, summary: &Summary) -> Result<(), Error> {
        let message = payload::format_reading(CONFIG.mqtt_client_id, &summary.reading)
            .map_err(|_| Error::Format)?;
        log::debug!("Formatted MQTT message: {}", message);

        self.wifi.wait_ready().await.map_err(Error::Network)?;

        let backoff = Backoff::new(
            CONFIG.mqtt_max_attempt,
            MQTT_BACKOFF_BASE_MS,
            MQTT_BACKOFF_MAX_MS,
        );

        for attempt in backoff.attempts() {
            if attempt.delay_ms > 0 {
                Timer::after(Duration::from_millis(attempt.delay_ms)).await;
            }
            log::info!(
                "MQTT connection attempt {}/{}",
                attempt.number,
                backoff.max_attempts
            );

            let socket = match transport::connect(
                self.wifi.stack,
                &mut self.rx_buf[..],
                &mut self.tx_buf[..],
                CONFIG.mqtt_hostname,
                CONFIG.mqtt_port,
            )
            .await
            {
                Ok(socket) => socket,
                Err(e) => {
                    log::warn!("Broker unreachable: {:?}", e);
                    continue;
                }
            };

            let mut mqtt = match Mqtt::new(
                socket,
                &mut self.mqtt_tx_buf[..],
                &mut self.mqtt_rx_buf[..],
            )
            .await
            {
                Ok(mqtt) => mqtt,
                Err(e) => {
                    log::warn!("MQTT session refused: {:?}", e);
                    continue;
                }
            };

            let result = send_all(&mut mqtt, attempt.number, summary, &message).await;

            // Explicitly disconnect, the last will is only for unexpected drops
            mqtt.disconnect().await;

            result?;
            log::info!("MQTT data published successfully");
            return Ok(());
        }

        Err(Error::AttemptsExhausted)
    }
}

async fn send_all<T>(
    mqtt: &mut Mqtt<'_, T>,
    attempts: u8,
    summary: &Summary,
    message: &str,
) -> Result<(), Error>
where
    T: embedded_io_async::Read + embedded_io_async::Write,
{
    mqtt.send_message(CONFIG.mqtt_will_topic, ONLINE.as_bytes(), true)
        .await
        .map_err(Error::Mqtt)?;

    mqtt.send_message(CONFIG.mqtt_sensor_topic, message.as_bytes(), false)
        .await
        .map_err(Error::Mqtt)?;

    if CONFIG.log_mqtt_connect {
        let report =
            payload::format_connect_report(attempts, summary).map_err(|_| Error::Format)?;
        mqtt.send_message(CONFIG.mqtt_log_topic, report.as_bytes(), false)
            .await
            .map_err(Error::Mqtt)?;
    }

    Ok(())
}
