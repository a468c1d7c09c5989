use embedded_io_async::{Read, Write};
use rust_mqtt::{
    client::{
        client::MqttClient,
        client_config::{ClientConfig, MqttVersion},
    },
    packet::v5::{publish_packet::QualityOfService, reason_codes::ReasonCode},
    utils::rng_generator::CountingRng,
};

use esp32_dht11_sensor::config::CONFIG;
use esp32_dht11_sensor::constants::{MQTT_KEEP_ALIVE_SECS, MQTT_MAX_PROPERTIES};
use esp32_dht11_sensor::payload::OFFLINE;

#[derive(Debug)]
pub enum Error {
    #[allow(dead_code)]
    ConnectionFailed(ReasonCode),
    #[allow(dead_code)]
    PublishMessageFailed(ReasonCode),
}

pub struct Mqtt<'a, T>
where
    T: Read + Write,
{
    client: MqttClient<'a, T, MQTT_MAX_PROPERTIES, CountingRng>,
}

impl<'a, T> Mqtt<'a, T>
where
    T: Read + Write,
{
    /// Connects to the broker over `transport`, registering an `offline`
    /// last will on the will topic.
    pub async fn new(
        transport: T,
        tx_buffer: &'a mut [u8],
        rx_buffer: &'a mut [u8],
    ) -> Result<Self, Error> {
        let mut config = ClientConfig::new(MqttVersion::MQTTv5, CountingRng(20000));
        config.add_max_subscribe_qos(QualityOfService::QoS1);
        config.add_client_id(CONFIG.mqtt_client_id);
        config.add_username(CONFIG.mqtt_username);
        config.add_password(CONFIG.mqtt_password);
        config.add_will(CONFIG.mqtt_will_topic, OFFLINE.as_bytes(), true);
        config.keep_alive = MQTT_KEEP_ALIVE_SECS;
        config.max_packet_size = tx_buffer.len() as u32;

        let tx_len = tx_buffer.len();
        let rx_len = rx_buffer.len();
        let mut client = MqttClient::<_, MQTT_MAX_PROPERTIES, _>::new(
            transport, tx_buffer, tx_len, rx_buffer, rx_len, config,
        );

        match client.connect_to_broker().await {
            Ok(()) => {
                log::info!("MQTT connected to broker successfully");
            }
            Err(e) => {
                log::error!("MQTT connect_to_broker failed: {:?}", e);
                return Err(Error::ConnectionFailed(e));
            }
        }

        Ok(Self { client })
    }

    /// Publishes with QoS 1 and waits for the broker acknowledgment.
    pub async fn send_message(
        &mut self,
        topic: &str,
        message: &[u8],
        retain: bool,
    ) -> Result<(), Error> {
        match self
            .client
            .send_message(topic, message, QualityOfService::QoS1, retain)
            .await
        {
            Ok(()) => {
                log::debug!("Message published to {} and acknowledged", topic);
                Ok(())
            }
            Err(e) => {
                log::error!("Failed to publish message to {}: {:?}", topic, e);
                Err(Error::PublishMessageFailed(e))
            }
        }
    }

    pub async fn disconnect(mut self) {
        if let Err(e) = self.client.disconnect().await {
            log::warn!("MQTT disconnect failed: {:?}", e);
        }
    }
}
