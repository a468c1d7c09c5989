#![no_std]
#![no_main]

use embassy_executor::Spawner;

use esp_alloc as _;
use esp_backtrace as _;
use esp_hal::{self as hal};
use esp_println::logger::init_logger;

use hal::{gpio::Flex, rng::Rng, rtc_cntl::Rtc, timer::timg::TimerGroup};

extern crate alloc;

mod mqtt;
mod publisher;
mod sensor;
mod sleep;
mod transport;
mod wifi;

use esp32_dht11_sensor::config::CONFIG;
use esp32_dht11_sensor::constants::*;
use esp32_dht11_sensor::schedule::{next_sleep_ms, Outcome};
use publisher::Publisher;
use sensor::Sensor;
use wifi::Wifi;

esp_bootloader_esp_idf::esp_app_desc!();

#[esp_hal_embassy::main]
async fn main(spawner: Spawner) {
    init_logger(log::LevelFilter::Info);
    log::info!(
        "DHT11 sensor {} v{} starting",
        CONFIG.mqtt_client_id,
        VERSION
    );

    let peripherals = esp_hal::init(esp_hal::Config::default());

    let rng = Rng::new(peripherals.RNG);
    let mut rtc = Rtc::new(peripherals.LPWR);

    esp_alloc::heap_allocator!(size: HEAP_SIZE);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    let timg1 = TimerGroup::new(peripherals.TIMG1);

    esp_hal_embassy::init(timg0.timer0);

    // DHT11 data line
    let dht_pin = Flex::new(peripherals.GPIO4);
    let mut sensor = match Sensor::new(dht_pin, CONFIG.calibration()) {
        Ok(sensor) => sensor,
        Err(e) => {
            log::error!("Sensor error: {:?}", e);
            sleep::until_next_cycle(&mut rtc, CONFIG.sleep_duration_ms()).await;
            hal::system::software_reset();
        }
    };

    // Sample before the radio starts, WiFi interrupts disturb the bit timing
    let mut measurement = sensor.sample(CONFIG.n_reads).await;

    let wifi = match Wifi::new(
        peripherals.WIFI,
        timg1.timer0,
        peripherals.RADIO_CLK,
        rng,
        spawner,
    )
    .await
    {
        Ok(wifi) => wifi,
        Err(e) => {
            log::error!("WiFi init error: {:?}", e);
            let sleep_ms = next_sleep_ms(Outcome::NetworkFailed, CONFIG.sleep_duration_ms());
            sleep::until_next_cycle(&mut rtc, sleep_ms).await;
            hal::system::software_reset();
        }
    };

    let mut publisher = Publisher::new(wifi);

    loop {
        let outcome = match &measurement {
            Ok(summary) => match publisher.publish(summary).await {
                Ok(()) => Outcome::Published,
                Err(e) => {
                    log::error!("Publish error: {:?}", e);
                    Outcome::NetworkFailed
                }
            },
            Err(e) => {
                log::error!("Measurement error: {:?}", e);
                Outcome::SensorFailed
            }
        };

        let sleep_ms = next_sleep_ms(outcome, CONFIG.sleep_duration_ms());
        sleep::until_next_cycle(&mut rtc, sleep_ms).await;

        measurement = sensor.sample(CONFIG.n_reads).await;
    }
}
