use core::convert::Infallible;

use embassy_time::{Duration, Instant, Timer};
use esp_hal::delay::Delay;
use esp_hal::gpio::{DriveMode, Flex, OutputConfig, Pull};
use log::{debug, info, warn};

use esp32_dht11_sensor::calibration::Calibration;
use esp32_dht11_sensor::constants::{DHT11_MIN_INTERVAL_MS, DHT11_WARMUP_MS};
use esp32_dht11_sensor::dht11::{self, Dht11, Reading};
use esp32_dht11_sensor::sampling::{Sampler, Summary};

#[derive(Debug)]
pub enum Error {
    InitFailure,
    NoValidReading,
}

pub struct Sensor {
    dht: Dht11<Flex<'static>, Delay>,
    calibration: Calibration,
    next_read_at: Instant,
}

impl Sensor {
    /// Takes the GPIO wired to the DHT11 data line and drives it open-drain.
    pub fn new(mut pin: Flex<'static>, calibration: Calibration) -> Result<Self, Error> {
        info!("Initialising DHT11...");
        pin.apply_output_config(
            &OutputConfig::default()
                .with_drive_mode(DriveMode::OpenDrain)
                .with_pull(Pull::Up),
        );
        pin.set_input_enable(true);
        pin.set_output_enable(true);

        let dht = Dht11::new(pin, Delay::new()).map_err(|_| Error::InitFailure)?;
        info!("Initialised DHT11");

        Ok(Self {
            dht,
            calibration,
            next_read_at: Instant::now() + Duration::from_millis(DHT11_WARMUP_MS),
        })
    }

    /// Reads the sensor `n_reads` times, spaced by the minimum interval the
    /// DHT11 supports, and returns the calibrated mean.
    pub async fn sample(&mut self, n_reads: usize) -> Result<Summary, Error> {
        let mut sampler = Sampler::new(n_reads);

        while !sampler.is_done() {
            Timer::at(self.next_read_at).await;

            let result = self.read().await;
            self.next_read_at = Instant::now() + Duration::from_millis(DHT11_MIN_INTERVAL_MS);

            match &result {
                Ok(reading) => debug!("DHT11 raw reading: {:?}", reading),
                Err(e) => warn!("DHT11 read failed: {:?}", e),
            }
            sampler.record(result);
        }

        let summary = sampler.finish().map_err(|_| Error::NoValidReading)?;
        let reading = self.calibration.apply(summary.reading);
        info!(
            "Measured {:.2}°C {:.2}% from {} reads ({} failed)",
            reading.temperature, reading.humidity, summary.valid, summary.failed
        );

        Ok(Summary { reading, ..summary })
    }

    /// The start pulse is awaited, the 40 bits are timed with interrupts
    /// masked so the WiFi stack can't stretch the pulses.
    async fn read(&mut self) -> Result<Reading, dht11::Error<Infallible>> {
        self.dht.start_signal()?;
        Timer::after(Duration::from_millis(dht11::START_LOW_MS as u64)).await;
        critical_section::with(|_| self.dht.receive())
    }
}
