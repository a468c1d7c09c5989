use crate::constants::MAX_READS;
use crate::dht11::Reading;

#[derive(Debug, PartialEq)]
pub enum Error {
    NoValidReading,
}

/// Result of one sampling round
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Summary {
    /// Mean of the valid readings
    pub reading: Reading,
    pub valid: usize,
    pub failed: usize,
}

/// Averages a fixed number of read attempts, ignoring failed ones.
#[derive(Debug)]
pub struct Sampler {
    attempts: usize,
    valid: usize,
    failed: usize,
    temperature_sum: f32,
    humidity_sum: f32,
}

impl Sampler {
    /// `attempts` is kept within `1..=MAX_READS`.
    pub fn new(attempts: usize) -> Self {
        Self {
            attempts: attempts.clamp(1, MAX_READS),
            valid: 0,
            failed: 0,
            temperature_sum: 0.0,
            humidity_sum: 0.0,
        }
    }

    pub fn is_done(&self) -> bool {
        self.valid + self.failed >= self.attempts
    }

    /// Records the outcome of one read attempt. Attempts past the configured
    /// count are ignored.
    pub fn record<E>(&mut self, result: Result<Reading, E>) {
        if self.is_done() {
            return;
        }

        match result {
            Ok(reading) => {
                self.valid += 1;
                self.temperature_sum += reading.temperature;
                self.humidity_sum += reading.humidity;
            }
            Err(_) => self.failed += 1,
        }
    }

    pub fn finish(self) -> Result<Summary, Error> {
        if self.valid == 0 {
            return Err(Error::NoValidReading);
        }

        let count = self.valid as f32;
        Ok(Summary {
            reading: Reading {
                temperature: self.temperature_sum / count,
                humidity: self.humidity_sum / count,
            },
            valid: self.valid,
            failed: self.failed,
        })
    }
}
