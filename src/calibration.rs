//! Linear correction of raw DHT11 readings.
//!
//! The DHT11 is cheap and biased. Each quantity is corrected with
//! `corrected = raw * slope + shift`, coefficients coming from a comparison
//! against a reference thermometer/hygrometer.

use crate::dht11::Reading;

/// Relative humidity is bounded whatever the correction says.
const HUMIDITY_RANGE: (f32, f32) = (0.0, 100.0);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Linear {
    pub slope: f32,
    pub shift: f32,
}

impl Linear {
    pub const IDENTITY: Self = Self::new(1.0, 0.0);

    pub const fn new(slope: f32, shift: f32) -> Self {
        Self { slope, shift }
    }

    #[inline]
    pub fn apply(&self, raw: f32) -> f32 {
        raw * self.slope + self.shift
    }
}

impl Default for Linear {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Calibration {
    pub temperature: Linear,
    pub humidity: Linear,
}

impl Calibration {
    pub fn apply(&self, raw: Reading) -> Reading {
        let humidity = self
            .humidity
            .apply(raw.humidity)
            .clamp(HUMIDITY_RANGE.0, HUMIDITY_RANGE.1);

        Reading {
            temperature: self.temperature.apply(raw.temperature),
            humidity,
        }
    }
}
