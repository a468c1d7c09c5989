//! Bit-banged DHT11 driver.
//!
//! The DHT11 talks over a single open-drain line pulled up to VCC. The host
//! holds the line low for at least 18ms, releases it, and the sensor answers
//! with 80µs low, 80µs high, then 40 bits. Every bit starts with ~50µs low,
//! followed by a high pulse of 26-28µs for a `0` or ~70µs for a `1`.
//!
//! Pulses are measured in polling iterations, not microseconds. A bit is a
//! `1` when its high pulse lasts longer than the ~50µs low preceding it, both
//! counted by the same loop, so the per-poll overhead cancels out.
//!
//! The frame is humidity (integral, decimal), temperature (integral,
//! decimal with the sign in bit 7), and a checksum byte.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

/// How long the host pulls the line low to wake the sensor
pub const START_LOW_MS: u32 = 20;
/// Upper bound, in polling iterations, for any single level of the exchange.
/// Each iteration lasts at least 1µs, so this is never shorter than 200µs.
const LEVEL_TIMEOUT_POLLS: u32 = 200;

const FRAME_BITS: usize = 40;

/// Measuring range of the sensor, anything outside is a corrupted frame
const TEMPERATURE_RANGE: (f32, f32) = (-20.0, 60.0);
const HUMIDITY_MAX: f32 = 100.0;

#[derive(Debug, PartialEq)]
pub enum Error<E> {
    /// The sensor didn't change the line level in time
    Timeout,
    /// The checksum byte doesn't match the data bytes
    Checksum,
    /// All data bytes are zero, the sensor isn't answering properly
    EmptyFrame,
    /// The decoded values are outside the sensor range
    OutOfRange,
    /// GPIO error
    Pin(E),
}

/// Temperature in °C and relative humidity in %
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Reading {
    pub temperature: f32,
    pub humidity: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Frame(pub [u8; 5]);

impl Frame {
    pub fn checksum_ok(&self) -> bool {
        let [h, hd, t, td, checksum] = self.0;
        h.wrapping_add(hd).wrapping_add(t).wrapping_add(td) == checksum
    }

    pub fn reading<E>(&self) -> Result<Reading, Error<E>> {
        if !self.checksum_ok() {
            return Err(Error::Checksum);
        }

        let [h, hd, t, td, _] = self.0;
        if h == 0 && hd == 0 && t == 0 && td == 0 {
            return Err(Error::EmptyFrame);
        }

        let humidity = h as f32 + hd as f32 / 10.0;
        let mut temperature = t as f32 + (td & 0x7F) as f32 / 10.0;
        if td & 0x80 != 0 {
            temperature = -temperature;
        }

        if humidity > HUMIDITY_MAX
            || temperature < TEMPERATURE_RANGE.0
            || temperature > TEMPERATURE_RANGE.1
        {
            return Err(Error::OutOfRange);
        }

        Ok(Reading {
            temperature,
            humidity,
        })
    }
}

/// A bit is a `1` when its high pulse outlasts the low pulse before it.
#[inline]
pub fn bit_from_pulses(low_polls: u32, high_polls: u32) -> bool {
    high_polls > low_polls
}

pub struct Dht11<P, D> {
    pin: P,
    delay: D,
}

impl<P, D> Dht11<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    /// `pin` must be configured as open-drain with a pull-up.
    pub fn new(mut pin: P, delay: D) -> Result<Self, Error<P::Error>> {
        pin.set_high().map_err(Error::Pin)?;
        Ok(Self { pin, delay })
    }

    /// Blocking read: start signal, `START_LOW_MS` wait, then reception.
    pub fn read(&mut self) -> Result<Reading, Error<P::Error>> {
        self.start_signal()?;
        self.delay.delay_ms(START_LOW_MS);
        self.receive()
    }

    /// Pulls the line low. The caller waits at least `START_LOW_MS` before
    /// calling [`Dht11::receive`], which is the timing-critical part.
    pub fn start_signal(&mut self) -> Result<(), Error<P::Error>> {
        self.pin.set_low().map_err(Error::Pin)
    }

    /// Releases the line and decodes the sensor answer.
    pub fn receive(&mut self) -> Result<Reading, Error<P::Error>> {
        let frame = self.receive_frame()?;
        let reading = frame.reading();
        if reading.is_err() {
            log::debug!("DHT11 rejected frame {:02x?}", frame.0);
        }
        reading
    }

    pub fn receive_frame(&mut self) -> Result<Frame, Error<P::Error>> {
        self.pin.set_high().map_err(Error::Pin)?;

        // response: line pulled low, then 80µs low and 80µs high
        self.wait_for(false)?;
        self.wait_for(true)?;
        self.wait_for(false)?;

        let mut bytes = [0u8; 5];
        for bit in 0..FRAME_BITS {
            let low_polls = self.wait_for(true)?;
            let high_polls = self.wait_for(false)?;

            let byte = &mut bytes[bit / 8];
            *byte = (*byte << 1) | u8::from(bit_from_pulses(low_polls, high_polls));
        }

        Ok(Frame(bytes))
    }

    /// Waits until the line is at `high`, returning the number of polls.
    fn wait_for(&mut self, high: bool) -> Result<u32, Error<P::Error>> {
        let mut polls = 0;
        while self.pin.is_high().map_err(Error::Pin)? != high {
            if polls >= LEVEL_TIMEOUT_POLLS {
                return Err(Error::Timeout);
            }
            self.delay.delay_us(1);
            polls += 1;
        }
        Ok(polls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use core::convert::Infallible;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Simulated single-wire line. After the host releases it, the line
    /// follows `script` (level, duration in µs) and then stays high.
    struct Line {
        clock: Rc<Cell<u32>>,
        driven_low: Rc<Cell<bool>>,
        released_at: Option<u32>,
        script: Vec<(bool, u32)>,
    }

    /// Advances the simulated time. `overhead_us` is added to every
    /// `delay_us`, like the GPIO read and loop cost on real hardware.
    struct Clock {
        now: Rc<Cell<u32>>,
        overhead_us: u32,
    }

    impl embedded_hal::digital::ErrorType for Line {
        type Error = Infallible;
    }

    impl OutputPin for Line {
        fn set_low(&mut self) -> Result<(), Infallible> {
            self.driven_low.set(true);
            self.released_at = None;
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Infallible> {
            if self.driven_low.get() {
                self.released_at = Some(self.clock.get());
            }
            self.driven_low.set(false);
            Ok(())
        }
    }

    impl InputPin for Line {
        fn is_high(&mut self) -> Result<bool, Infallible> {
            if self.driven_low.get() {
                return Ok(false);
            }
            let Some(released_at) = self.released_at else {
                return Ok(true);
            };

            let mut t = self.clock.get() - released_at;
            for &(level, duration) in &self.script {
                if t < duration {
                    return Ok(level);
                }
                t -= duration;
            }
            Ok(true)
        }

        fn is_low(&mut self) -> Result<bool, Infallible> {
            self.is_high().map(|high| !high)
        }
    }

    impl DelayNs for Clock {
        fn delay_ns(&mut self, ns: u32) {
            self.now.set(self.now.get() + ns.div_ceil(1000));
        }

        fn delay_us(&mut self, us: u32) {
            self.now.set(self.now.get() + us + self.overhead_us);
        }

        fn delay_ms(&mut self, ms: u32) {
            self.now.set(self.now.get() + ms * 1000);
        }
    }

    /// Sensor answer where bit `i` is a 50µs low followed by `highs[i]`µs high.
    fn sensor_pulses(highs: &[u32]) -> Vec<(bool, u32)> {
        let mut script = vec![(true, 30), (false, 80), (true, 80)];
        for &high in highs {
            script.push((false, 50));
            script.push((true, high));
        }
        script.push((false, 50));
        script
    }

    fn sensor_answering(bytes: [u8; 5]) -> Vec<(bool, u32)> {
        let highs: Vec<u32> = bytes
            .iter()
            .flat_map(|byte| (0..8).rev().map(move |i| byte & (1 << i) != 0))
            .map(|one| if one { 70 } else { 27 })
            .collect();
        sensor_pulses(&highs)
    }

    struct Bench {
        dht: Dht11<Line, Clock>,
        clock: Rc<Cell<u32>>,
        driven_low: Rc<Cell<bool>>,
    }

    fn bench(script: Vec<(bool, u32)>, overhead_us: u32) -> Bench {
        let clock = Rc::new(Cell::new(0));
        let driven_low = Rc::new(Cell::new(false));
        let line = Line {
            clock: clock.clone(),
            driven_low: driven_low.clone(),
            released_at: None,
            script,
        };
        let delay = Clock {
            now: clock.clone(),
            overhead_us,
        };
        Bench {
            dht: Dht11::new(line, delay).unwrap(),
            clock,
            driven_low,
        }
    }

    fn sensor(script: Vec<(bool, u32)>) -> Dht11<Line, Clock> {
        bench(script, 0).dht
    }

    fn read_frame(dht: &mut Dht11<Line, Clock>) -> Result<Frame, Error<Infallible>> {
        dht.start_signal()?;
        dht.delay.delay_ms(START_LOW_MS);
        dht.receive_frame()
    }

    #[test]
    fn reads_frame_from_line() {
        let bytes = [45, 0, 23, 4, 72];
        let mut dht = sensor(sensor_answering(bytes));
        assert_eq!(read_frame(&mut dht), Ok(Frame(bytes)));
    }

    #[test]
    fn read_decodes_reading() {
        let mut dht = sensor(sensor_answering([45, 0, 23, 4, 72]));
        let reading = dht.read().unwrap();
        assert_eq!(reading.humidity, 45.0);
        assert!((reading.temperature - 23.4).abs() < 1e-4);
    }

    #[test]
    fn decodes_with_slow_polling() {
        let bytes = [45, 0, 23, 4, 72];
        for overhead_us in [1, 2, 3] {
            let mut dht = bench(sensor_answering(bytes), overhead_us).dht;
            assert_eq!(read_frame(&mut dht), Ok(Frame(bytes)), "overhead {overhead_us}us");
        }
    }

    #[test]
    fn high_pulse_must_outlast_preceding_low() {
        // 50µs high after a 50µs low is a 0, 51µs is a 1
        let mut highs = [27u32; 40];
        highs[0] = 50;
        highs[1] = 51;
        let mut dht = sensor(sensor_pulses(&highs));
        let frame = read_frame(&mut dht).unwrap();
        assert_eq!(frame.0[0], 0b0100_0000);

        assert!(!bit_from_pulses(50, 50));
        assert!(bit_from_pulses(50, 51));
    }

    #[test]
    fn start_signal_then_receive() {
        let mut bench = bench(sensor_answering([45, 0, 23, 4, 72]), 0);
        bench.dht.start_signal().unwrap();
        assert!(bench.driven_low.get());

        bench.clock.set(bench.clock.get() + START_LOW_MS * 1000);
        let reading = bench.dht.receive().unwrap();
        assert_eq!(reading.humidity, 45.0);
        assert!(!bench.driven_low.get());
    }

    #[test]
    fn silent_sensor_times_out() {
        let mut dht = sensor(Vec::new());
        assert_eq!(dht.read(), Err(Error::Timeout));
    }

    #[test]
    fn truncated_answer_times_out() {
        let mut script = sensor_answering([45, 0, 23, 4, 72]);
        script.truncate(20);
        // stuck low in the middle of the frame
        script.push((false, 10_000));
        let mut dht = sensor(script);
        assert_eq!(dht.read(), Err(Error::Timeout));
    }

    #[test]
    fn corrupted_frame_fails_checksum() {
        let mut dht = sensor(sensor_answering([45, 0, 23, 4, 73]));
        assert_eq!(dht.read(), Err(Error::Checksum));
    }

    #[test]
    fn checksum_wraps_around() {
        let frame = Frame([200, 9, 50, 9, 12]);
        assert!(frame.checksum_ok());
    }

    #[test]
    fn negative_temperature() {
        let reading = Frame([40, 0, 5, 0x83, 40 + 5 + 0x83])
            .reading::<Infallible>()
            .unwrap();
        assert!((reading.temperature + 5.3).abs() < 1e-4);
    }

    #[test]
    fn empty_frame_is_rejected() {
        assert_eq!(
            Frame([0; 5]).reading::<Infallible>(),
            Err(Error::EmptyFrame)
        );
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        assert_eq!(
            Frame([120, 0, 20, 0, 140]).reading::<Infallible>(),
            Err(Error::OutOfRange)
        );
        assert_eq!(
            Frame([40, 0, 80, 0, 120]).reading::<Infallible>(),
            Err(Error::OutOfRange)
        );
        // -21.0°C
        assert_eq!(
            Frame([40, 0, 21, 0x80, 40 + 21 + 0x80]).reading::<Infallible>(),
            Err(Error::OutOfRange)
        );
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let cold = Frame([40, 0, 20, 0x80, 40 + 20 + 0x80])
            .reading::<Infallible>()
            .unwrap();
        assert_eq!(cold.temperature, -20.0);

        let hot = Frame([100, 0, 60, 0, 160]).reading::<Infallible>().unwrap();
        assert_eq!(hot.temperature, 60.0);
        assert_eq!(hot.humidity, 100.0);
    }

    #[test]
    fn line_is_released_after_read() {
        let mut bench = bench(sensor_answering([45, 0, 23, 4, 72]), 0);
        bench.dht.read().unwrap();
        assert!(!bench.driven_low.get());
    }
}
