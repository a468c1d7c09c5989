use crate::constants::{MIN_SLEEP_MS, NETWORK_RETRY_MS};

/// How a measurement cycle ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Published,
    SensorFailed,
    NetworkFailed,
}

/// Time to sleep before the next cycle.
///
/// A network failure wakes up again after at most `NETWORK_RETRY_MS` so an
/// outage of the broker doesn't cost a whole interval of data. A sensor
/// failure waits the full interval, the DHT11 rarely recovers sooner.
pub fn next_sleep_ms(outcome: Outcome, interval_ms: u64) -> u64 {
    let sleep = match outcome {
        Outcome::Published | Outcome::SensorFailed => interval_ms,
        Outcome::NetworkFailed => interval_ms.min(NETWORK_RETRY_MS),
    };
    sleep.max(MIN_SLEEP_MS)
}
