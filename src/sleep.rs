use embassy_time::{Duration, Timer};
use esp_hal::rtc_cntl::{sleep::TimerWakeupSource, Rtc};
use log::info;

use esp32_dht11_sensor::config::CONFIG;

/// Sleeps until the next measurement. In deep sleep mode the chip resets on
/// wake up and this never returns.
pub async fn until_next_cycle(rtc: &mut Rtc<'_>, sleep_ms: u64) {
    if CONFIG.deep_sleep {
        info!("Entering deep sleep for {} ms", sleep_ms);
        let timer = TimerWakeupSource::new(core::time::Duration::from_millis(sleep_ms));
        rtc.sleep_deep(&[&timer]);
    }

    info!("Next measurement in {} ms", sleep_ms);
    Timer::after(Duration::from_millis(sleep_ms)).await;
}
