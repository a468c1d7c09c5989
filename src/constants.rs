/// Current firmware version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Size of the heap in DRAM (internal memory), mostly used by the WiFi driver
pub const HEAP_SIZE: usize = 72 * 1024;

/// Size of the TCP socket receive buffer
pub const RX_BUFFER_SIZE: usize = 2048;
/// Size of the TCP socket transmit buffer
pub const TX_BUFFER_SIZE: usize = 2048;

/// Size of the MQTT client receive buffer for application data
pub const MQTT_RX_BUFFER_SIZE: usize = 512;
/// Size of the MQTT client transmit buffer for application data
pub const MQTT_TX_BUFFER_SIZE: usize = 512;
/// Maximum number of MQTT v5 properties handled per packet
pub const MQTT_MAX_PROPERTIES: usize = 5;
/// MQTT keep alive announced to the broker
pub const MQTT_KEEP_ALIVE_SECS: u16 = 30;

/// Delay before the second MQTT connect attempt, doubled on each further attempt
pub const MQTT_BACKOFF_BASE_MS: u64 = 500;
/// Upper bound for the delay between two MQTT connect attempts
pub const MQTT_BACKOFF_MAX_MS: u64 = 8_000;

/// Time allowed for a single WiFi association attempt
pub const WIFI_CONNECT_TIMEOUT_SECS: u64 = 15;
/// Delay before the connection task retries after a failure or disconnect
pub const WIFI_RECONNECT_DELAY_MS: u64 = 5_000;
/// Time allowed for link up and IP configuration before the cycle is abandoned
pub const NETWORK_READY_TIMEOUT_SECS: u64 = 30;

/// The DHT11 ignores commands during its first second after power up
pub const DHT11_WARMUP_MS: u64 = 1_000;
/// Minimum delay between two DHT11 reads
pub const DHT11_MIN_INTERVAL_MS: u64 = 1_100;
pub use crate::checks::MAX_READS;

/// The node never sleeps for less than this
pub const MIN_SLEEP_MS: u64 = 1_000;
/// Longest sleep after a cycle that couldn't reach the broker
pub const NETWORK_RETRY_MS: u64 = 60_000;

/// Capacity of formatted MQTT payloads
pub const PAYLOAD_CAPACITY: usize = 256;
