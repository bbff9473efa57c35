use std::time::Duration;

/// Default timeout for query commands and for each phase of a scan packet wait.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(500);

/// Default timeout for the answer to the scan command.
pub const DEFAULT_SCAN_START_TIMEOUT: Duration = Duration::from_millis(1000);

/// Serial baud rate the sensor talks at, for hosts opening the port.
pub const DEFAULT_BAUDRATE: u32 = 230_400;

/// Number of buckets in the degree table.
pub const DEGREE_BUCKETS: usize = 360;

/// Capacity of the channel's receive ring buffer.
pub const DEFAULT_CHANNEL_READ_BUFFER_SIZE: usize = 1024;
