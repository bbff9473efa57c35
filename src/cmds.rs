// Commands without response

/// Command code to stop scanning and put the sensor in idle mode.
pub const LIDAR_CMD_STOP: u8 = 0x65;

// Commands with response

/// Command code to start scanning. The answer header is followed by an
/// endless stream of scan packets.
pub const LIDAR_CMD_SCAN: u8 = 0x60;

/// Command code to request device information (model, firmware, hardware, serial number).
pub const LIDAR_CMD_GET_DEVICE_INFO: u8 = 0x90;

/// Command code to request the device's health status.
pub const LIDAR_CMD_GET_DEVICE_HEALTH: u8 = 0x91;

/// Command code to read the currently configured scan frequency.
pub const LIDAR_CMD_GET_SCAN_FREQ: u8 = 0x0D;

/// Command code to raise the scan frequency by one step. Answers with the new frequency.
pub const LIDAR_CMD_SCAN_FREQ_INC: u8 = 0x09;

/// Command code to lower the scan frequency by one step. Answers with the new frequency.
pub const LIDAR_CMD_SCAN_FREQ_DEC: u8 = 0x0A;
