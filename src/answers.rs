use crate::types::Health;
use byteorder::{ByteOrder, LittleEndian};
use log::warn;

/// First sync byte of every answer header.
pub const LIDAR_ANS_SYNC_BYTE1: u8 = 0xA5;
/// Second sync byte of every answer header.
pub const LIDAR_ANS_SYNC_BYTE2: u8 = 0x5A;

/// Size of an answer header on the wire, sync bytes included.
pub const LIDAR_ANS_HEADER_SIZE: usize = 7;

const LIDAR_ANS_HEADER_SIZE_MASK: u32 = 0x3FFF_FFFF;
const LIDAR_ANS_HEADER_SUBTYPE_SHIFT: u32 = 30;

/// Answer type for device information.
pub const LIDAR_ANS_TYPE_DEVINFO: u8 = 0x4;
/// Answer type for device health.
pub const LIDAR_ANS_TYPE_DEVHEALTH: u8 = 0x6;
/// Answer type for scan frequency queries and adjustments.
/// The sensor reuses the device information code here.
pub const LIDAR_ANS_TYPE_GETFREQ: u8 = 0x4;
/// Answer type announcing the measurement stream after a scan command.
pub const LIDAR_ANS_TYPE_MEASUREMENT: u8 = 0x81;

/// Size of one legacy measurement node; the smallest size a measurement
/// answer may declare.
pub const LIDAR_RESP_MEASUREMENT_NODE_SIZE: u32 = 5;

/// Health status code indicating the sensor is operating correctly.
pub const LIDAR_HEALTH_STATUS_OK: u8 = 0;
/// Health status code indicating a non-critical warning.
pub const LIDAR_HEALTH_STATUS_WARNING: u8 = 1;
/// Health status code indicating a critical error.
pub const LIDAR_HEALTH_STATUS_ERROR: u8 = 2;

/// The fixed 7-byte header preceding every answer.
///
/// Bytes 2..6 hold a little-endian 32-bit word whose low 30 bits are the
/// declared payload size and whose top 2 bits are the sub type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseHeader {
    /// Declared payload size (30 bits).
    pub size: u32,
    /// Sub type (2 bits).
    pub sub_type: u8,
    /// Answer type code.
    pub ans_type: u8,
}

impl ResponseHeader {
    /// Decodes a header from a full frame, sync bytes included.
    pub fn decode(frame: &[u8; LIDAR_ANS_HEADER_SIZE]) -> ResponseHeader {
        let (size, sub_type) = unpack_size_and_subtype(LittleEndian::read_u32(&frame[2..6]));
        ResponseHeader {
            size,
            sub_type,
            ans_type: frame[6],
        }
    }

    /// Encodes the header into its wire form.
    pub fn encode(&self) -> [u8; LIDAR_ANS_HEADER_SIZE] {
        let mut frame = [0; LIDAR_ANS_HEADER_SIZE];
        frame[0] = LIDAR_ANS_SYNC_BYTE1;
        frame[1] = LIDAR_ANS_SYNC_BYTE2;
        LittleEndian::write_u32(
            &mut frame[2..6],
            pack_size_and_subtype(self.size, self.sub_type),
        );
        frame[6] = self.ans_type;
        frame
    }
}

/// Splits the raw header word into `(size, sub_type)`.
#[inline]
pub fn unpack_size_and_subtype(word: u32) -> (u32, u8) {
    (
        word & LIDAR_ANS_HEADER_SIZE_MASK,
        (word >> LIDAR_ANS_HEADER_SUBTYPE_SHIFT) as u8,
    )
}

/// Joins `size` and `sub_type` into the raw header word. Excess bits are masked off.
#[inline]
pub fn pack_size_and_subtype(size: u32, sub_type: u8) -> u32 {
    (size & LIDAR_ANS_HEADER_SIZE_MASK) | (((sub_type & 0x3) as u32) << LIDAR_ANS_HEADER_SUBTYPE_SHIFT)
}

/// A fixed-size answer payload.
pub trait Answer: Sized {
    /// Answer type the header must carry.
    const ANS_TYPE: u8;
    /// Payload size on the wire.
    const SIZE: usize;

    /// Parses the payload. `data` is exactly `SIZE` bytes long.
    fn parse(data: &[u8]) -> Self;
}

/// Health report of the sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceHealth {
    /// Health status code (see `LIDAR_HEALTH_STATUS_*`).
    pub status: u8,
    /// Error code reported alongside a warning or error status.
    pub error_code: u16,
}

impl DeviceHealth {
    /// Interprets the status code.
    pub fn health(&self) -> Health {
        match self.status {
            LIDAR_HEALTH_STATUS_OK => Health::Healthy,
            LIDAR_HEALTH_STATUS_WARNING => Health::Warning(self.error_code),
            LIDAR_HEALTH_STATUS_ERROR => Health::Error(self.error_code),
            status => {
                warn!("Unknown health status code: {}", status);
                Health::Healthy
            }
        }
    }
}

impl Answer for DeviceHealth {
    const ANS_TYPE: u8 = LIDAR_ANS_TYPE_DEVHEALTH;
    const SIZE: usize = 3;

    fn parse(data: &[u8]) -> DeviceHealth {
        DeviceHealth {
            status: data[0],
            error_code: LittleEndian::read_u16(&data[1..3]),
        }
    }
}

/// Identification of the sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Model ID.
    pub model: u8,
    /// Firmware version (major << 8 | minor).
    pub firmware_version: u16,
    /// Hardware version.
    pub hardware_version: u8,
    /// 16-byte serial number.
    pub serial_number: [u8; 16],
}

impl DeviceInfo {
    /// Firmware version as `(major, minor)`.
    pub fn firmware(&self) -> (u8, u8) {
        ((self.firmware_version >> 8) as u8, self.firmware_version as u8)
    }
}

impl Answer for DeviceInfo {
    const ANS_TYPE: u8 = LIDAR_ANS_TYPE_DEVINFO;
    const SIZE: usize = 20;

    fn parse(data: &[u8]) -> DeviceInfo {
        let mut serial_number = [0; 16];
        serial_number.copy_from_slice(&data[4..20]);
        DeviceInfo {
            model: data[0],
            firmware_version: LittleEndian::read_u16(&data[1..3]),
            hardware_version: data[3],
            serial_number,
        }
    }
}

/// Scan frequency reported by the sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrequencyInfo {
    /// Raw frequency value as sent by the sensor.
    pub frequency: u32,
}

impl Answer for FrequencyInfo {
    const ANS_TYPE: u8 = LIDAR_ANS_TYPE_GETFREQ;
    const SIZE: usize = 4;

    fn parse(data: &[u8]) -> FrequencyInfo {
        FrequencyInfo {
            frequency: LittleEndian::read_u32(data),
        }
    }
}
