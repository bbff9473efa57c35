use crate::internals::{DEFAULT_SCAN_START_TIMEOUT, DEFAULT_TIMEOUT};
use crate::utils::degree_bucket;
use std::time::Duration;

/// A single reconstructed measurement from a scan packet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanSample {
    /// Angle in degrees after interpolation, correction and normalization.
    ///
    /// Normally in `(0, 360]`. Normalization adds or subtracts 360 at most
    /// once, so angles derived from out-of-range packet angles may stay
    /// outside that range.
    pub angle: f32,
    /// Raw 14-bit distance as sent by the sensor. Zero means no return.
    pub distance: u16,
    /// Raw 10-bit intensity.
    pub intensity: u16,
}

impl ScanSample {
    /// Index of the degree table bucket this sample lands in.
    #[inline]
    pub fn degree_bucket(&self) -> usize {
        degree_bucket(self.angle)
    }

    /// Angle in radians.
    #[inline]
    pub fn angle_radians(&self) -> f32 {
        self.angle.to_radians()
    }

    /// Returns `true` if the sensor reported a return for this sample.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.distance != 0
    }
}

/// Kind of a scan packet, taken from its CT byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketType {
    /// Regular point cloud packet.
    Normal,
    /// First packet of a new revolution.
    RingStart,
    /// Any other CT value; kept verbatim.
    Other(u8),
}

impl From<u8> for PacketType {
    fn from(ct: u8) -> PacketType {
        match ct {
            0 => PacketType::Normal,
            1 => PacketType::RingStart,
            other => PacketType::Other(other),
        }
    }
}

/// How the scan packet decoder treats a checksum mismatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChecksumMode {
    /// Log the mismatch and accept the packet.
    #[default]
    Lenient,
    /// Reject the packet with a protocol error; nothing is aggregated.
    Strict,
}

/// Represents the health status reported by the sensor.
#[derive(Debug, Clone, PartialEq)]
pub enum Health {
    /// The device reports it is operating correctly.
    Healthy,
    /// The device reports a warning condition, but may still be operational. Contains the warning code.
    Warning(u16),
    /// The device reports a fatal error and is likely not operational. Contains the error code.
    Error(u16),
}

/// Driver settings.
#[derive(Debug, Clone, PartialEq)]
pub struct LidarConfig {
    /// Budget for query commands, and for each phase of a scan packet wait.
    pub timeout: Duration,
    /// Budget for the answer to the scan command.
    pub scan_start_timeout: Duration,
    /// Checksum policy for scan packets.
    pub checksum: ChecksumMode,
    /// Apply the optical offset correction to sample angles.
    pub angle_correction: bool,
}

impl LidarConfig {
    /// Returns a copy with `timeout` replaced.
    pub fn with_timeout(mut self, timeout: Duration) -> LidarConfig {
        self.timeout = timeout;
        self
    }

    /// Returns a copy with `scan_start_timeout` replaced.
    pub fn with_scan_start_timeout(mut self, timeout: Duration) -> LidarConfig {
        self.scan_start_timeout = timeout;
        self
    }

    /// Returns a copy with the checksum policy replaced.
    pub fn with_checksum(mut self, checksum: ChecksumMode) -> LidarConfig {
        self.checksum = checksum;
        self
    }

    /// Returns a copy with angle correction switched on or off.
    pub fn with_angle_correction(mut self, angle_correction: bool) -> LidarConfig {
        self.angle_correction = angle_correction;
        self
    }
}

impl Default for LidarConfig {
    fn default() -> LidarConfig {
        LidarConfig {
            timeout: DEFAULT_TIMEOUT,
            scan_start_timeout: DEFAULT_SCAN_START_TIMEOUT,
            checksum: ChecksumMode::Lenient,
            angle_correction: true,
        }
    }
}
