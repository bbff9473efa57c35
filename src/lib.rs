//! # YDLIDAR Driver
//!
//! `ydlidar` is a driver for YDLIDAR X4-class triangulation laser sensors talking over a serial link.
//! It provides access to the sensor's command set (health, device info, scan frequency, start/stop),
//! decodes the scan packet stream and folds the measurements into a per-degree range table.

extern crate byteorder;
extern crate log;

mod answers;
pub mod base;
mod checksum;
mod cmds;
mod degree_table;
mod internals;
mod parsers;
mod protocol;
#[cfg(test)]
mod testing;
pub mod types;
pub mod utils;

pub use crate::answers::{DeviceHealth, DeviceInfo, FrequencyInfo, ResponseHeader};
pub use crate::base::{ByteStream, Channel, Error, Message, Result};
pub use crate::degree_table::DegreeTable;
pub use crate::internals::{DEFAULT_BAUDRATE, DEGREE_BUCKETS};
pub use crate::parsers::{RawScanPacket, ScanPacket, ScanPacketDecoder, ScanPacketParser};
pub use crate::protocol::{CommandEncoder, FrameSynchronizer};

use crate::answers::*;
use crate::base::Deadline;
use crate::cmds::*;
use crate::protocol::await_header;
use crate::types::LidarConfig;
use log::{error, trace, warn};
use std::io::{Read, Write};
use std::time::Duration;

/// Represents a connection to and control interface for a YDLIDAR device.
///
/// The device owns the serial stream (through a [`Channel`]), the scan packet
/// decoder and the degree table the decoded samples are folded into. It can be
/// created closed and opened later; every operation on a closed device fails
/// without touching the wire.
#[derive(Debug)]
pub struct LidarDevice<T: ?Sized> {
    channel: Option<Channel<T>>,
    config: LidarConfig,
    decoder: ScanPacketDecoder,
    table: DegreeTable,
}

fn not_open() -> Error {
    Error::OperationFail {
        description: "transport not open".to_owned(),
    }
}

impl<T: ?Sized> LidarDevice<T>
where
    T: Read + Write,
{
    /// Constructs a closed `LidarDevice` with the given settings.
    pub fn new(config: LidarConfig) -> LidarDevice<T> {
        trace!("Creating new LidarDevice with {:?}", config);
        LidarDevice {
            channel: None,
            decoder: ScanPacketDecoder::new(config.checksum, config.angle_correction),
            table: DegreeTable::new(),
            config,
        }
    }

    /// Constructs an open `LidarDevice` over a communication stream (e.g. a serial port),
    /// with default settings.
    ///
    /// # Example
    /// ```ignore
    /// # use ydlidar::{LidarDevice, DEFAULT_BAUDRATE};
    /// # use std::time::Duration;
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let serial_port = serialport::new("/dev/ttyUSB0", DEFAULT_BAUDRATE)
    ///     .timeout(Duration::from_millis(1))
    ///     .open()?;
    /// let mut lidar = LidarDevice::with_stream(serial_port);
    /// lidar.start_scan()?;
    /// loop {
    ///     lidar.wait_scan_packet()?;
    ///     println!("{:?}", &lidar.distance_list()[..10]);
    /// }
    /// # }
    /// ```
    pub fn with_stream(stream: Box<T>) -> LidarDevice<T> {
        trace!("Creating new LidarDevice with stream");
        let mut device = LidarDevice::new(LidarConfig::default());
        device.open(stream);
        device
    }

    /// Attaches `stream` as the transport. A previously attached stream is dropped.
    pub fn open(&mut self, stream: Box<T>) {
        if self.channel.is_some() {
            warn!("Opening LidarDevice that is already open, dropping previous stream");
        }
        trace!("Opening LidarDevice");
        self.channel = Some(Channel::new(stream));
        self.decoder.reset();
    }

    /// Detaches and returns the transport, or `None` if the device was not open.
    pub fn close(&mut self) -> Option<Box<T>> {
        trace!("Closing LidarDevice");
        self.channel.take().map(Channel::into_inner)
    }

    /// Returns `true` while a transport is attached.
    pub fn is_open(&self) -> bool {
        self.channel.is_some()
    }

    /// Settings this device was created with.
    pub fn config(&self) -> &LidarConfig {
        &self.config
    }

    fn channel_mut(&mut self) -> Result<&mut Channel<T>> {
        match self.channel.as_mut() {
            Some(channel) => Ok(channel),
            None => {
                error!("Operation attempted on a closed LidarDevice");
                Err(not_open())
            }
        }
    }

    /// Sends `cmd` and reads back a fixed-size answer of type `A`.
    ///
    /// The header is awaited with its own `timeout` budget; the payload is
    /// read under the operation budget started before the command was sent.
    fn request<A: Answer>(&mut self, cmd: u8, timeout: Duration) -> Result<A> {
        let deadline = Deadline::after(timeout);
        let channel = self.channel_mut()?;

        trace!("Invoking command: {:02X}", cmd);
        channel.write(&Message::new(cmd))?;

        let header = match await_header(channel, timeout) {
            Ok(header) => header,
            Err(e) => {
                warn!("No response header for command {:02X}: {}", cmd, e);
                return Err(e);
            }
        };

        if header.ans_type != A::ANS_TYPE {
            error!(
                "Unexpected response type for {:02X}: expected {:02X}, got {:02X}",
                cmd,
                A::ANS_TYPE,
                header.ans_type
            );
            return Err(Error::protocol(format!(
                "unexpected response type: expected {:02X}, got {:02X}",
                A::ANS_TYPE,
                header.ans_type
            )));
        }

        if (header.size as usize) < A::SIZE {
            error!(
                "Response to {:02X} too small: declared {}, need {}",
                cmd,
                header.size,
                A::SIZE
            );
            return Err(Error::protocol(format!(
                "invalid data size: expected at least {}, got {}",
                A::SIZE,
                header.size
            )));
        }

        let mut data = Vec::with_capacity(A::SIZE);
        while data.len() < A::SIZE {
            if deadline.expired() {
                warn!(
                    "Timeout reading response payload for {:02X} ({} of {} bytes)",
                    cmd,
                    data.len(),
                    A::SIZE
                );
                return Err(Error::OperationTimeout);
            }
            if let Some(byte) = channel.read_byte()? {
                data.push(byte);
            }
        }

        trace!("Response payload for {:02X}: {:02X?}", cmd, data);
        Ok(A::parse(&data))
    }

    /// Gets the health status of the sensor.
    /// Uses the configured query timeout.
    pub fn get_health(&mut self) -> Result<DeviceHealth> {
        trace!("Getting device health with default timeout");
        self.get_health_with_timeout(self.config.timeout)
    }

    /// Gets the health status of the sensor with a specified timeout.
    ///
    /// # Arguments
    ///
    /// * `timeout` - The maximum duration to wait for the response.
    pub fn get_health_with_timeout(&mut self, timeout: Duration) -> Result<DeviceHealth> {
        trace!("Getting device health with timeout: {:?}", timeout);
        let health = self.request::<DeviceHealth>(LIDAR_CMD_GET_DEVICE_HEALTH, timeout)?;
        trace!("Device health: {:?}", health);
        Ok(health)
    }

    /// Gets the device information (model, firmware, hardware, serial number) of the sensor.
    /// Uses the configured query timeout.
    pub fn get_device_info(&mut self) -> Result<DeviceInfo> {
        trace!("Getting device info with default timeout");
        self.get_device_info_with_timeout(self.config.timeout)
    }

    /// Gets the device information with a specified timeout.
    ///
    /// # Arguments
    ///
    /// * `timeout` - The maximum duration to wait for the response.
    pub fn get_device_info_with_timeout(&mut self, timeout: Duration) -> Result<DeviceInfo> {
        trace!("Getting device info with timeout: {:?}", timeout);
        let info = self.request::<DeviceInfo>(LIDAR_CMD_GET_DEVICE_INFO, timeout)?;
        trace!("Device info: {:?}", info);
        Ok(info)
    }

    /// Reads the current scan frequency.
    pub fn get_scan_frequency(&mut self) -> Result<FrequencyInfo> {
        self.get_scan_frequency_with_timeout(self.config.timeout)
    }

    pub fn get_scan_frequency_with_timeout(&mut self, timeout: Duration) -> Result<FrequencyInfo> {
        trace!("Getting scan frequency with timeout: {:?}", timeout);
        self.request::<FrequencyInfo>(LIDAR_CMD_GET_SCAN_FREQ, timeout)
    }

    /// Raises the scan frequency by one step and returns the new value.
    pub fn increase_frequency(&mut self) -> Result<FrequencyInfo> {
        self.increase_frequency_with_timeout(self.config.timeout)
    }

    pub fn increase_frequency_with_timeout(&mut self, timeout: Duration) -> Result<FrequencyInfo> {
        trace!("Increasing scan frequency with timeout: {:?}", timeout);
        self.request::<FrequencyInfo>(LIDAR_CMD_SCAN_FREQ_INC, timeout)
    }

    /// Lowers the scan frequency by one step and returns the new value.
    pub fn decrease_frequency(&mut self) -> Result<FrequencyInfo> {
        self.decrease_frequency_with_timeout(self.config.timeout)
    }

    pub fn decrease_frequency_with_timeout(&mut self, timeout: Duration) -> Result<FrequencyInfo> {
        trace!("Decreasing scan frequency with timeout: {:?}", timeout);
        self.request::<FrequencyInfo>(LIDAR_CMD_SCAN_FREQ_DEC, timeout)
    }

    /// Sends the stop command, halting any ongoing measurements. No answer is expected.
    pub fn stop(&mut self) -> Result<()> {
        trace!("Sending STOP command ({:02X})", LIDAR_CMD_STOP);
        self.channel_mut()?.write(&Message::new(LIDAR_CMD_STOP))?;
        trace!("STOP command sent successfully");
        Ok(())
    }

    /// Stops any running scan, then starts scanning.
    /// Uses the configured scan start timeout.
    pub fn start_scan(&mut self) -> Result<()> {
        trace!("Starting scan with default timeout");
        self.start_scan_with_timeout(self.config.scan_start_timeout)
    }

    /// Stops any running scan, then starts scanning with a specified timeout.
    ///
    /// On success the sensor streams scan packets; read them with
    /// [`LidarDevice::wait_scan_packet`].
    ///
    /// # Arguments
    ///
    /// * `timeout` - The maximum duration to wait for the scan answer header.
    pub fn start_scan_with_timeout(&mut self, timeout: Duration) -> Result<()> {
        trace!("Starting scan with timeout: {:?}", timeout);
        self.stop()?;

        let channel = self.channel_mut()?;
        trace!("Sending SCAN command ({:02X})", LIDAR_CMD_SCAN);
        channel.write(&Message::new(LIDAR_CMD_SCAN))?;

        let header = match await_header(channel, timeout) {
            Ok(header) => header,
            Err(e) => {
                warn!("No answer header for SCAN: {}", e);
                return Err(e);
            }
        };

        if header.ans_type != LIDAR_ANS_TYPE_MEASUREMENT {
            error!(
                "Unexpected response type for SCAN: expected {:02X}, got {:02X}",
                LIDAR_ANS_TYPE_MEASUREMENT, header.ans_type
            );
            return Err(Error::protocol(format!(
                "unexpected response type: expected {:02X}, got {:02X}",
                LIDAR_ANS_TYPE_MEASUREMENT, header.ans_type
            )));
        }

        if header.size < LIDAR_RESP_MEASUREMENT_NODE_SIZE {
            error!(
                "SCAN answer declares {} bytes, need at least {}",
                header.size, LIDAR_RESP_MEASUREMENT_NODE_SIZE
            );
            return Err(Error::protocol(format!(
                "invalid data size: expected at least {}, got {}",
                LIDAR_RESP_MEASUREMENT_NODE_SIZE, header.size
            )));
        }

        self.decoder.reset();
        trace!("Scan started");
        Ok(())
    }

    /// Waits for the next scan packet and folds it into the degree table.
    /// Uses the configured timeout for each packet phase.
    pub fn wait_scan_packet(&mut self) -> Result<ScanPacket> {
        self.wait_scan_packet_with_timeout(self.config.timeout)
    }

    /// Waits for the next scan packet with a specified timeout.
    ///
    /// # Arguments
    ///
    /// * `timeout` - Budget for the packet preamble, and again for the sample block.
    pub fn wait_scan_packet_with_timeout(&mut self, timeout: Duration) -> Result<ScanPacket> {
        let channel = match self.channel.as_mut() {
            Some(channel) => channel,
            None => {
                error!("Operation attempted on a closed LidarDevice");
                return Err(not_open());
            }
        };

        let packet = self.decoder.wait_packet(channel, &mut self.table, timeout)?;
        trace!(
            "Scan packet: {:?}, {} samples, {:.2}..{:.2} deg",
            packet.packet_type,
            packet.samples.len(),
            packet.first_angle,
            packet.last_angle
        );
        Ok(packet)
    }

    /// Distances per degree bucket, as of the last decoded packet touching each bucket.
    pub fn distance_list(&self) -> &[u16; DEGREE_BUCKETS] {
        self.table.distances()
    }

    /// Intensities per degree bucket, paired with [`LidarDevice::distance_list`].
    pub fn intensity_list(&self) -> &[u16; DEGREE_BUCKETS] {
        self.table.intensities()
    }

    pub fn degree_table(&self) -> &DegreeTable {
        &self.table
    }

    /// Clears the degree table.
    pub fn reset_degree_table(&mut self) {
        self.table.reset();
    }
}
