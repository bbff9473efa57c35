use crate::answers::{
    ResponseHeader, LIDAR_ANS_HEADER_SIZE, LIDAR_ANS_SYNC_BYTE1, LIDAR_ANS_SYNC_BYTE2,
};
use crate::base::{ByteStream, Deadline, Error, Message, Result};
use crate::checksum::Checksum;
use log::{error, trace};
use std::io::Write;
use std::time::Duration;

const LIDAR_CMD_SYNC_BYTE: u8 = 0xA5;
const LIDAR_CMDFLAG_HAS_PAYLOAD: u8 = 0x80;

const LIDAR_ANS_SYNC_BYTES: [u8; 2] = [LIDAR_ANS_SYNC_BYTE1, LIDAR_ANS_SYNC_BYTE2];

/// Encodes command packets.
///
/// A parameterless command is `[0xA5][cmd]`. A command with payload sets the
/// payload flag on the command byte and appends the payload length, the
/// payload and an XOR checksum over everything before it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandEncoder;

impl CommandEncoder {
    pub fn new() -> CommandEncoder {
        CommandEncoder
    }

    /// Encodes `msg` into `bytes`, returning the encoded length.
    pub fn encode(&self, msg: &Message, bytes: &mut [u8]) -> Result<usize> {
        let encoded_size = self.estimate_encoded_size(msg)?;
        if encoded_size > bytes.len() {
            error!(
                "Buffer too small: required {}, available {}",
                encoded_size,
                bytes.len()
            );
            return Err(Error::BufferTooSmall);
        }

        bytes[0] = LIDAR_CMD_SYNC_BYTE;
        if !msg.has_payload() {
            bytes[1] = msg.cmd;
            return Ok(2);
        }

        let len = msg.data.len();
        bytes[1] = msg.cmd | LIDAR_CMDFLAG_HAS_PAYLOAD;
        bytes[2] = len as u8;
        bytes[3..3 + len].clone_from_slice(&msg.data);

        let mut checksum = Checksum::new();
        checksum.push_slice(&bytes[0..3 + len]);
        bytes[3 + len] = checksum.checksum();
        trace!("Command checksum: {:02X}", bytes[3 + len]);

        Ok(encoded_size)
    }

    /// Size the encoded form of `msg` will take.
    pub fn estimate_encoded_size(&self, msg: &Message) -> Result<usize> {
        if msg.data.len() > 255 {
            return Err(Error::OperationFail {
                description: "payload too big".to_owned(),
            });
        }

        if msg.has_payload() {
            Ok(4 + msg.data.len()) // Sync + Cmd + Len + Data + Checksum
        } else {
            Ok(2) // Sync + Cmd
        }
    }

    /// Encodes `msg` and writes it to `dest`.
    pub fn write_to(&self, msg: &Message, dest: &mut impl Write) -> Result<usize> {
        let mut buf = vec![0; self.estimate_encoded_size(msg)?];
        let encoded_size = self.encode(msg, &mut buf)?;
        trace!("Writing command bytes {:02X?}", &buf[..encoded_size]);
        dest.write_all(&buf[..encoded_size])?;
        Ok(encoded_size)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum SyncStatus {
    WaitSyncByte(usize),
    Collect,
}

/// Recovers fixed-size answer frames from an unsynchronized byte stream.
///
/// Position 0 only accepts the first sync byte; anything else is dropped.
/// Position 1 only accepts the second sync byte; anything else is dropped
/// and scanning restarts at position 0 with the next byte. Once both sync
/// bytes are in, every byte is appended until the frame is full.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSynchronizer {
    status: SyncStatus,
    expected_size: usize,
    frame: Vec<u8>,
}

impl FrameSynchronizer {
    /// Creates a synchronizer yielding frames of `expected_size` bytes,
    /// sync bytes included. Sizes below 2 are raised to 2.
    pub fn new(expected_size: usize) -> FrameSynchronizer {
        let expected_size = expected_size.max(LIDAR_ANS_SYNC_BYTES.len());
        FrameSynchronizer {
            status: SyncStatus::WaitSyncByte(0),
            expected_size,
            frame: Vec::with_capacity(expected_size),
        }
    }

    /// Number of frame bytes accepted so far.
    pub fn position(&self) -> usize {
        self.frame.len()
    }

    /// Drops any partial frame and waits for the first sync byte again.
    pub fn reset(&mut self) {
        self.status = SyncStatus::WaitSyncByte(0);
        self.frame.clear();
    }

    /// Feeds one byte, returning the frame once it is complete.
    pub fn push(&mut self, byte: u8) -> Option<Vec<u8>> {
        match self.status {
            SyncStatus::WaitSyncByte(i) => {
                if byte != LIDAR_ANS_SYNC_BYTES[i] {
                    if i > 0 {
                        trace!("Sync byte {} mismatch ({:02X}), rescanning", i, byte);
                    }
                    self.reset();
                    return None;
                }
                self.frame.push(byte);
                self.status = if i + 1 == LIDAR_ANS_SYNC_BYTES.len() {
                    SyncStatus::Collect
                } else {
                    SyncStatus::WaitSyncByte(i + 1)
                };
            }
            SyncStatus::Collect => self.frame.push(byte),
        }

        if self.frame.len() == self.expected_size {
            let frame = std::mem::replace(&mut self.frame, Vec::with_capacity(self.expected_size));
            self.status = SyncStatus::WaitSyncByte(0);
            Some(frame)
        } else {
            None
        }
    }
}

/// Polls `stream` until a complete frame of `expected_size` bytes has been
/// synchronized, or `deadline` passes.
pub fn await_frame<S>(stream: &mut S, expected_size: usize, deadline: &Deadline) -> Result<Vec<u8>>
where
    S: ByteStream + ?Sized,
{
    let mut sync = FrameSynchronizer::new(expected_size);
    while !deadline.expired() {
        let byte = match stream.read_byte()? {
            Some(byte) => byte,
            None => continue,
        };
        if let Some(frame) = sync.push(byte) {
            trace!(
                "Frame complete after {:?}: {:02X?}",
                deadline.elapsed(),
                frame
            );
            return Ok(frame);
        }
    }
    trace!(
        "Timed out waiting for frame ({} of {} bytes)",
        sync.position(),
        expected_size
    );
    Err(Error::OperationTimeout)
}

/// Waits up to `timeout` for a response header and decodes it.
pub fn await_header<S>(stream: &mut S, timeout: Duration) -> Result<ResponseHeader>
where
    S: ByteStream + ?Sized,
{
    let frame = await_frame(stream, LIDAR_ANS_HEADER_SIZE, &Deadline::after(timeout))?;
    let mut raw = [0; LIDAR_ANS_HEADER_SIZE];
    raw.copy_from_slice(&frame);
    let header = ResponseHeader::decode(&raw);
    trace!(
        "Response header: type={:02X} size={} sub_type={}",
        header.ans_type,
        header.size,
        header.sub_type
    );
    Ok(header)
}
