use crate::base::error::Result;
use crate::base::message::Message;
use crate::base::ring_byte_buffer::RingByteBuffer;
use crate::base::traits::ByteStream;
use crate::internals::DEFAULT_CHANNEL_READ_BUFFER_SIZE;
use crate::protocol::CommandEncoder;
use log::{error, trace};
use std::io;

/// Channel sends command packets and hands out received bytes one at a time
/// over a serial-port-like stream.
///
/// # Examples
/// ```ignore
/// let serial_port = serialport::new("/dev/ttyUSB0", 230400)
///     .timeout(Duration::from_millis(1))
///     .open()?;
/// let mut channel = Channel::new(serial_port);
///
/// channel.write(&Message::new(0x65)).unwrap();
/// ```
#[derive(Debug)]
pub struct Channel<T: ?Sized> {
    encoder: CommandEncoder,
    stream: Box<T>,
    read_buffer: RingByteBuffer,
}

impl<T: ?Sized> Channel<T>
where
    T: io::Read + io::Write,
{
    /// Create a new `Channel` over `stream`.
    ///
    /// The stream should return promptly from `read` when nothing is pending
    /// (a short read timeout or non-blocking mode), since every wait in the
    /// driver is a polling loop with its own deadline.
    pub fn new(stream: Box<T>) -> Channel<T> {
        Channel::with_read_buffer_size(stream, DEFAULT_CHANNEL_READ_BUFFER_SIZE)
    }

    /// Create a new `Channel` with non-default ring buffer capacity.
    pub fn with_read_buffer_size(stream: Box<T>, read_buffer_size: usize) -> Channel<T> {
        trace!("Creating new Channel with buffer size {}", read_buffer_size);
        Channel {
            encoder: CommandEncoder::new(),
            stream,
            read_buffer: RingByteBuffer::with_capacity(read_buffer_size),
        }
    }

    /// Drop every byte received but not yet consumed.
    pub fn reset(&mut self) {
        trace!(
            "Resetting Channel, discarding {} buffered bytes",
            self.read_buffer.len()
        );
        self.read_buffer.clear();
    }

    /// Encode `msg` and write it to the stream.
    pub fn write(&mut self, msg: &Message) -> Result<usize> {
        trace!(
            "Channel write called: cmd={:02X}, data_len={}",
            msg.cmd,
            msg.data.len()
        );
        let written = self.encoder.write_to(msg, &mut self.stream)?;
        self.stream.flush()?;
        Ok(written)
    }

    /// Give the stream back, dropping any buffered bytes.
    pub fn into_inner(self) -> Box<T> {
        self.stream
    }

    fn fill(&mut self) -> Result<usize> {
        match self.read_buffer.read_from(&mut self.stream) {
            Ok(read) => {
                if read > 0 {
                    trace!(
                        "Read {} bytes from stream (buffer len: {})",
                        read,
                        self.read_buffer.len()
                    );
                }
                Ok(read)
            }
            Err(e) => {
                error!("IO error reading from stream: {}", e);
                Err(e.into())
            }
        }
    }
}

impl<T: ?Sized> ByteStream for Channel<T>
where
    T: io::Read + io::Write,
{
    fn read_byte(&mut self) -> Result<Option<u8>> {
        if self.read_buffer.is_empty() {
            self.fill()?;
        }
        Ok(self.read_buffer.pop_byte())
    }

    fn bytes_available(&mut self) -> Result<usize> {
        if self.read_buffer.free_space() > 0 {
            self.fill()?;
        }
        Ok(self.read_buffer.len())
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<usize> {
        self.stream.write_all(bytes)?;
        self.stream.flush()?;
        Ok(bytes.len())
    }
}
